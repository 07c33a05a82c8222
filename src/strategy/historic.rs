//! Per-asset sliding price window helper for strategies that need recent history rather than a
//! single running statistic (spec §4.3 "Historic-price helper").

use std::collections::{HashMap, VecDeque};

use crate::event::{Event, PriceKind};
use crate::model::asset::Asset;
use crate::strategy::{Signal, Strategy};

/// A fixed-capacity FIFO window of the last `capacity` observations for one asset.
#[derive(Debug, Clone)]
pub struct PriceWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl PriceWindow {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn as_slice(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

/// Implemented by strategies that react to a sliding window of recent prices rather than a
/// single running indicator value. Wrapped by [`HistoricPriceStrategy`] to turn window updates
/// into a [`Strategy`].
pub trait WindowStrategy: Send + Sync {
    fn window_size(&self) -> usize;

    fn price_kind(&self) -> PriceKind {
        PriceKind::Default
    }

    /// Called once per asset each time its window updates; `window` is oldest-to-newest and only
    /// ever called once it is full.
    fn on_window(&mut self, asset: &Asset, window: &[f64]) -> Vec<Signal>;
}

/// Adapts a [`WindowStrategy`] into a [`Strategy`] by maintaining one [`PriceWindow`] per asset
/// and invoking the hook whenever a window fills (spec §4.3 "Historic-price helper").
#[derive(Debug)]
pub struct HistoricPriceStrategy<S> {
    inner: S,
    windows: HashMap<Asset, PriceWindow>,
}

impl<S: WindowStrategy> HistoricPriceStrategy<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            windows: HashMap::new(),
        }
    }
}

impl<S: WindowStrategy> Strategy for HistoricPriceStrategy<S> {
    fn create_signals(&mut self, event: &Event) -> Vec<Signal> {
        let mut signals = Vec::new();
        let capacity = self.inner.window_size();
        let kind = self.inner.price_kind();

        for item in &event.items {
            let asset = item.asset();
            let price = item.get_price(kind);
            let window = self
                .windows
                .entry(asset.clone())
                .or_insert_with(|| PriceWindow::new(capacity));
            window.push(price);

            if window.is_full() {
                signals.extend(self.inner.on_window(asset, &window.as_slice()));
            }
        }

        signals
    }

    fn reset(&mut self) {
        self.windows.clear();
    }
}
