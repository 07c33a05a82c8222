//! Wilder's RSI reference strategy (spec §4.3).

use std::collections::HashMap;

use crate::event::{Event, PriceKind};
use crate::model::asset::Asset;
use crate::strategy::error::StrategyError;
use crate::strategy::{Signal, Strategy};

#[derive(Debug, Clone, Copy, Default)]
struct RsiState {
    prev_price: Option<f64>,
    count: usize,
    sum_gain: f64,
    sum_loss: f64,
    avg_gain: f64,
    avg_loss: f64,
}

/// Wilder's RSI over `period` observations. Emits a SELL when RSI rises above `high_threshold`,
/// a BUY when it falls below `low_threshold` (spec §4.3). Construction validates
/// `0 < low_threshold < high_threshold < 100`.
#[derive(Debug)]
pub struct RsiStrategy {
    period: usize,
    low_threshold: f64,
    high_threshold: f64,
    price_kind: PriceKind,
    state: HashMap<Asset, RsiState>,
}

impl RsiStrategy {
    pub const DEFAULT_LOW_THRESHOLD: f64 = 30.0;
    pub const DEFAULT_HIGH_THRESHOLD: f64 = 70.0;

    pub fn new(period: usize) -> Result<Self, StrategyError> {
        Self::with_thresholds(period, Self::DEFAULT_LOW_THRESHOLD, Self::DEFAULT_HIGH_THRESHOLD)
    }

    pub fn with_thresholds(period: usize, low_threshold: f64, high_threshold: f64) -> Result<Self, StrategyError> {
        if !(0.0 < low_threshold && low_threshold < high_threshold && high_threshold < 100.0) {
            return Err(StrategyError::InvalidRsiThresholds(low_threshold, high_threshold));
        }
        Ok(Self {
            period,
            low_threshold,
            high_threshold,
            price_kind: PriceKind::Default,
            state: HashMap::new(),
        })
    }

    pub fn with_price_kind(mut self, kind: PriceKind) -> Self {
        self.price_kind = kind;
        self
    }
}

impl Strategy for RsiStrategy {
    fn create_signals(&mut self, event: &Event) -> Vec<Signal> {
        let mut signals = Vec::new();
        let period = self.period as f64;

        for item in &event.items {
            let asset = item.asset();
            let price = item.get_price(self.price_kind);
            let state = self.state.entry(asset.clone()).or_default();

            let Some(prev) = state.prev_price else {
                state.prev_price = Some(price);
                continue;
            };
            state.prev_price = Some(price);

            let change = price - prev;
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);
            state.count += 1;

            if state.count <= self.period {
                state.sum_gain += gain;
                state.sum_loss += loss;
                if state.count == self.period {
                    state.avg_gain = state.sum_gain / period;
                    state.avg_loss = state.sum_loss / period;
                }
            } else {
                state.avg_gain = (state.avg_gain * (period - 1.0) + gain) / period;
                state.avg_loss = (state.avg_loss * (period - 1.0) + loss) / period;
            }

            if state.count >= self.period {
                let rsi = if state.avg_loss == 0.0 {
                    100.0
                } else {
                    let rs = state.avg_gain / state.avg_loss;
                    100.0 - 100.0 / (1.0 + rs)
                };

                if rsi >= self.high_threshold {
                    signals.push(Signal::entry(asset.clone(), -1.0).with_source("rsi"));
                } else if rsi <= self.low_threshold {
                    signals.push(Signal::entry(asset.clone(), 1.0).with_source("rsi"));
                }
            }
        }

        signals
    }

    fn reset(&mut self) {
        self.state.clear();
    }
}
