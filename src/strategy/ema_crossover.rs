//! EMA crossover reference strategy (spec §4.3).

use std::collections::HashMap;

use crate::event::{Event, PriceKind};
use crate::model::asset::Asset;
use crate::strategy::{Signal, Strategy};

#[derive(Debug, Clone, Copy)]
struct EmaState {
    fast: f64,
    slow: f64,
    observations: usize,
    fast_above_slow: Option<bool>,
}

/// Maintains a fast/slow exponential moving average pair per asset. Both are seeded with the
/// first observed price; after `slow_period` observations have warmed up the slow average, the
/// strategy emits a BUY the first time `fast` crosses above `slow`, and a SELL the first time it
/// crosses back below.
#[derive(Debug)]
pub struct EmaCrossover {
    fast_period: usize,
    slow_period: usize,
    /// Smoothing numerator; the new-price weight is `alpha / (period + 1)`. `2.0` is the
    /// conventional EMA smoothing factor.
    alpha: f64,
    price_kind: PriceKind,
    state: HashMap<Asset, EmaState>,
}

impl EmaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            alpha: 2.0,
            price_kind: PriceKind::Default,
            state: HashMap::new(),
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_price_kind(mut self, kind: PriceKind) -> Self {
        self.price_kind = kind;
        self
    }

    fn weight(&self, period: usize) -> f64 {
        self.alpha / (period as f64 + 1.0)
    }
}

impl Strategy for EmaCrossover {
    fn create_signals(&mut self, event: &Event) -> Vec<Signal> {
        let mut signals = Vec::new();
        let fast_weight = self.weight(self.fast_period);
        let slow_weight = self.weight(self.slow_period);

        for item in &event.items {
            let asset = item.asset();
            let price = item.get_price(self.price_kind);
            let entry = self.state.entry(asset.clone()).or_insert(EmaState {
                fast: price,
                slow: price,
                observations: 0,
                fast_above_slow: None,
            });

            if entry.observations == 0 {
                entry.fast = price;
                entry.slow = price;
            } else {
                entry.fast = price * fast_weight + entry.fast * (1.0 - fast_weight);
                entry.slow = price * slow_weight + entry.slow * (1.0 - slow_weight);
            }
            entry.observations += 1;

            if entry.observations >= self.slow_period {
                let above = entry.fast > entry.slow;
                match entry.fast_above_slow {
                    None => entry.fast_above_slow = Some(above),
                    Some(previous) if previous != above => {
                        entry.fast_above_slow = Some(above);
                        let rating = if above { 1.0 } else { -1.0 };
                        signals.push(
                            Signal::entry(asset.clone(), rating).with_source("ema_crossover"),
                        );
                    }
                    _ => {}
                }
            }
        }

        signals
    }

    fn reset(&mut self) {
        self.state.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{PriceBarData, PriceItem};
    use chrono::{Duration, Utc};

    fn asset() -> Asset {
        Asset::stock("TEST")
    }

    fn bar(price: f64) -> PriceItem {
        PriceItem::PriceBar {
            asset: asset(),
            bar: PriceBarData {
                open: price,
                high: price,
                low: price,
                close: price,
                volume: f64::NAN,
                span: Duration::minutes(1),
            },
        }
    }

    fn feed(strategy: &mut EmaCrossover, prices: &[f64]) -> Vec<Signal> {
        let mut all = Vec::new();
        for &price in prices {
            let event = Event::new(Utc::now(), vec![bar(price)]);
            all.extend(strategy.create_signals(&event));
        }
        all
    }

    #[test]
    fn emits_buy_on_first_upward_cross_after_warmup() {
        let mut strategy = EmaCrossover::new(2, 4);
        // flat then a sharp rise should pull fast above slow.
        let signals = feed(&mut strategy, &[100.0, 100.0, 100.0, 100.0, 130.0, 140.0]);
        assert!(signals.iter().any(|s| s.rating > 0.0));
    }

    #[test]
    fn no_signal_before_slow_warmup_completes() {
        let mut strategy = EmaCrossover::new(2, 10);
        let signals = feed(&mut strategy, &[100.0, 120.0, 80.0]);
        assert!(signals.is_empty());
    }

    #[test]
    fn reset_clears_state() {
        let mut strategy = EmaCrossover::new(2, 4);
        feed(&mut strategy, &[100.0, 100.0, 100.0, 100.0, 130.0]);
        assert!(!strategy.state.is_empty());
        strategy.reset();
        assert!(strategy.state.is_empty());
    }
}
