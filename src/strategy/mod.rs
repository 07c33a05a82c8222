//! Signal generation: the [`Strategy`] contract, the [`Signal`] it emits, and the reference
//! strategies that implement it (spec §4.3).

/// Strategy module specific errors.
pub mod error;

pub mod combined;
pub mod ema_crossover;
pub mod historic;
pub mod random;
pub mod rsi;

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::model::asset::Asset;

/// Whether a [`Signal`] proposes opening/extending a position, closing/reducing one, or either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalType {
    Entry,
    Exit,
    Both,
}

/// An advisory recommendation emitted by a [`Strategy`], interpreted (sized, risk-capped, turned
/// into orders) by a signal converter (spec §4.3 "Signal"). `rating`'s sign indicates direction
/// (positive ⇒ long/buy bias, negative ⇒ short/sell bias); its magnitude is a converter-defined
/// conviction strength, not a share count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub asset: Asset,
    pub rating: f64,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
    pub probability: Option<f64>,
    pub source: Option<String>,
    pub signal_type: SignalType,
}

impl Signal {
    pub fn new(asset: Asset, rating: f64, signal_type: SignalType) -> Self {
        Self {
            asset,
            rating,
            take_profit: None,
            stop_loss: None,
            probability: None,
            source: None,
            signal_type,
        }
    }

    pub fn entry(asset: Asset, rating: f64) -> Self {
        Self::new(asset, rating, SignalType::Entry)
    }

    pub fn exit(asset: Asset, rating: f64) -> Self {
        Self::new(asset, rating, SignalType::Exit)
    }

    pub fn with_take_profit(mut self, take_profit: f64) -> Self {
        self.take_profit = Some(take_profit);
        self
    }

    pub fn with_stop_loss(mut self, stop_loss: f64) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Two signals conflict iff they target the same asset with opposite-signed, non-zero ratings
/// (spec §4.3).
pub fn conflicts(a: &Signal, b: &Signal) -> bool {
    a.asset == b.asset && a.rating != 0.0 && b.rating != 0.0 && a.rating.signum() != b.rating.signum()
}

/// Produces [`Signal`]s from market data. Implementations are stateful across the events of one
/// run (eg/ moving-average history) and must support [`Strategy::reset`] to clear that state for
/// reuse across runs (spec §4.3).
pub trait Strategy: Send + Sync {
    fn create_signals(&mut self, event: &Event) -> Vec<Signal>;

    /// Clears any state accumulated across prior `create_signals` calls.
    fn reset(&mut self);
}
