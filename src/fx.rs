//! Process-wide plug-in answering "what is 1 unit of currency A worth in currency B at time T?".
//!
//! The registry is read-mostly: rates are installed once (or infrequently) and read on every
//! [`crate::model::wallet::Wallet::convert`] call from potentially many concurrent runs, so reads
//! never block on other readers (see spec §5 and §9's "mutable global state" note).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;

use crate::model::currency::Currency;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    #[error("no FX rate registered for pair {from}/{to}")]
    MissingPair { from: Currency, to: Currency },
}

/// A source of currency-pair conversion rates at a point in time.
pub trait FxRates: Send + Sync {
    /// Returns the multiplier to convert 1 unit of `from` into `to` at `time`.
    fn rate(&self, from: &Currency, to: &Currency, time: DateTime<Utc>) -> Result<f64, FxError>;
}

/// A static, time-independent table of direct and inverse exchange rates. Sufficient for
/// backtests that do not need historically varying FX; live or historically-accurate runs should
/// supply a time-series-backed [`FxRates`] implementation instead.
#[derive(Debug, Default)]
pub struct StaticFxTable {
    rates: RwLock<HashMap<(Currency, Currency), f64>>,
}

impl StaticFxTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a direct rate `from -> to` and its inverse `to -> from`.
    pub fn set_rate(&self, from: Currency, to: Currency, rate: f64) {
        let mut rates = self.rates.write();
        rates.insert((from.clone(), to.clone()), rate);
        rates.insert((to, from), 1.0 / rate);
    }
}

impl FxRates for StaticFxTable {
    fn rate(&self, from: &Currency, to: &Currency, _time: DateTime<Utc>) -> Result<f64, FxError> {
        if from == to {
            return Ok(1.0);
        }
        self.rates
            .read()
            .get(&(from.clone(), to.clone()))
            .copied()
            .ok_or_else(|| FxError::MissingPair {
                from: from.clone(),
                to: to.clone(),
            })
    }
}

/// Converts an [`crate::model::amount::Amount`]-style `(currency, value)` pair between
/// currencies, delegating to a pluggable [`FxRates`] source.
#[derive(Clone)]
pub struct FxRegistry {
    rates: std::sync::Arc<dyn FxRates>,
}

impl FxRegistry {
    pub fn new(rates: std::sync::Arc<dyn FxRates>) -> Self {
        Self { rates }
    }

    pub fn convert(
        &self,
        value: f64,
        from: &Currency,
        to: &Currency,
        time: DateTime<Utc>,
    ) -> Result<f64, FxError> {
        self.rates.rate(from, to, time).map(|rate| value * rate)
    }
}

impl std::fmt::Debug for FxRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FxRegistry").finish_non_exhaustive()
    }
}
