//! Process-wide run configuration (SPEC_FULL.md §4.0): base currency, default FX rate table,
//! default event-channel capacity, and default [`Timeframe`]. No global mutable singleton —
//! callers hold their own [`Config`] and thread it through, so concurrent runs never race
//! (spec §5, §9 "mutable global state").

use std::env;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::event::EventChannel;
use crate::fx::{FxRates, FxRegistry, StaticFxTable};
use crate::model::currency::Currency;
use crate::model::timeframe::Timeframe;

/// All errors generated in the `config` module.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to build struct due to incomplete attributes provided")]
    BuilderIncomplete,

    #[error("invalid value for {name}: {value}")]
    InvalidEnvVar { name: &'static str, value: String },
}

/// Process-wide configuration, constructed once and passed by `&Arc<Config>` into runs.
#[derive(Clone)]
pub struct Config {
    pub base_currency: Currency,
    pub fx: FxRegistry,
    pub event_channel_capacity: usize,
    pub default_timeframe: Timeframe,
}

impl Config {
    /// USD base currency, an empty FX table, [`EventChannel::DEFAULT_CAPACITY`], and a
    /// timeframe spanning all time from now.
    pub fn init() -> Self {
        Self {
            base_currency: Currency::usd(),
            fx: FxRegistry::new(Arc::new(StaticFxTable::new())),
            event_channel_capacity: EventChannel::DEFAULT_CAPACITY,
            default_timeframe: Timeframe::infinite(Utc::now()),
        }
    }

    /// Overlays `ROBOQUANT_BASE_CURRENCY` / `ROBOQUANT_EVENT_CHANNEL_CAPACITY` from the process
    /// environment onto [`Config::init`]'s defaults, following the teacher's plain
    /// `std::env::var`-parsing style rather than an `envy`/`config`-crate dependency.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::init();

        if let Ok(code) = env::var("ROBOQUANT_BASE_CURRENCY") {
            config.base_currency = Currency::new(code);
        }

        if let Ok(raw) = env::var("ROBOQUANT_EVENT_CHANNEL_CAPACITY") {
            config.event_channel_capacity = raw.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: "ROBOQUANT_EVENT_CHANNEL_CAPACITY",
                value: raw,
            })?;
        }

        Ok(config)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Consuming builder for [`Config`]; `base_currency` is the one field a caller must set
/// deliberately, everything else falls back to [`Config::init`]'s defaults.
#[derive(Default)]
pub struct ConfigBuilder {
    base_currency: Option<Currency>,
    fx: Option<FxRegistry>,
    event_channel_capacity: Option<usize>,
    default_timeframe: Option<Timeframe>,
}

impl ConfigBuilder {
    pub fn base_currency(mut self, base_currency: Currency) -> Self {
        self.base_currency = Some(base_currency);
        self
    }

    pub fn fx_rates(mut self, rates: Arc<dyn FxRates>) -> Self {
        self.fx = Some(FxRegistry::new(rates));
        self
    }

    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = Some(capacity);
        self
    }

    pub fn default_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.default_timeframe = Some(timeframe);
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let defaults = Config::init();
        Ok(Config {
            base_currency: self.base_currency.ok_or(ConfigError::BuilderIncomplete)?,
            fx: self.fx.unwrap_or(defaults.fx),
            event_channel_capacity: self.event_channel_capacity.unwrap_or(defaults.event_channel_capacity),
            default_timeframe: self.default_timeframe.unwrap_or(defaults.default_timeframe),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_defaults_to_usd_and_default_channel_capacity() {
        let config = Config::init();
        assert_eq!(config.base_currency, Currency::usd());
        assert_eq!(config.event_channel_capacity, EventChannel::DEFAULT_CAPACITY);
    }

    #[test]
    fn builder_requires_base_currency() {
        assert!(matches!(Config::builder().build(), Err(ConfigError::BuilderIncomplete)));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::builder()
            .base_currency(Currency::new("EUR"))
            .event_channel_capacity(50)
            .build()
            .unwrap();
        assert_eq!(config.base_currency, Currency::new("EUR"));
        assert_eq!(config.event_channel_capacity, 50);
    }

    #[test]
    fn from_env_overlays_recognised_variables() {
        env::set_var("ROBOQUANT_BASE_CURRENCY", "JPY");
        env::set_var("ROBOQUANT_EVENT_CHANNEL_CAPACITY", "250");
        let config = Config::from_env().unwrap();
        assert_eq!(config.base_currency, Currency::new("JPY"));
        assert_eq!(config.event_channel_capacity, 250);
        env::remove_var("ROBOQUANT_BASE_CURRENCY");
        env::remove_var("ROBOQUANT_EVENT_CHANNEL_CAPACITY");
    }
}
