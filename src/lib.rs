//! # roboquant
//!
//! A deterministic, event-driven backtesting and live-trading core. It consumes a time-ordered
//! market-data [`Feed`](data::feed::Feed), dispatches each [`Event`](event::Event) through a
//! [`Strategy`](strategy::Strategy), converts the resulting [`Signal`](strategy::Signal)s into
//! [`Instruction`](order::Instruction)s via a [`SignalConverter`](convert::SignalConverter),
//! simulates broker execution with a [`SimBroker`](execution::broker::SimBroker), and records
//! per-step metrics through a [`Journal`](statistic::Journal).
//!
//! The crate is organised the way its component table splits responsibility:
//! * **Data**: [`data`] — [`Feed`](data::feed::Feed), [`HistoricPriceStore`](data::HistoricPriceStore),
//!   [`TimeSeries`](data::TimeSeries), the CSV historic adapter.
//! * **Strategy**: [`strategy`] — the [`Strategy`](strategy::Strategy) trait and reference
//!   strategies (random, RSI, EMA crossover, combined, historic replay).
//! * **Convert**: [`convert`] — the [`SignalConverter`](convert::SignalConverter) trait, `Flex`
//!   and `Atr` converters, the circuit-breaker decorator.
//! * **Account**: [`account`] — the mutable `InternalAccount`, the immutable
//!   [`Account`](account::Account) snapshot, and pluggable account (buying-power) models.
//! * **Execution**: [`execution`] — [`SimBroker`](execution::broker::SimBroker), order executors,
//!   pricing engines and fee models.
//! * **Statistic**: [`statistic`] — [`Journal`](statistic::Journal) and the
//!   [`MetricsLogger`](statistic::MetricsLogger) implementations.
//! * **Engine**: [`engine`] — the [`run`](engine::run) / [`run_async`](engine::run_async) run loop.
//!
//! ## Getting started
//!
//! ```
//! use std::sync::Arc;
//!
//! use chrono::{Duration, Utc};
//! use roboquant::account::model::CashAccount;
//! use roboquant::convert::flex::FlexConverter;
//! use roboquant::data::store::HistoricPriceStore;
//! use roboquant::engine;
//! use roboquant::event::{PriceBarData, PriceItem};
//! use roboquant::execution::broker::SimBroker;
//! use roboquant::execution::fees::NoFee;
//! use roboquant::execution::pricing::NoCostPricing;
//! use roboquant::fx::{FxRegistry, StaticFxTable};
//! use roboquant::model::asset::Asset;
//! use roboquant::model::currency::Currency;
//! use roboquant::model::wallet::Wallet;
//! use roboquant::statistic::{MemoryLogger, MetricsJournal};
//! use roboquant::strategy::random::RandomStrategy;
//!
//! let now = Utc::now();
//! let asset = Asset::stock("AAPL");
//!
//! let mut feed = HistoricPriceStore::new();
//! for step in 0..3 {
//!     let time = now + Duration::minutes(step);
//!     feed.add(
//!         time,
//!         PriceItem::PriceBar {
//!             asset: asset.clone(),
//!             bar: PriceBarData {
//!                 open: 100.0,
//!                 high: 101.0,
//!                 low: 99.0,
//!                 close: 100.0 + step as f64,
//!                 volume: 1_000.0,
//!                 span: Duration::minutes(1),
//!             },
//!         },
//!     );
//! }
//!
//! let fx = FxRegistry::new(Arc::new(StaticFxTable::new()));
//! let broker = SimBroker::new(
//!     Currency::usd(),
//!     Wallet::single(Currency::usd(), 100_000.0),
//!     Arc::new(CashAccount::new(fx.clone())),
//!     Arc::new(NoCostPricing),
//!     Arc::new(NoFee),
//!     fx.clone(),
//!     now,
//! );
//! let logger = Arc::new(MemoryLogger::new(None));
//! let journal = Box::new(MetricsJournal::new("demo", fx.clone(), logger));
//!
//! let account = engine::run(
//!     Arc::new(feed),
//!     Box::new(RandomStrategy::new(0.5, 7).unwrap()),
//!     Box::new(FlexConverter::new(fx).unwrap()),
//!     broker,
//!     journal,
//!     None,
//!     Some("demo".to_string()),
//! );
//!
//! assert_eq!(account.base_currency, Currency::usd());
//! ```

#![warn(missing_copy_implementations)]

#[macro_use]
extern crate prettytable;

/// Process-wide run configuration: base currency, default FX rates, default event-channel
/// capacity, default timeframe (spec §4.0).
pub mod config;

/// Domain value types shared across every other module: [`model::asset::Asset`],
/// [`model::currency::Currency`], [`model::amount::Amount`], [`model::wallet::Wallet`],
/// [`model::size::Size`], [`model::timeframe::Timeframe`], [`model::timeline::Timeline`]
/// (spec §3).
pub mod model;

/// Time-ordered market data: the [`Feed`](data::feed::Feed) abstraction, the in-memory
/// [`data::HistoricPriceStore`], [`data::TimeSeries`], and the CSV historic feed adapter
/// (spec §4.2, §4.12, §3 "TimeSeries", §6).
pub mod data;

/// Time-ordered [`event::Event`]s and the back-pressured [`event::EventChannel`] that carries
/// them from a feed producer to the run loop (spec §4.1).
pub mod event;

/// Process-wide currency conversion: the [`fx::FxRates`] plug-in and [`fx::FxRegistry`] facade
/// (spec §4.5's FX dependency, §5, §9).
pub mod fx;

/// [`order::Instruction`]s submitted to a broker and the lifecycle of the [`order::Order`]s they
/// create (spec §3 "Order", §4.6).
pub mod order;

/// Mutable broker-owned portfolio state, the immutable [`account::Account`] snapshot, and
/// pluggable buying-power rules (spec §3 "Account", §4.5, §4.8).
pub mod account;

/// Signal generation: the [`strategy::Strategy`] contract, [`strategy::Signal`], and reference
/// strategies (spec §4.3).
pub mod strategy;

/// Turns advisory [`strategy::Signal`]s into concrete [`order::Instruction`]s: sizing, risk caps,
/// and the reference converters (spec §4.4).
pub mod convert;

/// Turns placed [`order::Instruction`]s into tracked orders and fills: the simulated broker,
/// order executors, pricing engines and fee models (spec §4.6, §4.7, §4.9).
pub mod execution;

/// Per-step [`statistic::Journal`] and pluggable [`statistic::MetricsLogger`] back-ends
/// (spec §4.11).
pub mod statistic;

/// The run loop: wires a feed through a strategy, converter, broker and journal to produce a
/// final account snapshot (spec §4.10, §6).
pub mod engine;

/// Crate-level error composing every module's error type (spec §7, SPEC_FULL.md §4.14).
pub mod error;

/// Common imports for host applications wiring up a run.
pub mod prelude {
    pub use crate::account::Account;
    pub use crate::config::Config;
    pub use crate::convert::SignalConverter;
    pub use crate::data::feed::{AssetFeed, Feed};
    pub use crate::data::store::HistoricPriceStore;
    pub use crate::data::time_series::TimeSeries;
    pub use crate::engine::{run, run_async};
    pub use crate::error::RoboquantError;
    pub use crate::event::{Event, EventChannel, PriceItem, PriceKind};
    pub use crate::execution::broker::SimBroker;
    pub use crate::fx::FxRegistry;
    pub use crate::model::asset::Asset;
    pub use crate::model::currency::Currency;
    pub use crate::order::Instruction;
    pub use crate::statistic::{Journal, MetricsLogger};
    pub use crate::strategy::{Signal, Strategy};
}
