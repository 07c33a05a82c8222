//! Time-ordered market data: the [`Feed`](feed::Feed) abstraction, the in-memory
//! [`HistoricPriceStore`](store::HistoricPriceStore), [`TimeSeries`](time_series::TimeSeries), and
//! the CSV historic feed adapter (spec §4.2, §4.12, §3 "TimeSeries", §6).

pub mod csv;
pub mod error;
pub mod feed;
pub mod store;
pub mod time_series;

pub use feed::{AssetFeed, Feed};
pub use store::HistoricPriceStore;
pub use time_series::TimeSeries;
