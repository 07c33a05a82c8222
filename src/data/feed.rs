//! Abstract event producer (spec §4.2 "Feed").

use async_trait::async_trait;

use crate::event::EventChannel;
use crate::model::asset::Asset;
use crate::model::timeframe::Timeframe;

/// A producer of time-ordered [`crate::event::Event`]s. `play` pushes events into `channel` in
/// non-decreasing time order and closes the channel on completion, whether that completion is
/// normal exhaustion or an early return. Implementations must be re-entrant across concurrent
/// `play` calls: any shared state must be read-only after construction (spec §4.2, §5).
#[async_trait]
pub trait Feed: Send + Sync {
    /// The span of time this feed can produce events for.
    fn timeframe(&self) -> Timeframe;

    /// Pushes events into `channel` in non-decreasing time order, then closes it.
    async fn play(&self, channel: &EventChannel);
}

/// A [`Feed`] that additionally knows, up front, the full set of assets it may emit.
#[async_trait]
pub trait AssetFeed: Feed {
    fn assets(&self) -> Vec<Asset>;
}
