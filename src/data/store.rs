//! In-memory, sorted-by-time store of [`PriceItem`]s, the backing for CSV/Avro/QuestDB-style
//! adapters (spec §4.12).

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::feed::{AssetFeed, Feed};
use crate::event::{Event, EventChannel, PriceItem};
use crate::model::asset::Asset;
use crate::model::timeframe::Timeframe;
use crate::model::timeline::Timeline;

/// Maps `Instant → [PriceItem]`, kept sorted by time. Adapters (CSV, Avro, QuestDB) parse their
/// source and call [`HistoricPriceStore::add`]/[`HistoricPriceStore::add_all`]; `play` then serves
/// the store itself as a [`Feed`] (spec §4.12).
#[derive(Debug, Clone, Default)]
pub struct HistoricPriceStore {
    entries: BTreeMap<DateTime<Utc>, Vec<PriceItem>>,
}

impl HistoricPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, time: DateTime<Utc>, item: PriceItem) {
        self.entries.entry(time).or_default().push(item);
    }

    pub fn add_all(&mut self, time: DateTime<Utc>, items: impl IntoIterator<Item = PriceItem>) {
        self.entries.entry(time).or_default().extend(items);
    }

    /// Merges `other` into `self`, appending its items at each shared timestamp.
    pub fn merge(&mut self, other: HistoricPriceStore) {
        for (time, items) in other.entries {
            self.entries.entry(time).or_default().extend(items);
        }
    }

    pub fn first(&self) -> Option<(DateTime<Utc>, &[PriceItem])> {
        self.entries.iter().next().map(|(t, items)| (*t, items.as_slice()))
    }

    pub fn last(&self) -> Option<(DateTime<Utc>, &[PriceItem])> {
        self.entries.iter().next_back().map(|(t, items)| (*t, items.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn timeline(&self) -> Timeline {
        Timeline::from_times(self.entries.keys().copied())
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeline()
            .timeframe()
            .unwrap_or_else(|| Timeframe::new(Utc::now(), Utc::now()))
    }

    pub fn assets(&self) -> Vec<Asset> {
        let mut assets: Vec<Asset> = self
            .entries
            .values()
            .flat_map(|items| items.iter().map(|item| item.asset().clone()))
            .collect();
        assets.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        assets.dedup();
        assets
    }

    /// Replays the timeframe intersection of `self` and `timeframe` onto `channel` in
    /// non-decreasing time order.
    pub async fn play_timeframe(&self, channel: &EventChannel, timeframe: Timeframe) {
        for (&time, items) in &self.entries {
            if !timeframe.contains(time) {
                continue;
            }
            channel.send(Event::new(time, items.clone())).await;
        }
        channel.close();
    }
}

#[async_trait]
impl Feed for HistoricPriceStore {
    fn timeframe(&self) -> Timeframe {
        HistoricPriceStore::timeframe(self)
    }

    async fn play(&self, channel: &EventChannel) {
        self.play_timeframe(channel, channel.timeframe()).await;
    }
}

#[async_trait]
impl AssetFeed for HistoricPriceStore {
    fn assets(&self) -> Vec<Asset> {
        HistoricPriceStore::assets(self)
    }
}
