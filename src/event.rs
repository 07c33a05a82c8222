//! Time-ordered market events and the bounded, back-pressured channel that carries them from a
//! [`crate::data::feed::Feed`] producer to the run loop consumer (spec §4.1/§4.2).

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex as SyncMutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::time::timeout;

use crate::model::asset::Asset;
use crate::model::timeframe::Timeframe;

/// Selects which derived price a [`PriceItem`] should yield via [`PriceItem::get_price`]. An
/// item that has no meaningful value for a requested `kind` falls back to its own notion of
/// "default" rather than returning nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceKind {
    Default,
    Open,
    High,
    Low,
    Close,
    Typical,
    Mean,
    Ask,
    Bid,
    Weighted,
}

/// A single OHLCV bar spanning `span` up to (and including) the event time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBarData {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// NaN when the source doesn't report volume.
    pub volume: f64,
    pub span: Duration,
}

/// A market data observation for one [`Asset`]. Each variant can answer "what is the price" for
/// any [`PriceKind`], falling back to its own default when the kind doesn't apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PriceItem {
    PriceBar {
        asset: Asset,
        bar: PriceBarData,
    },
    TradePrice {
        asset: Asset,
        price: f64,
        volume: f64,
    },
    PriceQuote {
        asset: Asset,
        ask: f64,
        ask_size: f64,
        bid: f64,
        bid_size: f64,
    },
    OrderBook {
        asset: Asset,
        asks: Vec<(f64, f64)>,
        bids: Vec<(f64, f64)>,
    },
}

impl PriceItem {
    pub fn asset(&self) -> &Asset {
        match self {
            PriceItem::PriceBar { asset, .. } => asset,
            PriceItem::TradePrice { asset, .. } => asset,
            PriceItem::PriceQuote { asset, .. } => asset,
            PriceItem::OrderBook { asset, .. } => asset,
        }
    }

    /// Returns the requested derived price, falling back to the variant's default for kinds it
    /// has no notion of.
    pub fn get_price(&self, kind: PriceKind) -> f64 {
        match self {
            PriceItem::PriceBar { bar, .. } => match kind {
                PriceKind::Open => bar.open,
                PriceKind::High => bar.high,
                PriceKind::Low => bar.low,
                PriceKind::Typical => (bar.high + bar.low + bar.close) / 3.0,
                PriceKind::Mean => (bar.high + bar.low) / 2.0,
                PriceKind::Weighted => (bar.open + bar.high + bar.low + bar.close) / 4.0,
                PriceKind::Default | PriceKind::Close | PriceKind::Ask | PriceKind::Bid => {
                    bar.close
                }
            },
            PriceItem::TradePrice { price, .. } => *price,
            PriceItem::PriceQuote { ask, bid, .. } => match kind {
                PriceKind::Ask => *ask,
                PriceKind::Bid => *bid,
                _ => (ask + bid) / 2.0,
            },
            PriceItem::OrderBook { asks, bids, .. } => {
                let best_ask = asks.first().map(|(px, _)| *px);
                let best_bid = bids.first().map(|(px, _)| *px);
                match kind {
                    PriceKind::Ask => best_ask.unwrap_or(f64::NAN),
                    PriceKind::Bid => best_bid.unwrap_or(f64::NAN),
                    PriceKind::Weighted => match (asks.first(), bids.first()) {
                        (Some((ap, asz)), Some((bp, bsz))) if asz + bsz > 0.0 => {
                            (ap * bsz + bp * asz) / (asz + bsz)
                        }
                        _ => f64::NAN,
                    },
                    _ => match (best_ask, best_bid) {
                        (Some(a), Some(b)) => (a + b) / 2.0,
                        (Some(a), None) => a,
                        (None, Some(b)) => b,
                        (None, None) => f64::NAN,
                    },
                }
            }
        }
    }
}

/// Market data observed at a single instant, carrying one [`PriceItem`] per asset that updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub time: DateTime<Utc>,
    pub items: Vec<PriceItem>,
}

impl Event {
    pub fn new(time: DateTime<Utc>, items: Vec<PriceItem>) -> Self {
        Self { time, items }
    }

    /// A view mapping each asset present in this event to its most recent [`PriceItem`].
    pub fn prices(&self) -> HashMap<&Asset, &PriceItem> {
        let mut map = HashMap::new();
        for item in &self.items {
            map.insert(item.asset(), item);
        }
        map
    }

    pub fn price_of(&self, asset: &Asset, kind: PriceKind) -> Option<f64> {
        self.items
            .iter()
            .find(|item| item.asset() == asset)
            .map(|item| item.get_price(kind))
    }
}

/// A bounded, time-filtered FIFO queue of [`Event`]s connecting a feed producer to a run-loop
/// consumer (spec §4.1). `send` silently drops events outside the channel's [`Timeframe`] rather
/// than treating them as an error; `close` is idempotent and buffered events still drain after
/// close.
pub struct EventChannel {
    sender: SyncMutex<Option<mpsc::Sender<Event>>>,
    receiver: AsyncMutex<mpsc::Receiver<Event>>,
    timeframe: Timeframe,
}

impl EventChannel {
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new(capacity: usize, timeframe: Timeframe) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender: SyncMutex::new(Some(sender)),
            receiver: AsyncMutex::new(receiver),
            timeframe,
        }
    }

    pub fn with_default_capacity(timeframe: Timeframe) -> Self {
        Self::new(Self::DEFAULT_CAPACITY, timeframe)
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Sends `event`, suspending when the channel is full. Events outside the channel's
    /// timeframe are dropped silently: they are uninteresting to consumers, not an error.
    pub async fn send(&self, event: Event) {
        if !self.timeframe.contains(event.time) {
            return;
        }
        let sender = self.sender.lock().clone();
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }

    /// Awaits the next event, or `None` once the channel is closed and drained.
    pub async fn receive(&self) -> Option<Event> {
        self.receiver.lock().await.recv().await
    }

    /// Awaits the next event with a timeout, used by live consumers to synthesize heartbeats
    /// (spec §4.1: "the channel itself does not synthesize them").
    pub async fn receive_timeout(&self, duration: StdDuration) -> ReceiveOutcome {
        match timeout(duration, self.receive()).await {
            Ok(Some(event)) => ReceiveOutcome::Event(event),
            Ok(None) => ReceiveOutcome::Closed,
            Err(_) => ReceiveOutcome::Heartbeat,
        }
    }

    /// Idempotently stops accepting new events. Already-buffered events still drain via
    /// subsequent [`EventChannel::receive`] calls.
    pub fn close(&self) {
        self.sender.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

/// Outcome of a [`EventChannel::receive_timeout`] call.
#[derive(Debug)]
pub enum ReceiveOutcome {
    Event(Event),
    Heartbeat,
    Closed,
}
