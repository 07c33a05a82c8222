//! The run loop: wires a [`Feed`](crate::data::feed::Feed) through a
//! [`Strategy`](crate::strategy::Strategy), [`SignalConverter`](crate::convert::SignalConverter),
//! [`SimBroker`](crate::execution::broker::SimBroker), and [`Journal`](crate::statistic::Journal)
//! to produce a final [`Account`] snapshot (spec §4.10, §6).

pub mod error;

use std::sync::Arc;

use crate::account::Account;
use crate::convert::SignalConverter;
use crate::data::feed::Feed;
use crate::event::EventChannel;
use crate::execution::broker::SimBroker;
use crate::model::timeframe::Timeframe;
use crate::statistic::Journal;
use crate::strategy::Strategy;

/// Runs `feed` through `strategy`/`converter`/`broker`/`journal` to completion and returns the
/// final [`Account`] snapshot. Blocks the calling thread; see [`run_async`] for the suspendable
/// form used when multiple runs share an executor (spec §4.10, §6).
pub fn run(
    feed: Arc<dyn Feed>,
    strategy: Box<dyn Strategy>,
    converter: Box<dyn SignalConverter>,
    broker: SimBroker,
    journal: Box<dyn Journal>,
    timeframe: Option<Timeframe>,
    name: Option<String>,
) -> Account {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("failed to start the run-loop's single-threaded executor");
    rt.block_on(run_async(feed, strategy, converter, broker, journal, timeframe, name))
}

/// Suspendable form of [`run`]. The loop itself is single-threaded per run; parallelism comes
/// from awaiting several `run_async` futures concurrently (spec §4.10 "Concurrency").
pub async fn run_async(
    feed: Arc<dyn Feed>,
    mut strategy: Box<dyn Strategy>,
    mut converter: Box<dyn SignalConverter>,
    mut broker: SimBroker,
    mut journal: Box<dyn Journal>,
    timeframe: Option<Timeframe>,
    name: Option<String>,
) -> Account {
    let name = name.unwrap_or_else(|| "run".to_string());
    let timeframe = timeframe.unwrap_or_else(|| feed.timeframe());
    let channel = Arc::new(EventChannel::with_default_capacity(timeframe));

    let producer = tokio::spawn({
        let feed = feed.clone();
        let channel = channel.clone();
        async move {
            feed.play(&channel).await;
            channel.close();
        }
    });

    tracing::info!(run = %name, ?timeframe, "run started");
    let mut account = broker.account();

    while let Some(event) = channel.receive().await {
        account = broker.sync(&event);
        let signals = strategy.create_signals(&event);
        let instructions = converter.convert(signals, &account, &event);
        broker.place(instructions.clone());
        journal.track(&event, &account, &instructions);
    }

    // The producer only returns after closing the channel, which is the condition the loop above
    // just exited on; this join is a formality, not a suspension point.
    let _ = producer.await;
    journal.finish();
    tracing::info!(run = %name, "run finished");
    account
}
