//! Pluggable [`MetricsLogger`] back-ends (spec §4.11): `SilentLogger`, `LastEntryLogger`,
//! `MemoryLogger`, `ConsoleLogger`, `InfoLogger`, `SkipWarmupLogger`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::data::time_series::TimeSeries;
use crate::model::timeframe::Timeframe;
use crate::model::timeline::Timeline;

/// Receives per-step metrics from a [`crate::statistic::journal::MetricsJournal`] and exposes a
/// read-back surface over what it retained (spec §4.11). Implementations must serialise writes
/// internally: the same logger is shared across concurrently-running runs (spec §5).
pub trait MetricsLogger: Send + Sync {
    fn start(&self, run: &str, timeframe: Timeframe);
    fn log(&self, metrics: &HashMap<String, f64>, time: DateTime<Utc>, run: &str);
    fn end(&self, run: &str);

    fn get_metric(&self, name: &str, run: Option<&str>) -> Option<TimeSeries>;
    fn get_metric_names(&self) -> Vec<String>;
    fn runs(&self) -> Vec<String>;
}

/// Counts events only; retains no metric values. Cheapest logger, useful when only liveness
/// matters.
#[derive(Debug, Default)]
pub struct SilentLogger {
    counts: Mutex<HashMap<String, u64>>,
}

impl SilentLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_count(&self, run: &str) -> u64 {
        self.counts.lock().get(run).copied().unwrap_or(0)
    }
}

impl MetricsLogger for SilentLogger {
    fn start(&self, run: &str, _timeframe: Timeframe) {
        self.counts.lock().entry(run.to_string()).or_insert(0);
    }

    fn log(&self, _metrics: &HashMap<String, f64>, _time: DateTime<Utc>, run: &str) {
        *self.counts.lock().entry(run.to_string()).or_insert(0) += 1;
    }

    fn end(&self, _run: &str) {}

    fn get_metric(&self, _name: &str, _run: Option<&str>) -> Option<TimeSeries> {
        None
    }

    fn get_metric_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn runs(&self) -> Vec<String> {
        self.counts.lock().keys().cloned().collect()
    }
}

type RunMetric = (String, String);

/// Retains only the latest value per `(run, metric)` pair.
#[derive(Debug, Default)]
pub struct LastEntryLogger {
    entries: Mutex<HashMap<RunMetric, (DateTime<Utc>, f64)>>,
}

impl LastEntryLogger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetricsLogger for LastEntryLogger {
    fn start(&self, _run: &str, _timeframe: Timeframe) {}

    fn log(&self, metrics: &HashMap<String, f64>, time: DateTime<Utc>, run: &str) {
        let mut entries = self.entries.lock();
        for (name, value) in metrics {
            entries.insert((run.to_string(), name.clone()), (time, *value));
        }
    }

    fn end(&self, _run: &str) {}

    fn get_metric(&self, name: &str, run: Option<&str>) -> Option<TimeSeries> {
        let run = run?;
        let (time, value) = *self.entries.lock().get(&(run.to_string(), name.to_string()))?;
        TimeSeries::new(Timeline::from_times([time]), vec![value]).ok()
    }

    fn get_metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.lock().keys().map(|(_, name)| name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    fn runs(&self) -> Vec<String> {
        let mut runs: Vec<String> = self.entries.lock().keys().map(|(run, _)| run.clone()).collect();
        runs.sort();
        runs.dedup();
        runs
    }
}

/// Retains the full time series for every `(run, metric)` pair, optionally bounded to the most
/// recent `max_history` points.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    max_history: Option<usize>,
    entries: Mutex<HashMap<RunMetric, Vec<(DateTime<Utc>, f64)>>>,
}

impl MemoryLogger {
    pub fn new(max_history: Option<usize>) -> Self {
        Self {
            max_history,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl MetricsLogger for MemoryLogger {
    fn start(&self, run: &str, _timeframe: Timeframe) {
        let _ = run;
    }

    fn log(&self, metrics: &HashMap<String, f64>, time: DateTime<Utc>, run: &str) {
        let mut entries = self.entries.lock();
        for (name, value) in metrics {
            let series = entries.entry((run.to_string(), name.clone())).or_default();
            series.push((time, *value));
            if let Some(max) = self.max_history {
                let excess = series.len().saturating_sub(max);
                series.drain(0..excess);
            }
        }
    }

    fn end(&self, _run: &str) {}

    fn get_metric(&self, name: &str, run: Option<&str>) -> Option<TimeSeries> {
        let run = run?;
        let series = self.entries.lock().get(&(run.to_string(), name.to_string()))?.clone();
        let (times, values): (Vec<_>, Vec<_>) = series.into_iter().unzip();
        TimeSeries::new(Timeline::from_times(times), values).ok()
    }

    fn get_metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.lock().keys().map(|(_, name)| name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    fn runs(&self) -> Vec<String> {
        let mut runs: Vec<String> = self.entries.lock().keys().map(|(run, _)| run.clone()).collect();
        runs.sort();
        runs.dedup();
        runs
    }
}

/// Streams formatted lines to stdout via `prettytable`, following the teacher's table-printer
/// convention in `statistic::summary`.
#[derive(Debug, Default)]
pub struct ConsoleLogger {
    inner: MemoryLogger,
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self { inner: MemoryLogger::new(None) }
    }
}

impl MetricsLogger for ConsoleLogger {
    fn start(&self, run: &str, timeframe: Timeframe) {
        println!("-- run {run} started ({timeframe:?}) --");
        self.inner.start(run, timeframe);
    }

    fn log(&self, metrics: &HashMap<String, f64>, time: DateTime<Utc>, run: &str) {
        let mut table = prettytable::Table::new();
        table.set_titles(prettytable::row!["run", "time", "metric", "value"]);
        let mut names: Vec<_> = metrics.keys().collect();
        names.sort();
        for name in names {
            table.add_row(prettytable::row![run, time, name, metrics[name]]);
        }
        table.printstd();
        self.inner.log(metrics, time, run);
    }

    fn end(&self, run: &str) {
        println!("-- run {run} finished --");
        self.inner.end(run);
    }

    fn get_metric(&self, name: &str, run: Option<&str>) -> Option<TimeSeries> {
        self.inner.get_metric(name, run)
    }

    fn get_metric_names(&self) -> Vec<String> {
        self.inner.get_metric_names()
    }

    fn runs(&self) -> Vec<String> {
        self.inner.runs()
    }
}

/// Forwards metrics to `tracing` at `info` level instead of stdout; retains nothing itself.
#[derive(Debug, Default)]
pub struct InfoLogger {
    event_counts: AtomicU64,
}

impl InfoLogger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetricsLogger for InfoLogger {
    fn start(&self, run: &str, timeframe: Timeframe) {
        tracing::info!(run, ?timeframe, "run started");
    }

    fn log(&self, metrics: &HashMap<String, f64>, time: DateTime<Utc>, run: &str) {
        self.event_counts.fetch_add(1, Ordering::Relaxed);
        tracing::info!(run, %time, ?metrics, "step metrics");
    }

    fn end(&self, run: &str) {
        tracing::info!(run, "run finished");
    }

    fn get_metric(&self, _name: &str, _run: Option<&str>) -> Option<TimeSeries> {
        None
    }

    fn get_metric_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn runs(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Decorates another logger, discarding the first `skip` steps of every run (eg/ indicator
/// warm-up before a strategy starts producing meaningful signals).
pub struct SkipWarmupLogger<L> {
    inner: L,
    skip: usize,
    seen: Mutex<HashMap<String, usize>>,
}

impl<L: MetricsLogger> SkipWarmupLogger<L> {
    pub fn new(inner: L, skip: usize) -> Self {
        Self {
            inner,
            skip,
            seen: Mutex::new(HashMap::new()),
        }
    }
}

impl<L: MetricsLogger> MetricsLogger for SkipWarmupLogger<L> {
    fn start(&self, run: &str, timeframe: Timeframe) {
        self.seen.lock().insert(run.to_string(), 0);
        self.inner.start(run, timeframe);
    }

    fn log(&self, metrics: &HashMap<String, f64>, time: DateTime<Utc>, run: &str) {
        let mut seen = self.seen.lock();
        let count = seen.entry(run.to_string()).or_insert(0);
        *count += 1;
        if *count > self.skip {
            drop(seen);
            self.inner.log(metrics, time, run);
        }
    }

    fn end(&self, run: &str) {
        self.inner.end(run);
    }

    fn get_metric(&self, name: &str, run: Option<&str>) -> Option<TimeSeries> {
        self.inner.get_metric(name, run)
    }

    fn get_metric_names(&self) -> Vec<String> {
        self.inner.get_metric_names()
    }

    fn runs(&self) -> Vec<String> {
        self.inner.runs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(value: f64) -> HashMap<String, f64> {
        let mut m = HashMap::new();
        m.insert("account.equity".to_string(), value);
        m
    }

    #[test]
    fn silent_logger_counts_without_retaining_values() {
        let logger = SilentLogger::new();
        logger.start("run", Timeframe::infinite(Utc::now()));
        logger.log(&metrics(1.0), Utc::now(), "run");
        logger.log(&metrics(2.0), Utc::now(), "run");
        assert_eq!(logger.event_count("run"), 2);
        assert!(logger.get_metric("account.equity", Some("run")).is_none());
    }

    #[test]
    fn last_entry_logger_retains_only_latest_value() {
        let logger = LastEntryLogger::new();
        logger.log(&metrics(1.0), Utc::now(), "run");
        logger.log(&metrics(2.0), Utc::now(), "run");
        let series = logger.get_metric("account.equity", Some("run")).unwrap();
        assert_eq!(series.values(), &[2.0]);
    }

    #[test]
    fn memory_logger_retains_full_series_and_can_be_bounded() {
        let logger = MemoryLogger::new(Some(2));
        for v in [1.0, 2.0, 3.0] {
            logger.log(&metrics(v), Utc::now(), "run");
        }
        let series = logger.get_metric("account.equity", Some("run")).unwrap();
        assert_eq!(series.values(), &[2.0, 3.0]);
    }

    #[test]
    fn skip_warmup_logger_drops_the_first_n_steps() {
        let inner = MemoryLogger::new(None);
        let logger = SkipWarmupLogger::new(inner, 2);
        logger.start("run", Timeframe::infinite(Utc::now()));
        for v in [1.0, 2.0, 3.0] {
            logger.log(&metrics(v), Utc::now(), "run");
        }
        let series = logger.get_metric("account.equity", Some("run")).unwrap();
        assert_eq!(series.values(), &[3.0]);
    }
}
