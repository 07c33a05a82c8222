//! Composes multiple strategies into one, either evaluated in sequence or concurrently, with a
//! configurable rule for resolving conflicting signals (spec §4.3 "Combined / Parallel").

use std::sync::Arc;

use crate::event::Event;
use crate::strategy::{conflicts, Signal, Strategy};

/// How to reconcile signals that [`conflicts`] flags across substrategies.
pub enum ConflictResolver {
    /// Keep every signal, conflicts included.
    None,
    /// Of any conflicting pair, keep the one emitted by the earlier substrategy.
    First,
    /// Of any conflicting pair, keep the one emitted by the later substrategy.
    Last,
    /// Drop every signal that conflicts with any other, keeping only unanimous ones.
    NoConflicts,
    /// Collapse same-asset-same-sign duplicates into the first occurrence; conflicts are kept.
    NoDuplicates,
    /// User-supplied resolution function.
    Custom(Arc<dyn Fn(Vec<Signal>) -> Vec<Signal> + Send + Sync>),
}

impl std::fmt::Debug for ConflictResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConflictResolver::None => "None",
            ConflictResolver::First => "First",
            ConflictResolver::Last => "Last",
            ConflictResolver::NoConflicts => "NoConflicts",
            ConflictResolver::NoDuplicates => "NoDuplicates",
            ConflictResolver::Custom(_) => "Custom",
        };
        write!(f, "ConflictResolver::{name}")
    }
}

fn resolve(signals: Vec<Signal>, resolver: &ConflictResolver) -> Vec<Signal> {
    match resolver {
        ConflictResolver::None => signals,
        ConflictResolver::First => keep_first_of_conflicts(signals),
        ConflictResolver::Last => {
            let mut reversed = signals;
            reversed.reverse();
            let mut kept = keep_first_of_conflicts(reversed);
            kept.reverse();
            kept
        }
        ConflictResolver::NoConflicts => {
            let conflicted: Vec<bool> = signals
                .iter()
                .enumerate()
                .map(|(i, a)| signals.iter().enumerate().any(|(j, b)| i != j && conflicts(a, b)))
                .collect();
            signals
                .into_iter()
                .zip(conflicted)
                .filter_map(|(signal, is_conflicted)| (!is_conflicted).then_some(signal))
                .collect()
        }
        ConflictResolver::NoDuplicates => {
            let mut kept: Vec<Signal> = Vec::new();
            for signal in signals {
                let duplicate = kept
                    .iter()
                    .any(|existing| existing.asset == signal.asset && existing.rating.signum() == signal.rating.signum());
                if !duplicate {
                    kept.push(signal);
                }
            }
            kept
        }
        ConflictResolver::Custom(resolver) => resolver(signals),
    }
}

/// Walks `signals` in order, keeping a signal unless an earlier-kept signal already conflicts
/// with it.
fn keep_first_of_conflicts(signals: Vec<Signal>) -> Vec<Signal> {
    let mut kept: Vec<Signal> = Vec::new();
    for signal in signals {
        if !kept.iter().any(|existing| conflicts(existing, &signal)) {
            kept.push(signal);
        }
    }
    kept
}

/// Runs substrategies in sequence, concatenating their signals before resolving conflicts.
pub struct CombinedStrategy {
    strategies: Vec<Box<dyn Strategy>>,
    resolver: ConflictResolver,
}

impl CombinedStrategy {
    pub fn new(strategies: Vec<Box<dyn Strategy>>, resolver: ConflictResolver) -> Self {
        Self { strategies, resolver }
    }
}

impl Strategy for CombinedStrategy {
    fn create_signals(&mut self, event: &Event) -> Vec<Signal> {
        let mut combined = Vec::new();
        for strategy in &mut self.strategies {
            combined.extend(strategy.create_signals(event));
        }
        resolve(combined, &self.resolver)
    }

    fn reset(&mut self) {
        for strategy in &mut self.strategies {
            strategy.reset();
        }
    }
}

/// Runs substrategies concurrently (each substrategy's state is independent, so evaluating them
/// on separate threads for the duration of one event is sound), then resolves conflicts over the
/// combined output.
pub struct ParallelStrategy {
    strategies: Vec<Box<dyn Strategy>>,
    resolver: ConflictResolver,
}

impl ParallelStrategy {
    pub fn new(strategies: Vec<Box<dyn Strategy>>, resolver: ConflictResolver) -> Self {
        Self { strategies, resolver }
    }
}

impl Strategy for ParallelStrategy {
    fn create_signals(&mut self, event: &Event) -> Vec<Signal> {
        let combined = std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .strategies
                .iter_mut()
                .map(|strategy| scope.spawn(move || strategy.create_signals(event)))
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().expect("substrategy panicked"))
                .collect::<Vec<_>>()
        });
        resolve(combined, &self.resolver)
    }

    fn reset(&mut self) {
        for strategy in &mut self.strategies {
            strategy.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{PriceBarData, PriceItem};
    use crate::model::asset::Asset;
    use chrono::{Duration, Utc};

    struct Fixed(f64);

    impl Strategy for Fixed {
        fn create_signals(&mut self, event: &Event) -> Vec<Signal> {
            event
                .items
                .iter()
                .map(|item| Signal::entry(item.asset().clone(), self.0))
                .collect()
        }

        fn reset(&mut self) {}
    }

    fn event() -> Event {
        Event::new(
            Utc::now(),
            vec![PriceItem::PriceBar {
                asset: Asset::stock("TEST"),
                bar: PriceBarData {
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 1.0,
                    volume: f64::NAN,
                    span: Duration::minutes(1),
                },
            }],
        )
    }

    #[test]
    fn no_conflicts_resolver_drops_conflicting_signals() {
        let mut combined = CombinedStrategy::new(
            vec![Box::new(Fixed(1.0)), Box::new(Fixed(-1.0))],
            ConflictResolver::NoConflicts,
        );
        assert!(combined.create_signals(&event()).is_empty());
    }

    #[test]
    fn first_resolver_keeps_earlier_signal() {
        let mut combined = CombinedStrategy::new(
            vec![Box::new(Fixed(1.0)), Box::new(Fixed(-1.0))],
            ConflictResolver::First,
        );
        let signals = combined.create_signals(&event());
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].rating, 1.0);
    }

    #[test]
    fn no_duplicates_resolver_collapses_same_sign_repeats() {
        let mut combined = CombinedStrategy::new(
            vec![Box::new(Fixed(1.0)), Box::new(Fixed(1.0))],
            ConflictResolver::NoDuplicates,
        );
        assert_eq!(combined.create_signals(&event()).len(), 1);
    }

    #[test]
    fn parallel_strategy_merges_substrategy_output() {
        let mut parallel = ParallelStrategy::new(vec![Box::new(Fixed(1.0))], ConflictResolver::None);
        assert_eq!(parallel.create_signals(&event()).len(), 1);
    }
}
