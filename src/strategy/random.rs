//! Seeded-random reference strategy, mainly useful as a baseline to benchmark real strategies
//! against (spec §4.3).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::event::Event;
use crate::strategy::error::StrategyError;
use crate::strategy::{Signal, Strategy};

/// Emits a `+1`/`-1` rating with probability `probability` for every priced asset in an event,
/// using a seedable RNG so runs are reproducible.
#[derive(Debug)]
pub struct RandomStrategy {
    probability: f64,
    seed: u64,
    rng: StdRng,
}

impl RandomStrategy {
    pub fn new(probability: f64, seed: u64) -> Result<Self, StrategyError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(StrategyError::InvalidProbability(probability));
        }
        Ok(Self {
            probability,
            seed,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl Strategy for RandomStrategy {
    fn create_signals(&mut self, event: &Event) -> Vec<Signal> {
        let mut signals = Vec::new();
        for item in &event.items {
            if self.rng.random::<f64>() < self.probability {
                let rating = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
                signals.push(Signal::entry(item.asset().clone(), rating).with_source("random"));
            }
        }
        signals
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}
