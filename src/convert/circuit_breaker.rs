//! Wraps another converter and trips when it emits too many orders too fast, protecting a run
//! from a misbehaving strategy or converter feedback loop (spec §4.4 "Circuit breaker").

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::account::Account;
use crate::convert::SignalConverter;
use crate::event::Event;
use crate::order::Instruction;
use crate::strategy::Signal;

/// Drops a wrapped converter's output once it has emitted more than `max_orders` within the
/// trailing `window`, measured in event time (not wall-clock time, so the breaker behaves
/// identically in backtests and live runs). Stays tripped until enough time passes for the
/// rolling window to fall back under the limit.
pub struct CircuitBreaker {
    inner: Box<dyn SignalConverter>,
    max_orders: usize,
    window: Duration,
    emitted_at: VecDeque<DateTime<Utc>>,
}

impl CircuitBreaker {
    pub fn new(inner: Box<dyn SignalConverter>, max_orders: usize, window: Duration) -> Self {
        Self {
            inner,
            max_orders,
            window,
            emitted_at: VecDeque::new(),
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        while let Some(&oldest) = self.emitted_at.front() {
            if now - oldest > self.window {
                self.emitted_at.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.emitted_at.len() >= self.max_orders
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("max_orders", &self.max_orders)
            .field("window", &self.window)
            .field("tripped", &self.is_tripped())
            .finish_non_exhaustive()
    }
}

impl SignalConverter for CircuitBreaker {
    fn convert(&mut self, signals: Vec<Signal>, account: &Account, event: &Event) -> Vec<Instruction> {
        self.prune(event.time);

        if self.is_tripped() {
            return Vec::new();
        }

        let instructions = self.inner.convert(signals, account, event);
        for _ in &instructions {
            self.emitted_at.push_back(event.time);
        }
        instructions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::internal::InternalAccount;
    use crate::model::currency::Currency;
    use crate::model::wallet::Wallet;
    use crate::strategy::SignalType;

    struct AlwaysOneOrder;

    impl SignalConverter for AlwaysOneOrder {
        fn convert(&mut self, _signals: Vec<Signal>, _account: &Account, _event: &Event) -> Vec<Instruction> {
            vec![Instruction::Single(crate::order::SingleOrder::market(
                crate::model::asset::Asset::stock("TEST"),
                crate::model::size::Size::from_f64(1.0),
            ))]
        }
    }

    fn account() -> Account {
        InternalAccount::new(Currency::usd(), Wallet::single(Currency::usd(), 100_000.0), Utc::now()).to_account()
    }

    fn event(time: DateTime<Utc>) -> Event {
        Event::new(time, vec![])
    }

    fn signal() -> Vec<Signal> {
        vec![Signal::new(crate::model::asset::Asset::stock("TEST"), 1.0, SignalType::Entry)]
    }

    #[test]
    fn passes_through_while_under_the_limit() {
        let mut breaker = CircuitBreaker::new(Box::new(AlwaysOneOrder), 3, Duration::minutes(5));
        let account = account();
        let now = Utc::now();

        for _ in 0..3 {
            assert_eq!(breaker.convert(signal(), &account, &event(now)).len(), 1);
        }
    }

    #[test]
    fn trips_once_max_orders_exceeded_within_window() {
        let mut breaker = CircuitBreaker::new(Box::new(AlwaysOneOrder), 2, Duration::minutes(5));
        let account = account();
        let now = Utc::now();

        breaker.convert(signal(), &account, &event(now));
        breaker.convert(signal(), &account, &event(now));
        assert!(breaker.is_tripped());
        assert!(breaker.convert(signal(), &account, &event(now)).is_empty());
    }

    #[test]
    fn resets_once_old_emissions_fall_outside_the_window() {
        let mut breaker = CircuitBreaker::new(Box::new(AlwaysOneOrder), 2, Duration::minutes(5));
        let account = account();
        let now = Utc::now();

        breaker.convert(signal(), &account, &event(now));
        breaker.convert(signal(), &account, &event(now));
        assert!(breaker.is_tripped());

        let later = now + Duration::minutes(10);
        assert!(!breaker.convert(signal(), &account, &event(later)).is_empty());
    }
}
