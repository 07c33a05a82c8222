//! Per-step [`Journal`] contract and the reference [`MetricsJournal`] implementation (spec §4.11).

use std::sync::Arc;

use crate::account::Account;
use crate::event::Event;
use crate::fx::FxRegistry;
use crate::order::Instruction;
use crate::statistic::logger::MetricsLogger;

/// Receives `(event, account, instructions)` once per run-loop step (spec §4.10 step 4, §4.11).
pub trait Journal: Send + Sync {
    fn track(&mut self, event: &Event, account: &Account, instructions: &[Instruction]);

    /// Called once the feed is exhausted or the run is cancelled.
    fn finish(&mut self) {}
}

/// Computes named numeric metrics per step and forwards them to a [`MetricsLogger`] (spec §4.11):
/// `account.equity`, `account.positions`, `account.pnl`, `run.progress`.
pub struct MetricsJournal {
    run: String,
    fx: FxRegistry,
    logger: Arc<dyn MetricsLogger>,
    started: bool,
}

impl MetricsJournal {
    pub fn new(run: impl Into<String>, fx: FxRegistry, logger: Arc<dyn MetricsLogger>) -> Self {
        Self {
            run: run.into(),
            fx,
            logger,
            started: false,
        }
    }

    fn ensure_started(&mut self, event: &Event) {
        if !self.started {
            self.logger
                .start(&self.run, crate::model::timeframe::Timeframe::infinite(event.time));
            self.started = true;
        }
    }
}

impl Journal for MetricsJournal {
    fn track(&mut self, event: &Event, account: &Account, instructions: &[Instruction]) {
        self.ensure_started(event);
        let _ = instructions;

        let equity = account
            .equity_amount(&self.fx)
            .map(|amount| amount.value)
            .unwrap_or(f64::NAN);
        let pnl: f64 = account.trades.iter().map(|trade| trade.pnl).sum();

        let mut metrics = std::collections::HashMap::new();
        metrics.insert("account.equity".to_string(), equity);
        metrics.insert("account.positions".to_string(), account.positions.len() as f64);
        metrics.insert("account.pnl".to_string(), pnl);

        self.logger.log(&metrics, event.time, &self.run);
    }

    fn finish(&mut self) {
        self.logger.end(&self.run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::internal::InternalAccount;
    use crate::fx::StaticFxTable;
    use crate::model::currency::Currency;
    use crate::model::wallet::Wallet;
    use crate::statistic::logger::MemoryLogger;
    use chrono::Utc;

    #[test]
    fn tracks_equity_and_pnl_through_to_the_logger() {
        let fx = FxRegistry::new(Arc::new(StaticFxTable::new()));
        let logger = Arc::new(MemoryLogger::new(None));
        let mut journal = MetricsJournal::new("run-1", fx, logger.clone());

        let account = InternalAccount::new(Currency::usd(), Wallet::single(Currency::usd(), 100_000.0), Utc::now()).to_account();
        let event = Event::new(Utc::now(), vec![]);

        journal.track(&event, &account, &[]);
        journal.finish();

        let series = logger.get_metric("account.equity", Some("run-1")).unwrap();
        assert_eq!(series.values(), &[100_000.0]);
    }
}
