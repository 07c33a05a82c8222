//! Creates a fresh [`Journal`] per run name, so a host running many backtests concurrently needs
//! only one factory (spec §4.11 "A `MultiRunJournal` creates a fresh Journal per run name").

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::fx::FxRegistry;
use crate::statistic::journal::{Journal, MetricsJournal};
use crate::statistic::logger::MetricsLogger;

pub struct MultiRunJournal {
    fx: FxRegistry,
    logger: Arc<dyn MetricsLogger>,
    journals: Mutex<HashMap<String, ()>>,
}

impl MultiRunJournal {
    pub fn new(fx: FxRegistry, logger: Arc<dyn MetricsLogger>) -> Self {
        Self {
            fx,
            logger,
            journals: Mutex::new(HashMap::new()),
        }
    }

    /// Builds a fresh [`MetricsJournal`] for `run`, registering it so `runs()` reflects every
    /// name this factory has ever produced a journal for.
    pub fn journal_for(&self, run: impl Into<String>) -> Box<dyn Journal> {
        let run = run.into();
        self.journals.lock().insert(run.clone(), ());
        Box::new(MetricsJournal::new(run, self.fx.clone(), self.logger.clone()))
    }

    pub fn runs(&self) -> Vec<String> {
        self.journals.lock().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::StaticFxTable;
    use crate::statistic::logger::MemoryLogger;

    #[test]
    fn produces_an_independent_journal_per_run_name() {
        let factory = MultiRunJournal::new(FxRegistry::new(Arc::new(StaticFxTable::new())), Arc::new(MemoryLogger::new(None)));
        let _a = factory.journal_for("run-a");
        let _b = factory.journal_for("run-b");
        let mut runs = factory.runs();
        runs.sort();
        assert_eq!(runs, vec!["run-a".to_string(), "run-b".to_string()]);
    }
}
