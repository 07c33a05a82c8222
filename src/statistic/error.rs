use thiserror::Error;

/// All errors generated in the `statistic` module.
#[derive(Error, Debug)]
pub enum StatisticError {
    #[error("Failed to build struct due to incomplete attributes provided")]
    BuilderIncomplete,

    #[error("unknown run: {0}")]
    UnknownRun(String),

    #[error("unknown metric: {0}")]
    UnknownMetric(String),
}
