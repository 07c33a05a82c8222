use thiserror::Error;

/// All errors generated in the `strategy` module.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("failed to build struct due to incomplete attributes provided")]
    BuilderIncomplete,

    #[error("RSI thresholds must satisfy 0 < low < high < 100, got low={0}, high={1}")]
    InvalidRsiThresholds(f64, f64),

    #[error("random strategy probability must be in [0, 1], got {0}")]
    InvalidProbability(f64),
}
