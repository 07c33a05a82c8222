use thiserror::Error;

/// All errors generated in the `convert` module.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("orderPercentage must be in (0, 1], got {0}")]
    InvalidOrderPercentage(f64),

    #[error("safetyMargin must be in [0, 1), got {0}")]
    InvalidSafetyMargin(f64),

    #[error("ATR period must be greater than zero")]
    InvalidAtrPeriod,

    #[error("atrSizing must be in (0, 1], got {0}")]
    InvalidAtrSizing(f64),

    #[error("limitOffset must be in (0, 1), got {0}")]
    InvalidLimitOffset(f64),

    #[error("fx conversion failed: {0}")]
    Fx(#[from] crate::fx::FxError),
}
