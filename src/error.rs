use thiserror::Error;

/// Crate-level error composing every module's error type (SPEC_FULL.md §4.14).
#[derive(Error, Debug)]
pub enum RoboquantError {
    #[error("Failed to build struct due to incomplete attributes provided")]
    BuilderIncomplete,

    #[error("Provided builder attributes are invalid")]
    BuilderAttributesInvalid,

    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("data error: {0}")]
    Data(#[from] crate::data::error::DataError),

    #[error("strategy error: {0}")]
    Strategy(#[from] crate::strategy::error::StrategyError),

    #[error("convert error: {0}")]
    Convert(#[from] crate::convert::error::ConvertError),

    #[error("account error: {0}")]
    Account(#[from] crate::account::error::AccountError),

    #[error("execution error: {0}")]
    Execution(#[from] crate::execution::error::ExecutionError),

    #[error("engine error: {0}")]
    Engine(#[from] crate::engine::error::EngineError),

    #[error("statistic error: {0}")]
    Statistic(#[from] crate::statistic::error::StatisticError),

    #[error("fx error: {0}")]
    Fx(#[from] crate::fx::FxError),
}
