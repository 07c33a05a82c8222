use thiserror::Error;

/// All errors generated in the `engine` module.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to build struct due to incomplete attributes provided")]
    BuilderIncomplete,

    #[error("account equity could not be computed: {0}")]
    Account(#[from] crate::account::error::AccountError),
}
