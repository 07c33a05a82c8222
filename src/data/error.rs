use thiserror::Error;

/// All errors generated in the `data` module (spec §7 "Feed" / "Configuration" kinds).
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Invalid builder attributes provided")]
    BuilderAttributesInvalid,

    #[error("Failed to build struct due to missing attributes: {0}")]
    BuilderIncomplete(&'static str),

    #[error("unparseable row: {0}")]
    UnparseableRow(String),

    #[error("unknown timestamp format: {0}")]
    UnknownTimeFormat(String),

    #[error("relative price jump in {asset} exceeds threshold {threshold}")]
    PriceJumpExceeded { asset: String, threshold: f64 },

    #[error("invalid CSV column pattern: {0}")]
    InvalidColumnPattern(String),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
