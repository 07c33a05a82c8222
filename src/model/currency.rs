use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A currency, identified by its ISO 4217 alphabetic code (eg/ "USD", "JPY").
///
/// Display precision is process-wide, mirroring the mutable global FX/display settings noted in
/// the engine's design: every [`Currency`] sharing a code shares the same precision, and updating
/// it is safe against concurrent reads (see [`crate::config::Config`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Currency(String);

fn precision_table() -> &'static RwLock<HashMap<String, u8>> {
    static TABLE: OnceLock<RwLock<HashMap<String, u8>>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(HashMap::new()))
}

impl Currency {
    /// Default display precision used when no override has been set for a code.
    pub const DEFAULT_PRECISION: u8 = 2;

    /// Constructs a new [`Currency`] from an ISO code. The code is upper-cased for comparison
    /// purposes so `Currency::new("usd") == Currency::new("USD")`.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_ascii_uppercase())
    }

    /// Returns the ISO code as a `&str` (eg/ "USD").
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Returns the display precision configured for this currency, or [`Currency::DEFAULT_PRECISION`]
    /// if none has been set.
    pub fn display_precision(&self) -> u8 {
        precision_table()
            .read()
            .get(&self.0)
            .copied()
            .unwrap_or(Self::DEFAULT_PRECISION)
    }

    /// Sets the process-wide display precision used for this currency code. Affects every
    /// existing and future [`Currency`] instance sharing the same code.
    pub fn set_display_precision(code: &str, places: u8) {
        precision_table()
            .write()
            .insert(code.to_ascii_uppercase(), places);
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn jpy() -> Self {
        Self::new("JPY")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for Currency {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}
