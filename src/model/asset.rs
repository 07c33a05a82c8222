use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::currency::Currency;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("malformed asset identifier '{0}', expected SYMBOL;TYPE;CURRENCY;EXCHANGE;MULTIPLIER")]
    Malformed(String),

    #[error("unknown asset type '{0}'")]
    UnknownType(String),

    #[error("invalid multiplier '{0}'")]
    InvalidMultiplier(String),
}

/// The traded instrument category. Controls nothing in the core engine directly, but brokers
/// and converters may use it to reject unsupported combinations (eg/ shorting a bond).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    Stock,
    Forex,
    Crypto,
    Future,
    Bond,
    Index,
    Option,
}

impl AssetType {
    fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stock => "STOCK",
            AssetType::Forex => "FOREX",
            AssetType::Crypto => "CRYPTO",
            AssetType::Future => "FUTURE",
            AssetType::Bond => "BOND",
            AssetType::Index => "INDEX",
            AssetType::Option => "OPTION",
        }
    }
}

impl FromStr for AssetType {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STOCK" => Ok(AssetType::Stock),
            "FOREX" => Ok(AssetType::Forex),
            "CRYPTO" => Ok(AssetType::Crypto),
            "FUTURE" => Ok(AssetType::Future),
            "BOND" => Ok(AssetType::Bond),
            "INDEX" => Ok(AssetType::Index),
            "OPTION" => Ok(AssetType::Option),
            other => Err(AssetError::UnknownType(other.to_string())),
        }
    }
}

/// A tradable instrument, identified by the immutable tuple
/// `(symbol, type, currency, exchange, multiplier)`. Two [`Asset`]s are equal iff every field
/// matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub asset_type: AssetType,
    pub currency: Currency,
    pub exchange: String,
    pub multiplier: f64,
}

// `multiplier` is an f64, so `Eq`/`Hash` can't be derived; an `Asset`'s identity tuple is
// otherwise ordinary value equality, so hash the multiplier by its bit pattern.
impl Eq for Asset {}

impl Hash for Asset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
        self.asset_type.hash(state);
        self.currency.hash(state);
        self.exchange.hash(state);
        self.multiplier.to_bits().hash(state);
    }
}

impl Asset {
    pub fn new(
        symbol: impl Into<String>,
        asset_type: AssetType,
        currency: Currency,
        exchange: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            asset_type,
            currency,
            exchange: exchange.into(),
            multiplier: 1.0,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Convenience constructor for a USD-denominated stock on the SMART exchange, the most
    /// common shape used in tests and samples.
    pub fn stock(symbol: impl Into<String>) -> Self {
        Self::new(symbol, AssetType::Stock, Currency::usd(), "SMART")
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{};{}",
            self.symbol,
            self.asset_type.as_str(),
            self.currency,
            self.exchange,
            self.multiplier
        )
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(';').collect();
        let [symbol, asset_type, currency, exchange, multiplier] = parts.as_slice() else {
            return Err(AssetError::Malformed(s.to_string()));
        };
        Ok(Asset {
            symbol: symbol.to_string(),
            asset_type: asset_type.parse()?,
            currency: Currency::new(*currency),
            exchange: exchange.to_string(),
            multiplier: multiplier
                .parse()
                .map_err(|_| AssetError::InvalidMultiplier(multiplier.to_string()))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_string() {
        let asset = Asset::stock("AAPL").with_multiplier(1.0);
        let round_tripped: Asset = asset.to_string().parse().unwrap();
        assert_eq!(asset, round_tripped);
    }

    #[test]
    fn rejects_malformed_string() {
        assert!("AAPL;STOCK".parse::<Asset>().is_err());
    }

    #[test]
    fn rejects_unknown_type() {
        assert!("AAPL;GIZMO;USD;SMART;1".parse::<Asset>().is_err());
    }
}
