use std::ops::{Add, Neg};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A signed, fixed-scale quantity of shares/contracts. Positive is long/buy, negative is
/// short/sell; zero represents "flat" / "no quantity". Backed by [`Decimal`] so fractional sizes
/// (where an order type and asset support them) don't accumulate binary-float error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Size(Decimal);

impl Size {
    pub const ZERO: Size = Size(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn from_f64(value: f64) -> Self {
        Self(Decimal::from_f64_retain(value).unwrap_or(Decimal::ZERO))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_long(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_short(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(&self) -> Size {
        Size(self.0.abs())
    }

    /// Rounds to `fractions` decimal places (0 means integer quantities only), following the
    /// policy converter's `fractions` configuration field.
    pub fn rounded(&self, fractions: u32) -> Size {
        Size(self.0.round_dp(fractions))
    }

    /// The smaller in magnitude of `self` and `other`, preserving `self`'s sign. Used when
    /// clamping a reducing/closing order to the residual position size.
    pub fn clamp_magnitude(&self, max_magnitude: Size) -> Size {
        if self.0.abs() > max_magnitude.0.abs() {
            Size(max_magnitude.0.abs() * self.0.signum())
        } else {
            *self
        }
    }
}

impl Add for Size {
    type Output = Size;
    fn add(self, rhs: Size) -> Size {
        Size(self.0 + rhs.0)
    }
}

impl Neg for Size {
    type Output = Size;
    fn neg(self) -> Size {
        Size(-self.0)
    }
}

impl From<Decimal> for Size {
    fn from(value: Decimal) -> Self {
        Size(value)
    }
}

impl From<i64> for Size {
    fn from(value: i64) -> Self {
        Size(Decimal::from(value))
    }
}
