//! A held (or historical) position in one [`Asset`], and the fill-combination rule that updates
//! it (spec §3 "Position").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::asset::Asset;
use crate::model::size::Size;

/// A holding of `asset`: `closed` iff `size == 0`, `long` iff `size > 0`, `short` iff `size < 0`
/// (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub asset: Asset,
    pub size: Size,
    pub avg_price: f64,
    pub market_price: f64,
    pub last_update: DateTime<Utc>,
}

impl Position {
    pub fn new(asset: Asset, size: Size, avg_price: f64, time: DateTime<Utc>) -> Self {
        Self {
            asset,
            size,
            avg_price,
            market_price: avg_price,
            last_update: time,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.size.is_zero()
    }

    pub fn is_long(&self) -> bool {
        self.size.is_long()
    }

    pub fn is_short(&self) -> bool {
        self.size.is_short()
    }

    pub fn market_value(&self) -> f64 {
        self.size.as_f64() * self.market_price
    }

    /// Combines an incoming fill of `fill_size` at `fill_price` into this position, following
    /// spec §3's rule: weighted-average cost when extending in the same direction,
    /// price-preserving when reducing, price-resetting (new basis = fill price) when the fill
    /// flips the position's sign. Returns the resulting position (size 0 ⇒ closed, drop it from
    /// the book) and the realized P&L of the reducing portion.
    pub fn apply_fill(
        &self,
        fill_size: Size,
        fill_price: f64,
        time: DateTime<Utc>,
    ) -> (Position, f64) {
        let current = self.size.as_decimal();
        let incoming = fill_size.as_decimal();
        let new_total = current + incoming;

        if current.is_zero() {
            return (
                Position::new(self.asset.clone(), fill_size, fill_price, time),
                0.0,
            );
        }

        let same_direction = current.signum() == incoming.signum();

        if same_direction {
            let new_qty = new_total.abs();
            let new_avg = if new_qty.is_zero() {
                fill_price
            } else {
                (current.abs() * rust_decimal::Decimal::try_from(self.avg_price).unwrap_or_default()
                    + incoming.abs()
                        * rust_decimal::Decimal::try_from(fill_price).unwrap_or_default())
                    / new_qty
            };
            let new_avg = rust_decimal::prelude::ToPrimitive::to_f64(&new_avg).unwrap_or(fill_price);
            let mut position = Position::new(self.asset.clone(), Size::new(new_total), new_avg, time);
            position.market_price = fill_price;
            return (position, 0.0);
        }

        // Reducing or crossing: realize P&L on the smaller-magnitude overlap.
        let closing_qty = current.abs().min(incoming.abs());
        let sign: f64 = if current.is_sign_positive() { 1.0 } else { -1.0 };
        let pnl = rust_decimal::prelude::ToPrimitive::to_f64(&closing_qty).unwrap_or(0.0)
            * (fill_price - self.avg_price)
            * sign;

        if new_total.is_zero() {
            let mut position = Position::new(self.asset.clone(), Size::ZERO, self.avg_price, time);
            position.market_price = fill_price;
            return (position, pnl);
        }

        let crossed_zero = new_total.signum() != current.signum();
        let new_avg = if crossed_zero { fill_price } else { self.avg_price };
        let mut position = Position::new(self.asset.clone(), Size::new(new_total), new_avg, time);
        position.market_price = fill_price;
        (position, pnl)
    }

    pub fn update_market_price(&mut self, price: f64, time: DateTime<Utc>) {
        self.market_price = price;
        self.last_update = time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::currency::Currency;
    use rust_decimal_macros::dec;

    fn asset() -> Asset {
        Asset::stock("TEST")
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn opening_a_flat_position_sets_avg_price_to_fill_price() {
        let flat = Position::new(asset(), Size::ZERO, 0.0, now());
        let (position, pnl) = flat.apply_fill(Size::new(dec!(10)), 100.0, now());
        assert_eq!(position.size, Size::new(dec!(10)));
        assert_eq!(position.avg_price, 100.0);
        assert_eq!(pnl, 0.0);
    }

    #[test]
    fn extending_same_direction_uses_weighted_average() {
        let long = Position::new(asset(), Size::new(dec!(10)), 100.0, now());
        let (position, pnl) = long.apply_fill(Size::new(dec!(10)), 200.0, now());
        assert_eq!(position.size, Size::new(dec!(20)));
        assert_eq!(position.avg_price, 150.0);
        assert_eq!(pnl, 0.0);
    }

    #[test]
    fn reducing_preserves_avg_price_and_realizes_pnl() {
        let long = Position::new(asset(), Size::new(dec!(10)), 100.0, now());
        let (position, pnl) = long.apply_fill(Size::new(dec!(-4)), 110.0, now());
        assert_eq!(position.size, Size::new(dec!(6)));
        assert_eq!(position.avg_price, 100.0);
        assert_eq!(pnl, 40.0);
    }

    #[test]
    fn closing_exactly_zeroes_size() {
        let long = Position::new(asset(), Size::new(dec!(10)), 100.0, now());
        let (position, pnl) = long.apply_fill(Size::new(dec!(-10)), 120.0, now());
        assert!(position.is_closed());
        assert_eq!(pnl, 200.0);
    }

    #[test]
    fn crossing_zero_resets_basis_to_fill_price() {
        let long = Position::new(asset(), Size::new(dec!(10)), 100.0, now());
        let (position, pnl) = long.apply_fill(Size::new(dec!(-15)), 120.0, now());
        assert_eq!(position.size, Size::new(dec!(-5)));
        assert_eq!(position.avg_price, 120.0);
        assert_eq!(pnl, 200.0);
    }

    #[test]
    fn currency_of_position_asset_is_preserved() {
        let position = Position::new(asset(), Size::ZERO, 0.0, now());
        assert_eq!(position.asset.currency, Currency::usd());
    }
}
