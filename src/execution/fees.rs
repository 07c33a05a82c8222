//! Pluggable broker fee schedules (spec §4.7 "Fee Model").

use std::fmt::Debug;

use crate::model::amount::Amount;
use crate::model::asset::Asset;
use crate::model::size::Size;

/// Computes the fee incurred by a fill. Stateless: given the same inputs, always returns the
/// same [`Amount`].
pub trait FeeModel: Debug + Send + Sync {
    fn fee(&self, asset: &Asset, size: Size, price: f64) -> Amount;
}

/// No commission.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFee;

impl FeeModel for NoFee {
    fn fee(&self, asset: &Asset, _size: Size, _price: f64) -> Amount {
        Amount::zero(asset.currency.clone())
    }
}

/// A flat percentage of notional value.
#[derive(Debug, Clone, Copy)]
pub struct PercentageFee {
    pub pct: f64,
}

impl PercentageFee {
    pub fn new(pct: f64) -> Self {
        Self { pct }
    }
}

impl FeeModel for PercentageFee {
    fn fee(&self, asset: &Asset, size: Size, price: f64) -> Amount {
        let notional = size.abs().as_f64() * price;
        Amount::new(asset.currency.clone(), notional * self.pct)
    }
}

/// A flat amount charged per share/contract traded.
#[derive(Debug, Clone, Copy)]
pub struct PerShareFee {
    pub per_share: f64,
}

impl PerShareFee {
    pub fn new(per_share: f64) -> Self {
        Self { per_share }
    }
}

impl FeeModel for PerShareFee {
    fn fee(&self, asset: &Asset, size: Size, _price: f64) -> Amount {
        Amount::new(asset.currency.clone(), size.abs().as_f64() * self.per_share)
    }
}

/// A percentage fee that decreases in marginal tiers by cumulative traded notional threshold
/// (ascending `(notional_threshold, pct)` pairs; the last tier's `pct` applies to any notional
/// above its threshold).
#[derive(Debug, Clone)]
pub struct TieredFee {
    tiers: Vec<(f64, f64)>,
}

impl TieredFee {
    pub fn new(mut tiers: Vec<(f64, f64)>) -> Self {
        tiers.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        Self { tiers }
    }
}

impl FeeModel for TieredFee {
    fn fee(&self, asset: &Asset, size: Size, price: f64) -> Amount {
        let notional = size.abs().as_f64() * price;
        let pct = self
            .tiers
            .iter()
            .rev()
            .find(|(threshold, _)| notional >= *threshold)
            .map(|(_, pct)| *pct)
            .or_else(|| self.tiers.first().map(|(_, pct)| *pct))
            .unwrap_or(0.0);
        Amount::new(asset.currency.clone(), notional * pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn asset() -> Asset {
        Asset::stock("TEST")
    }

    #[test]
    fn no_fee_is_zero() {
        assert_eq!(NoFee.fee(&asset(), Size::new(dec!(10)), 100.0).value, 0.0);
    }

    #[test]
    fn percentage_fee_scales_with_notional() {
        let fee = PercentageFee::new(0.001).fee(&asset(), Size::new(dec!(10)), 100.0);
        assert_eq!(fee.value, 1.0);
    }

    #[test]
    fn per_share_fee_ignores_price() {
        let fee = PerShareFee::new(0.01).fee(&asset(), Size::new(dec!(100)), 5.0);
        assert_eq!(fee.value, 1.0);
    }

    #[test]
    fn tiered_fee_uses_highest_matching_tier() {
        let fee_model = TieredFee::new(vec![(0.0, 0.01), (10_000.0, 0.005), (100_000.0, 0.001)]);
        let small = fee_model.fee(&asset(), Size::new(dec!(10)), 100.0); // 1_000 notional
        let large = fee_model.fee(&asset(), Size::new(dec!(2000)), 100.0); // 200_000 notional
        assert_eq!(small.value, 10.0);
        assert_eq!(large.value, 200.0);
    }
}
