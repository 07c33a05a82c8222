//! Derives an execution price from market data (spec §4.7 "Pricing Engine").

use std::fmt::Debug;

use crate::event::{PriceItem, PriceKind};
use crate::model::size::Size;

/// Stateless strategy for turning a [`PriceItem`] into an execution price. `size`'s sign tells
/// the engine which side (buy/sell) is executing, which matters for spread and slippage models.
pub trait PricingEngine: Debug + Send + Sync {
    /// The price a market order of `size` would execute at against `item`.
    fn market_price(&self, item: &PriceItem, size: Size) -> f64;

    /// The fill price once a limit order's trigger condition is met; `limit` is the order's
    /// limit price. Default: fills exactly at the limit (no price improvement).
    fn limit_fill_price(&self, limit: f64, _item: &PriceItem, _size: Size) -> f64 {
        limit
    }

    /// The fill price once a stop order's trigger condition is met; `stop` is the order's stop
    /// price. Default: fills exactly at the stop (spec §4.6: "commonly S").
    fn stop_fill_price(&self, stop: f64, _item: &PriceItem, _size: Size) -> f64 {
        stop
    }

    /// How much of `requested` can fill against `item` this step. Default: no partial fills —
    /// the full requested quantity always fills (spec §9 open question (b) resolved this way;
    /// a custom [`PricingEngine`] may cap this to model thin liquidity).
    fn fillable_size(&self, _item: &PriceItem, requested: Size) -> Size {
        requested
    }
}

/// Exact close/mid price, no cost modelling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCostPricing;

impl PricingEngine for NoCostPricing {
    fn market_price(&self, item: &PriceItem, _size: Size) -> f64 {
        item.get_price(PriceKind::Default)
    }
}

/// Applies a fractional bid/ask spread around the mid price: buys pay `mid * (1 + spread / 2)`,
/// sells receive `mid * (1 - spread / 2)`.
#[derive(Debug, Clone, Copy)]
pub struct SpreadBasedPricing {
    /// Fractional spread, eg/ 0.001 for 10 bps.
    pub spread: f64,
}

impl SpreadBasedPricing {
    pub fn new(spread: f64) -> Self {
        Self { spread }
    }
}

impl PricingEngine for SpreadBasedPricing {
    fn market_price(&self, item: &PriceItem, size: Size) -> f64 {
        let mid = item.get_price(PriceKind::Default);
        let half = self.spread / 2.0;
        if size.is_long() {
            mid * (1.0 + half)
        } else {
            mid * (1.0 - half)
        }
    }
}

/// Applies size-dependent slippage: the larger the order, the worse the execution price, moving
/// against the order's direction by `slippage_per_unit * |size|` as a fraction of price.
#[derive(Debug, Clone, Copy)]
pub struct SlippagePricing {
    pub slippage_per_unit: f64,
}

impl SlippagePricing {
    pub fn new(slippage_per_unit: f64) -> Self {
        Self { slippage_per_unit }
    }
}

impl PricingEngine for SlippagePricing {
    fn market_price(&self, item: &PriceItem, size: Size) -> f64 {
        let base = item.get_price(PriceKind::Default);
        let adjustment = base * self.slippage_per_unit * size.abs().as_f64();
        if size.is_long() {
            base + adjustment
        } else {
            base - adjustment
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PriceBarData;
    use crate::model::asset::Asset;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn bar(close: f64) -> PriceItem {
        PriceItem::PriceBar {
            asset: Asset::stock("TEST"),
            bar: PriceBarData {
                open: close,
                high: close,
                low: close,
                close,
                volume: f64::NAN,
                span: Duration::minutes(1),
            },
        }
    }

    #[test]
    fn no_cost_matches_default_price() {
        let engine = NoCostPricing;
        assert_eq!(engine.market_price(&bar(100.0), Size::new(dec!(1))), 100.0);
    }

    #[test]
    fn spread_based_widens_for_buys_narrows_for_sells() {
        let engine = SpreadBasedPricing::new(0.01);
        let buy = engine.market_price(&bar(100.0), Size::new(dec!(1)));
        let sell = engine.market_price(&bar(100.0), Size::new(dec!(-1)));
        assert!(buy > 100.0);
        assert!(sell < 100.0);
        assert!((buy - sell - 1.0).abs() < 1e-9);
    }

    #[test]
    fn slippage_scales_with_size() {
        let engine = SlippagePricing::new(0.001);
        let small = engine.market_price(&bar(100.0), Size::new(dec!(1)));
        let large = engine.market_price(&bar(100.0), Size::new(dec!(10)));
        assert!(large - 100.0 > small - 100.0);
    }
}
