//! The reference general-purpose converter: percentage-of-equity sizing with configurable risk
//! caps (spec §4.4 "Flex converter").

use crate::account::Account;
use crate::convert::error::ConvertError;
use crate::convert::SignalConverter;
use crate::event::{Event, PriceKind};
use crate::fx::FxRegistry;
use crate::model::size::Size;
use crate::order::{Instruction, SingleOrder};
use crate::strategy::{Signal, SignalType};

/// General-purpose signal-to-order converter (spec §4.4). Sizes each entry as a fraction of
/// account equity, skips what it can't safely act on, and emits a market order, a limit order, or
/// a take-profit/stop-loss bracket depending on what the signal specifies.
#[derive(Debug)]
pub struct FlexConverter {
    /// Fraction of equity risked per order, eg/ `0.01` for 1%.
    pub order_percentage: f64,
    pub shorting: bool,
    pub price_kind: PriceKind,
    /// Decimal places sizes are rounded to; `0` means whole-unit quantities only.
    pub fractions: u32,
    /// At most one open order per asset.
    pub one_order_only: bool,
    /// Fraction of buying power held back as a safety buffer.
    pub safety_margin: f64,
    /// Signals priced below this are skipped outright.
    pub min_price: f64,
    pub enable_metrics: bool,
    /// When set, a flat entry with no take-profit/stop-loss on the signal is placed as a
    /// `LimitOrder` at `price * (1 ± limit_offset)` instead of at market (spec §4.4 step 7).
    pub limit_offset: Option<f64>,
    fx: FxRegistry,
}

impl FlexConverter {
    pub fn new(fx: FxRegistry) -> Result<Self, ConvertError> {
        Self::build(fx, 0.01, false, PriceKind::Default, 0, false, 0.1, 0.0, false)
    }

    /// Named factory (spec §6 `FlexConverter::limitOrders`): entries without an explicit
    /// take-profit/stop-loss are placed as limit orders offset from the signal price by
    /// `limit_offset`, a fraction in `(0, 1)`.
    pub fn limit_orders(fx: FxRegistry, limit_offset: f64) -> Result<Self, ConvertError> {
        Self::new(fx)?.with_limit_offset(limit_offset)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn build(
        fx: FxRegistry,
        order_percentage: f64,
        shorting: bool,
        price_kind: PriceKind,
        fractions: u32,
        one_order_only: bool,
        safety_margin: f64,
        min_price: f64,
        enable_metrics: bool,
    ) -> Result<Self, ConvertError> {
        if !(0.0 < order_percentage && order_percentage <= 1.0) {
            return Err(ConvertError::InvalidOrderPercentage(order_percentage));
        }
        if !(0.0..1.0).contains(&safety_margin) {
            return Err(ConvertError::InvalidSafetyMargin(safety_margin));
        }
        Ok(Self {
            order_percentage,
            shorting,
            price_kind,
            fractions,
            one_order_only,
            safety_margin,
            min_price,
            enable_metrics,
            limit_offset: None,
            fx,
        })
    }

    /// Validates and sets [`Self::limit_offset`]; `limit_offset` must be in `(0, 1)`.
    pub fn with_limit_offset(mut self, limit_offset: f64) -> Result<Self, ConvertError> {
        if !(0.0 < limit_offset && limit_offset < 1.0) {
            return Err(ConvertError::InvalidLimitOffset(limit_offset));
        }
        self.limit_offset = Some(limit_offset);
        Ok(self)
    }

    fn size_for(&self, account: &Account, price: f64, currency: &crate::model::currency::Currency, time: chrono::DateTime<chrono::Utc>) -> Option<Size> {
        let equity = account.equity_amount(&self.fx).ok()?;
        let target_notional = self
            .fx
            .convert(equity.value * self.order_percentage, &equity.currency, currency, time)
            .ok()?;
        if price <= 0.0 {
            return None;
        }
        let raw = rust_decimal::Decimal::try_from(target_notional / price).ok()?;
        let size = Size::new(raw).rounded(self.fractions);
        (!size.is_zero()).then_some(size)
    }

    fn within_buying_power(&self, account: &Account, size: Size, price: f64) -> bool {
        let notional = size.abs().as_f64() * price;
        notional <= account.buying_power.value * (1.0 - self.safety_margin)
    }

    fn order_for_entry(&self, signal: &Signal, size: Size, price: f64) -> Option<Instruction> {
        let asset = signal.asset.clone();
        match (signal.take_profit, signal.stop_loss) {
            (Some(take_profit), Some(stop_loss)) => {
                let exit_size = -size;
                Some(Instruction::Bracket {
                    entry: SingleOrder::market(asset.clone(), size),
                    take_profit: SingleOrder::limit(asset.clone(), exit_size, take_profit),
                    stop_loss: SingleOrder::stop(asset, exit_size, stop_loss),
                })
            }
            _ => match self.limit_offset {
                Some(offset) => {
                    let sign = if size.is_long() { 1.0 } else { -1.0 };
                    let limit_price = price * (1.0 - offset * sign);
                    Some(Instruction::Single(SingleOrder::limit(asset, size, limit_price)))
                }
                None => Some(Instruction::Single(SingleOrder::market(asset, size))),
            },
        }
    }
}

impl SignalConverter for FlexConverter {
    fn convert(&mut self, signals: Vec<Signal>, account: &Account, event: &Event) -> Vec<Instruction> {
        let mut instructions = Vec::new();

        for signal in signals {
            let Some(price) = event.price_of(&signal.asset, self.price_kind) else {
                continue;
            };
            if price < self.min_price {
                continue;
            }

            if self.one_order_only && account.open_orders.iter().any(|o| o.asset == signal.asset) {
                continue;
            }

            let position = account.position_of(&signal.asset);
            let is_flat = position.map(|p| p.is_closed()).unwrap_or(true);

            match signal.signal_type {
                SignalType::Exit => {
                    if let Some(position) = position.filter(|p| !p.is_closed()) {
                        instructions.push(Instruction::Single(SingleOrder::market(
                            signal.asset.clone(),
                            -position.size,
                        )));
                    }
                }
                SignalType::Entry | SignalType::Both if is_flat => {
                    let Some(size) = self.size_for(account, price, &signal.asset.currency, event.time) else {
                        continue;
                    };
                    let signed = if signal.rating < 0.0 { -size } else { size };

                    if !self.shorting && signed.is_short() {
                        continue;
                    }
                    if !self.within_buying_power(account, signed, price) {
                        continue;
                    }
                    if let Some(instruction) = self.order_for_entry(&signal, signed, price) {
                        instructions.push(instruction);
                    }
                }
                SignalType::Both => {
                    // Non-flat and not an Exit: the position already matches or opposes the
                    // signal direction; `FlexConverter` holds rather than pyramiding or flipping.
                }
                SignalType::Entry => {}
            }
        }

        instructions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::internal::InternalAccount;
    use crate::fx::StaticFxTable;
    use crate::model::asset::Asset;
    use crate::model::currency::Currency;
    use crate::model::wallet::Wallet;
    use crate::event::{PriceBarData, PriceItem};
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn fx() -> FxRegistry {
        FxRegistry::new(Arc::new(StaticFxTable::new()))
    }

    fn account(equity: f64) -> Account {
        let mut internal = InternalAccount::new(Currency::usd(), Wallet::single(Currency::usd(), equity), Utc::now());
        internal.buying_power = crate::model::amount::Amount::new(Currency::usd(), equity);
        internal.to_account()
    }

    fn bar_event(asset: Asset, close: f64) -> Event {
        Event::new(
            Utc::now(),
            vec![PriceItem::PriceBar {
                asset,
                bar: PriceBarData {
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: f64::NAN,
                    span: Duration::minutes(1),
                },
            }],
        )
    }

    #[test]
    fn rejects_invalid_order_percentage() {
        assert!(FlexConverter::build(fx(), 0.0, false, PriceKind::Default, 0, false, 0.1, 0.0, false).is_err());
        assert!(FlexConverter::build(fx(), 1.5, false, PriceKind::Default, 0, false, 0.1, 0.0, false).is_err());
    }

    #[test]
    fn sizes_entry_as_percentage_of_equity() {
        let mut converter = FlexConverter::new(fx()).unwrap();
        let asset = Asset::stock("TEST");
        let account = account(100_000.0);
        let event = bar_event(asset.clone(), 100.0);

        let instructions = converter.convert(vec![Signal::entry(asset, 1.0)], &account, &event);
        assert_eq!(instructions.len(), 1);
        match &instructions[0] {
            Instruction::Single(order) => assert_eq!(order.size, Size::from_f64(10.0)),
            other => panic!("expected a single order, got {other:?}"),
        }
    }

    #[test]
    fn without_shorting_rejects_negative_rating_entries() {
        let mut converter = FlexConverter::new(fx()).unwrap();
        let asset = Asset::stock("TEST");
        let account = account(100_000.0);
        let event = bar_event(asset.clone(), 100.0);

        let instructions = converter.convert(vec![Signal::entry(asset, -1.0)], &account, &event);
        assert!(instructions.is_empty());
    }

    #[test]
    fn bracket_emitted_when_signal_carries_take_profit_and_stop_loss() {
        let mut converter = FlexConverter::new(fx()).unwrap();
        let asset = Asset::stock("TEST");
        let account = account(100_000.0);
        let event = bar_event(asset.clone(), 100.0);

        let signal = Signal::entry(asset, 1.0).with_take_profit(110.0).with_stop_loss(90.0);
        let instructions = converter.convert(vec![signal], &account, &event);
        assert!(matches!(instructions[0], Instruction::Bracket { .. }));
    }

    #[test]
    fn rejects_out_of_range_limit_offset() {
        assert!(FlexConverter::new(fx()).unwrap().with_limit_offset(0.0).is_err());
        assert!(FlexConverter::new(fx()).unwrap().with_limit_offset(1.0).is_err());
    }

    #[test]
    fn limit_orders_factory_places_offset_limit_for_flat_entries() {
        let mut converter = FlexConverter::limit_orders(fx(), 0.02).unwrap();
        let asset = Asset::stock("TEST");
        let account = account(100_000.0);
        let event = bar_event(asset.clone(), 100.0);

        let instructions = converter.convert(vec![Signal::entry(asset, 1.0)], &account, &event);
        assert_eq!(instructions.len(), 1);
        match &instructions[0] {
            Instruction::Single(order) => {
                assert_eq!(order.kind, crate::order::OrderKind::Limit { limit: 98.0 });
            }
            other => panic!("expected a limit order, got {other:?}"),
        }
    }

    #[test]
    fn bracket_still_wins_over_limit_offset_when_signal_carries_tp_sl() {
        let mut converter = FlexConverter::limit_orders(fx(), 0.02).unwrap();
        let asset = Asset::stock("TEST");
        let account = account(100_000.0);
        let event = bar_event(asset.clone(), 100.0);

        let signal = Signal::entry(asset, 1.0).with_take_profit(110.0).with_stop_loss(90.0);
        let instructions = converter.convert(vec![signal], &account, &event);
        assert!(matches!(instructions[0], Instruction::Bracket { .. }));
    }

    #[test]
    fn skips_signals_priced_below_min_price() {
        let mut converter =
            FlexConverter::build(fx(), 0.01, false, PriceKind::Default, 0, false, 0.1, 50.0, false).unwrap();
        let asset = Asset::stock("TEST");
        let account = account(100_000.0);
        let event = bar_event(asset.clone(), 10.0);

        assert!(converter.convert(vec![Signal::entry(asset, 1.0)], &account, &event).is_empty());
    }
}
