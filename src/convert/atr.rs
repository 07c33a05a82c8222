//! ATR-scaled converter: uses each asset's own recent volatility to place stops/targets and, for
//! the sizing cap, the fraction of equity that volatility is allowed to put at risk (spec §4.4
//! "ATR signal converter").

use std::collections::HashMap;

use crate::account::Account;
use crate::convert::error::ConvertError;
use crate::convert::SignalConverter;
use crate::event::{Event, PriceKind};
use crate::model::asset::Asset;
use crate::model::size::Size;
use crate::order::{Instruction, SingleOrder};
use crate::strategy::{Signal, SignalType};

#[derive(Debug, Default)]
struct AtrState {
    prev_close: Option<f64>,
    atr: Option<f64>,
    observations: u32,
}

impl AtrState {
    fn update(&mut self, high: f64, low: f64, close: f64, period: u32) {
        let true_range = match self.prev_close {
            Some(prev) => (high - low).max((high - prev).abs()).max((low - prev).abs()),
            None => high - low,
        };
        self.prev_close = Some(close);
        self.observations += 1;

        self.atr = Some(match self.atr {
            None => true_range,
            Some(prev_atr) => (prev_atr * (period - 1) as f64 + true_range) / period as f64,
        });
    }

    fn is_ready(&self, period: u32) -> bool {
        self.observations >= period
    }
}

/// Sizes entries as a percentage of equity like [`crate::convert::flex::FlexConverter`], but
/// derives stop-loss/take-profit distances from each asset's Average True Range instead of
/// requiring the strategy to supply them, and optionally caps size so a stop-out loses no more
/// than `atr_sizing` of equity.
#[derive(Debug)]
pub struct AtrSignalConverter {
    pub period: u32,
    pub order_percentage: f64,
    pub stop_multiple: f64,
    pub profit_multiple: f64,
    pub price_kind: PriceKind,
    /// Fraction of equity a stop-out may lose; `None` disables ATR-based size capping.
    pub atr_sizing: Option<f64>,
    states: HashMap<Asset, AtrState>,
}

impl AtrSignalConverter {
    pub fn new(period: u32, stop_multiple: f64, profit_multiple: f64) -> Result<Self, ConvertError> {
        if period == 0 {
            return Err(ConvertError::InvalidAtrPeriod);
        }
        Ok(Self {
            period,
            order_percentage: 0.01,
            stop_multiple,
            profit_multiple,
            price_kind: PriceKind::Default,
            atr_sizing: None,
            states: HashMap::new(),
        })
    }

    pub fn with_order_percentage(mut self, order_percentage: f64) -> Self {
        self.order_percentage = order_percentage;
        self
    }

    pub fn with_atr_sizing(mut self, atr_sizing: f64) -> Result<Self, ConvertError> {
        if !(0.0 < atr_sizing && atr_sizing <= 1.0) {
            return Err(ConvertError::InvalidAtrSizing(atr_sizing));
        }
        self.atr_sizing = Some(atr_sizing);
        Ok(self)
    }

    fn observe(&mut self, event: &Event) {
        for item in &event.items {
            let (high, low, close) = match item {
                crate::event::PriceItem::PriceBar { bar, .. } => (bar.high, bar.low, bar.close),
                _ => {
                    let price = item.get_price(self.price_kind);
                    (price, price, price)
                }
            };
            self.states
                .entry(item.asset().clone())
                .or_default()
                .update(high, low, close, self.period);
        }
    }

    fn size_for(&self, account: &Account, price: f64, atr: f64) -> Option<Size> {
        let equity = account.equity_wallet().balance(&account.base_currency).max(0.0);
        let equity = if equity > 0.0 { equity } else { account.buying_power.value };
        let notional = equity * self.order_percentage;
        let mut quantity = notional / price;

        if let Some(atr_sizing) = self.atr_sizing {
            let risk_per_unit = atr * self.stop_multiple;
            if risk_per_unit > 0.0 {
                let max_quantity = (equity * atr_sizing) / risk_per_unit;
                quantity = quantity.min(max_quantity);
            }
        }

        let size = Size::from_f64(quantity);
        (!size.is_zero()).then_some(size)
    }
}

impl SignalConverter for AtrSignalConverter {
    fn convert(&mut self, signals: Vec<Signal>, account: &Account, event: &Event) -> Vec<Instruction> {
        self.observe(event);
        let mut instructions = Vec::new();

        for signal in signals {
            if signal.signal_type == SignalType::Exit {
                if let Some(position) = account.position_of(&signal.asset).filter(|p| !p.is_closed()) {
                    instructions.push(Instruction::Single(SingleOrder::market(
                        signal.asset.clone(),
                        -position.size,
                    )));
                }
                continue;
            }

            let is_flat = account
                .position_of(&signal.asset)
                .map(|p| p.is_closed())
                .unwrap_or(true);
            if !is_flat {
                continue;
            }

            let Some(price) = event.price_of(&signal.asset, self.price_kind) else {
                continue;
            };
            let Some(state) = self.states.get(&signal.asset) else {
                continue;
            };
            if !state.is_ready(self.period) {
                continue;
            }
            let Some(atr) = state.atr else { continue };
            if atr <= 0.0 {
                continue;
            }

            let Some(size) = self.size_for(account, price, atr) else {
                continue;
            };
            let signed = if signal.rating < 0.0 { -size } else { size };
            let exit_size = -signed;

            let (stop_loss, take_profit) = if signed.is_long() {
                (price - atr * self.stop_multiple, price + atr * self.profit_multiple)
            } else {
                (price + atr * self.stop_multiple, price - atr * self.profit_multiple)
            };

            instructions.push(Instruction::Bracket {
                entry: SingleOrder::market(signal.asset.clone(), signed),
                take_profit: SingleOrder::limit(signal.asset.clone(), exit_size, take_profit),
                stop_loss: SingleOrder::stop(signal.asset, exit_size, stop_loss),
            });
        }

        instructions
    }
}
