//! Mutable broker-owned portfolio state ([`internal::InternalAccount`]), the immutable snapshot
//! handed to strategies/converters/metrics ([`Account`]), and the pluggable buying-power rule
//! ([`model`]) (spec §3 "Account", §4.5, §4.8).

pub mod error;
pub mod internal;
pub mod model;
pub mod position;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::error::AccountError;
use crate::account::position::Position;
use crate::fx::FxRegistry;
use crate::model::amount::Amount;
use crate::model::currency::Currency;
use crate::model::wallet::Wallet;
use crate::order::{Order, Trade};

/// An immutable, deep-copied snapshot of an account's state at a point in time (spec §3
/// "Account"). Cheap enough to produce every [`crate::execution::broker::SimBroker::sync`] call
/// and safe to share freely with read-only consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub base_currency: Currency,
    pub last_update: DateTime<Utc>,
    pub cash: Wallet,
    pub trades: Vec<Trade>,
    pub open_orders: Vec<Order>,
    pub closed_orders: Vec<Order>,
    pub positions: Vec<Position>,
    pub buying_power: Amount,
}

impl Account {
    /// Cash plus the market value of every open position, grouped by each instrument's own
    /// currency (not yet converted to `base_currency`).
    pub fn equity_wallet(&self) -> Wallet {
        let mut wallet = self.cash.clone();
        for position in &self.positions {
            wallet.deposit(position.asset.currency.clone(), position.market_value());
        }
        wallet
    }

    /// `equity` converted into `base_currency` at `last_update` (spec §3 "Account": `equityAmount`).
    pub fn equity_amount(&self, fx: &FxRegistry) -> Result<Amount, AccountError> {
        Ok(self
            .equity_wallet()
            .convert(&self.base_currency, self.last_update, fx)?)
    }

    pub fn position_of(&self, asset: &crate::model::asset::Asset) -> Option<&Position> {
        self.positions.iter().find(|p| &p.asset == asset)
    }

    pub fn open_order(&self, id: crate::order::OrderId) -> Option<&Order> {
        self.open_orders.iter().find(|o| o.id == id)
    }
}
