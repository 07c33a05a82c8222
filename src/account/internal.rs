//! Mutable portfolio state owned by exactly one broker (spec §4.5 "Internal account").

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::account::error::AccountError;
use crate::account::position::Position;
use crate::account::Account;
use crate::event::{Event, PriceKind};
use crate::model::amount::Amount;
use crate::model::asset::Asset;
use crate::model::currency::Currency;
use crate::model::wallet::Wallet;
use crate::order::{Order, OrderId, OrderStatus, Trade};

/// Broker-private, mutable account state: cash, positions, open/closed orders and trades.
/// `InternalAccount` never stores a position with size 0 (spec §4.5 invariant).
#[derive(Debug, Clone)]
pub struct InternalAccount {
    pub base_currency: Currency,
    pub last_update: DateTime<Utc>,
    pub cash: Wallet,
    pub positions: IndexMap<Asset, Position>,
    pub open_orders: IndexMap<OrderId, Order>,
    pub closed_orders: Vec<Order>,
    pub trades: Vec<Trade>,
    pub buying_power: Amount,
    next_order_id: OrderId,
}

impl InternalAccount {
    pub fn new(base_currency: Currency, initial_deposit: Wallet, time: DateTime<Utc>) -> Self {
        Self {
            buying_power: Amount::zero(base_currency.clone()),
            base_currency,
            last_update: time,
            cash: initial_deposit,
            positions: IndexMap::new(),
            open_orders: IndexMap::new(),
            closed_orders: Vec::new(),
            trades: Vec::new(),
            next_order_id: 1,
        }
    }

    /// Assigns a fresh id for a newly placed order.
    pub fn next_order_id(&mut self) -> OrderId {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }

    pub fn insert_order(&mut self, order: Order) {
        self.open_orders.insert(order.id, order);
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.open_orders
            .get(&id)
            .or_else(|| self.closed_orders.iter().find(|o| o.id == id))
    }

    pub fn order_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.open_orders.get_mut(&id)
    }

    pub fn accept_order(&mut self, id: OrderId, time: DateTime<Utc>) -> Result<(), AccountError> {
        let order = self
            .open_orders
            .get_mut(&id)
            .ok_or(AccountError::UnknownOrder(id))?;
        if order.status != OrderStatus::Initial {
            return Err(AccountError::OrderNotOpen(id));
        }
        order.status = OrderStatus::Accepted;
        order.accepted_at = Some(time);
        Ok(())
    }

    pub fn reject_order(&mut self, id: OrderId, time: DateTime<Utc>) -> Result<(), AccountError> {
        self.update_order_status(id, OrderStatus::Rejected, time)
    }

    /// Transitions an order's status. Terminal statuses move the order from `open_orders` into
    /// `closed_orders` with `closed_at` set (spec §4.5).
    pub fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        time: DateTime<Utc>,
    ) -> Result<(), AccountError> {
        let order = self
            .open_orders
            .get_mut(&id)
            .ok_or(AccountError::UnknownOrder(id))?;
        order.status = status;
        if status.is_terminal() {
            order.closed_at = Some(time);
            let order = self.open_orders.shift_remove(&id).expect("just looked up");
            self.closed_orders.push(order);
        }
        Ok(())
    }

    /// Writes or removes a position. Never stores a position with size 0 (spec §4.5).
    pub fn set_position(&mut self, position: Position) {
        if position.is_closed() {
            self.positions.shift_remove(&position.asset);
        } else {
            self.positions.insert(position.asset.clone(), position);
        }
    }

    pub fn position(&self, asset: &Asset) -> Option<&Position> {
        self.positions.get(asset)
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    /// Updates the market price of every open position that has a price in `event` (spec §4.5).
    pub fn update_market_prices(&mut self, event: &Event, price_kind: PriceKind) {
        let prices = event.prices();
        for position in self.positions.values_mut() {
            if let Some(item) = prices.get(&position.asset) {
                position.update_market_price(item.get_price(price_kind), event.time);
            }
        }
        self.last_update = event.time;
    }

    /// Deep-copies a read-only [`Account`] snapshot.
    pub fn to_account(&self) -> Account {
        Account {
            base_currency: self.base_currency.clone(),
            last_update: self.last_update,
            cash: self.cash.clone(),
            trades: self.trades.clone(),
            open_orders: self.open_orders.values().cloned().collect(),
            closed_orders: self.closed_orders.clone(),
            positions: self.positions.values().cloned().collect(),
            buying_power: self.buying_power.clone(),
        }
    }
}
