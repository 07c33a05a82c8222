//! The simulated broker: owns an [`InternalAccount`], turns [`Instruction`]s into tracked
//! [`Order`]s, and advances every open order's executor on each [`Event`] (spec §4.9 "Broker").

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::account::error::AccountError;
use crate::account::internal::InternalAccount;
use crate::account::model::AccountModel;
use crate::account::position::Position;
use crate::account::Account;
use crate::event::{Event, PriceItem, PriceKind};
use crate::execution::error::ExecutionError;
use crate::execution::executors::execute_step;
use crate::execution::fees::FeeModel;
use crate::execution::pricing::PricingEngine;
use crate::fx::FxRegistry;
use crate::model::currency::Currency;
use crate::model::size::Size;
use crate::model::wallet::Wallet;
use crate::order::{BracketRole, Instruction, Order, OrderId, OrderKind, OrderStatus, SingleOrder, TimeInForce, Trade};

/// A deterministic, in-process broker suitable for backtests and paper trading (spec §4.9).
/// Applies queued [`Instruction::Update`]/[`Instruction::Cancel`] modifications before running
/// every open order's executor for the step, in ascending `(accepted_at, id)` order.
#[derive(Debug)]
pub struct SimBroker {
    internal: InternalAccount,
    pricing: Arc<dyn PricingEngine>,
    fees: Arc<dyn FeeModel>,
    account_model: Arc<dyn AccountModel>,
    fx: FxRegistry,
    price_kind: PriceKind,
    pending: Vec<Instruction>,
    last_event: Option<Event>,
}

impl SimBroker {
    pub fn new(
        base_currency: Currency,
        initial_deposit: Wallet,
        account_model: Arc<dyn AccountModel>,
        pricing: Arc<dyn PricingEngine>,
        fees: Arc<dyn FeeModel>,
        fx: FxRegistry,
        time: DateTime<Utc>,
    ) -> Self {
        let mut internal = InternalAccount::new(base_currency, initial_deposit, time);
        account_model.update_account(&mut internal);
        Self {
            internal,
            pricing,
            fees,
            account_model,
            fx,
            price_kind: PriceKind::Default,
            pending: Vec::new(),
            last_event: None,
        }
    }

    pub fn with_price_kind(mut self, kind: PriceKind) -> Self {
        self.price_kind = kind;
        self
    }

    pub fn account(&self) -> Account {
        self.internal.to_account()
    }

    /// Validates and queues `instructions`. Single orders and brackets are assigned ids and
    /// accepted/rejected immediately; Update/Cancel instructions are deferred to the next
    /// [`SimBroker::sync`] call, applied before that step's executors run (spec §4.9 step order).
    pub fn place(&mut self, instructions: Vec<Instruction>) {
        for instruction in instructions {
            match instruction {
                Instruction::Single(order) => {
                    self.place_single(order, None);
                }
                Instruction::Bracket {
                    entry,
                    take_profit,
                    stop_loss,
                } => self.place_bracket(entry, take_profit, stop_loss),
                cancel @ Instruction::Cancel { .. } => self.pending.push(cancel),
                update @ Instruction::Update { .. } => self.pending.push(update),
            }
        }
    }

    fn place_single(&mut self, single: SingleOrder, bracket_role: Option<BracketRole>) -> OrderId {
        let id = self.internal.next_order_id();
        let armed = bracket_role
            .as_ref()
            .map(|role| matches!(role, BracketRole::Entry { .. }))
            .unwrap_or(true);
        let order = Order {
            id,
            asset: single.asset,
            size: single.size,
            kind: single.kind,
            tif: single.tif,
            tag: single.tag,
            status: OrderStatus::Initial,
            accepted_at: None,
            closed_at: None,
            filled_size: Size::ZERO,
            bracket_role,
            armed,
            trail_extremum: None,
        };
        self.internal.insert_order(order);

        let time = self.internal.last_update;
        match self.validate(id) {
            Ok(()) => {
                self.internal
                    .accept_order(id, time)
                    .expect("order was just inserted");
            }
            Err(reason) => {
                tracing::warn!(order_id = id, %reason, "order rejected at placement");
                self.internal
                    .accept_order(id, time)
                    .expect("order was just inserted");
                let _ = self.internal.update_order_status(id, OrderStatus::Rejected, time);
            }
        }
        id
    }

    fn place_bracket(&mut self, entry: SingleOrder, take_profit: SingleOrder, stop_loss: SingleOrder) {
        let entry_id = self.internal.next_order_id();
        let tp_id = self.internal.next_order_id();
        let sl_id = self.internal.next_order_id();

        self.place_leg(entry_id, entry, BracketRole::Entry { take_profit: tp_id, stop_loss: sl_id });
        self.place_leg(tp_id, take_profit, BracketRole::TakeProfit { sibling: sl_id });
        self.place_leg(sl_id, stop_loss, BracketRole::StopLoss { sibling: tp_id });

        // If the entry was rejected (eg/ insufficient buying power or disallowed short), its
        // children have nothing left to wait on.
        if self
            .internal
            .order(entry_id)
            .map(|o| o.status == OrderStatus::Rejected)
            .unwrap_or(false)
        {
            let time = self.internal.last_update;
            let _ = self.internal.update_order_status(tp_id, OrderStatus::Cancelled, time);
            let _ = self.internal.update_order_status(sl_id, OrderStatus::Cancelled, time);
        }
    }

    fn place_leg(&mut self, id: OrderId, single: SingleOrder, role: BracketRole) {
        let armed = matches!(role, BracketRole::Entry { .. });
        let order = Order {
            id,
            asset: single.asset,
            size: single.size,
            kind: single.kind,
            tif: single.tif,
            tag: single.tag,
            status: OrderStatus::Initial,
            accepted_at: None,
            closed_at: None,
            filled_size: Size::ZERO,
            bracket_role: Some(role),
            armed,
            trail_extremum: None,
        };
        self.internal.insert_order(order);
        let time = self.internal.last_update;
        let validation = self.validate(id);
        self.internal.accept_order(id, time).expect("order was just inserted");
        if let Err(reason) = validation {
            tracing::warn!(order_id = id, %reason, "bracket leg rejected at placement");
            let _ = self.internal.update_order_status(id, OrderStatus::Rejected, time);
        }
    }

    /// Rejects orders this broker cannot accept: shorting when the account model forbids it, or
    /// notional exceeding current buying power (estimated from the last observed price, if any).
    fn validate(&self, id: OrderId) -> Result<(), ExecutionError> {
        let order = self
            .internal
            .order(id)
            .ok_or(ExecutionError::Account(AccountError::UnknownOrder(id)))?;

        // Bracket children are OCO exits that only arm once the entry fills and reduce that
        // position back toward flat; they never open a new short in their own right.
        if order.is_bracket_child() {
            return Ok(());
        }

        if !self.account_model.allows_short() {
            let current = self.internal.position(&order.asset).map(|p| p.size).unwrap_or(Size::ZERO);
            let projected = current + order.size;
            if projected.is_short() {
                return Err(ExecutionError::UnsupportedOrderType);
            }
        }

        if let Some(price) = self.estimate_price(order) {
            let notional = order.size.abs().as_f64() * price;
            let time = self.last_event.as_ref().map(|event| event.time).unwrap_or(self.internal.last_update);
            let notional_in_base = self
                .fx
                .convert(notional, &order.asset.currency, &self.internal.base_currency, time)
                .map_err(ExecutionError::from)?;
            if notional_in_base > self.internal.buying_power.value {
                return Err(ExecutionError::InsufficientBuyingPower(order.asset.symbol.clone()));
            }
        }
        Ok(())
    }

    fn estimate_price(&self, order: &Order) -> Option<f64> {
        match order.kind {
            OrderKind::Limit { limit } => Some(limit),
            OrderKind::Stop { stop } => Some(stop),
            OrderKind::StopLimit { limit, .. } => Some(limit),
            OrderKind::Market | OrderKind::Trail { .. } => self
                .last_event
                .as_ref()
                .and_then(|event| event.price_of(&order.asset, self.price_kind)),
        }
    }

    /// Advances the broker by one market event: applies queued modifications, runs every armed
    /// open order's executor, updates positions/cash/buying power, and returns a snapshot
    /// (spec §4.9's sync sequence).
    pub fn sync(&mut self, event: &Event) -> Account {
        self.internal.update_market_prices(event, self.price_kind);
        self.last_event = Some(event.clone());

        self.apply_pending_modifications();
        self.run_executors(event);

        self.account_model.update_account(&mut self.internal);
        self.internal.to_account()
    }

    fn apply_pending_modifications(&mut self) {
        let time = self.internal.last_update;
        let pending = std::mem::take(&mut self.pending);
        for instruction in pending {
            match instruction {
                Instruction::Cancel { target } => {
                    if self.internal.order(target).map(|o| o.status.is_open()).unwrap_or(false) {
                        let _ = self.internal.update_order_status(target, OrderStatus::Cancelled, time);
                        self.cascade_bracket_cancel(target, time);
                    } else {
                        tracing::warn!(order_id = target, "cancel rejected: order not open");
                    }
                }
                Instruction::Update { target, replacement } => {
                    let replaceable = self
                        .internal
                        .order(target)
                        .map(|o| o.status.is_open() && o.asset == replacement.asset)
                        .unwrap_or(false);
                    if replaceable {
                        if let Some(order) = self.internal.order_mut(target) {
                            order.size = replacement.size;
                            order.kind = replacement.kind;
                            order.tif = replacement.tif;
                            order.tag = replacement.tag;
                            order.trail_extremum = None;
                            // Re-triggerable kinds must re-evaluate their arm condition against
                            // the new stop/percent; other kinds (and already-armed bracket
                            // children) keep their current armed state.
                            if matches!(order.kind, OrderKind::StopLimit { .. } | OrderKind::Trail { .. }) {
                                order.armed = false;
                            }
                        }
                    } else {
                        tracing::warn!(order_id = target, "update rejected: not open, or asset mismatch");
                    }
                }
                _ => unreachable!("only Cancel/Update instructions are ever queued"),
            }
        }
    }

    fn cascade_bracket_cancel(&mut self, id: OrderId, time: DateTime<Utc>) {
        let role = self.internal.order(id).and_then(|o| o.bracket_role);
        match role {
            Some(BracketRole::Entry { take_profit, stop_loss }) => {
                for sibling in [take_profit, stop_loss] {
                    if self.internal.order(sibling).map(|o| o.status.is_open()).unwrap_or(false) {
                        let _ = self.internal.update_order_status(sibling, OrderStatus::Cancelled, time);
                    }
                }
            }
            Some(BracketRole::TakeProfit { sibling }) | Some(BracketRole::StopLoss { sibling }) => {
                if self.internal.order(sibling).map(|o| o.status.is_open()).unwrap_or(false) {
                    let _ = self.internal.update_order_status(sibling, OrderStatus::Cancelled, time);
                }
            }
            None => {}
        }
    }

    fn run_executors(&mut self, event: &Event) {
        let prices = event.prices();
        let time = event.time;

        let mut ids: Vec<OrderId> = self
            .internal
            .open_orders
            .values()
            .filter(|o| o.armed)
            .map(|o| o.id)
            .collect();
        ids.sort_by_key(|id| {
            let order = self.internal.order(*id).expect("id came from open_orders");
            (order.accepted_at, *id)
        });

        for id in ids {
            self.run_one(id, &prices, time);
        }
    }

    fn run_one(
        &mut self,
        id: OrderId,
        prices: &std::collections::HashMap<&crate::model::asset::Asset, &PriceItem>,
        time: DateTime<Utc>,
    ) {
        let Some(order) = self.internal.order(id).cloned() else { return };
        if self.expire_if_due(&order, time) {
            return;
        }

        let item = prices.get(&order.asset).copied();
        let Some(item) = item else { return };

        let tif = order.tif;
        if tif == TimeInForce::Fok {
            self.run_fok_step(id, item, time);
            return;
        }

        let fills = {
            let order = self.internal.order_mut(id).expect("checked above");
            execute_step(order, self.pricing.as_ref(), Some(item), time)
        };
        self.settle_fills(id, &fills, time);

        if tif == TimeInForce::Ioc {
            if self.internal.order(id).map(|o| o.status.is_open()).unwrap_or(false) {
                let _ = self.internal.update_order_status(id, OrderStatus::Cancelled, time);
                self.cascade_bracket_cancel(id, time);
            }
        }
    }

    /// `Fok` only gets one chance to fill in full; if this step can't fill the whole residual,
    /// cancel rather than partially executing.
    fn run_fok_step(&mut self, id: OrderId, item: &PriceItem, time: DateTime<Utc>) {
        let residual = self.internal.order(id).expect("checked by caller").residual();
        let fully_fillable = self.pricing.fillable_size(item, residual).abs() >= residual.abs();

        if fully_fillable {
            let fills = {
                let order = self.internal.order_mut(id).expect("checked above");
                execute_step(order, self.pricing.as_ref(), Some(item), time)
            };
            self.settle_fills(id, &fills, time);
        }

        if self.internal.order(id).map(|o| o.status.is_open()).unwrap_or(false) {
            let _ = self.internal.update_order_status(id, OrderStatus::Cancelled, time);
            self.cascade_bracket_cancel(id, time);
        }
    }

    fn expire_if_due(&mut self, order: &Order, time: DateTime<Utc>) -> bool {
        let expired = match order.tif {
            TimeInForce::Gtd(deadline) => time >= deadline,
            TimeInForce::Day => order
                .accepted_at
                .map(|accepted| accepted.date_naive() != time.date_naive())
                .unwrap_or(false),
            _ => false,
        };
        if expired {
            let id = order.id;
            let _ = self.internal.update_order_status(id, OrderStatus::Expired, time);
            self.cascade_bracket_cancel(id, time);
        }
        expired
    }

    fn settle_fills(&mut self, id: OrderId, fills: &[(Size, f64)], time: DateTime<Utc>) {
        for &(size, price) in fills {
            let asset = self.internal.order(id).expect("order exists while filling").asset.clone();
            let fee = self.fees.fee(&asset, size, price);

            let position = self
                .internal
                .position(&asset)
                .cloned()
                .unwrap_or_else(|| Position::new(asset.clone(), Size::ZERO, price, time));
            let (updated, pnl) = position.apply_fill(size, price, time);
            self.internal.set_position(updated);

            let notional = size.as_f64() * price;
            self.internal.cash.withdraw(asset.currency.clone(), notional + fee.value);

            self.internal.record_trade(Trade {
                time,
                order_id: id,
                asset: asset.clone(),
                size,
                price,
                fee: fee.value,
                pnl,
            });
        }

        let completed = self.internal.order(id).map(|o| o.status == OrderStatus::Completed).unwrap_or(false);
        if completed {
            self.on_order_completed(id, time);
        }
    }

    fn on_order_completed(&mut self, id: OrderId, time: DateTime<Utc>) {
        let role = self.internal.order(id).and_then(|o| o.bracket_role);
        match role {
            Some(BracketRole::Entry { take_profit, stop_loss }) => {
                for child in [take_profit, stop_loss] {
                    if let Some(order) = self.internal.order_mut(child) {
                        order.armed = true;
                    }
                }
            }
            Some(BracketRole::TakeProfit { sibling }) | Some(BracketRole::StopLoss { sibling }) => {
                if self.internal.order(sibling).map(|o| o.status.is_open()).unwrap_or(false) {
                    let _ = self.internal.update_order_status(sibling, OrderStatus::Cancelled, time);
                }
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::model::CashAccount;
    use crate::event::PriceBarData;
    use crate::execution::fees::NoFee;
    use crate::execution::pricing::NoCostPricing;
    use crate::fx::{FxRegistry, StaticFxTable};
    use crate::model::asset::Asset;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn broker(time: DateTime<Utc>) -> SimBroker {
        let fx = FxRegistry::new(Arc::new(StaticFxTable::new()));
        SimBroker::new(
            Currency::usd(),
            Wallet::single(Currency::usd(), 100_000.0),
            Arc::new(CashAccount::new(fx.clone())),
            Arc::new(NoCostPricing),
            Arc::new(NoFee),
            fx,
            time,
        )
    }

    fn bar_event(asset: Asset, close: f64, time: DateTime<Utc>) -> Event {
        Event::new(
            time,
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
    fn market_order_fills_and_updates_cash_and_position() {
        let now = Utc::now();
        let mut broker = broker(now);
        let asset = Asset::stock("TEST");

        broker.place(vec![Instruction::Single(SingleOrder::market(asset.clone(), Size::new(dec!(10))))]);
        let account = broker.sync(&bar_event(asset.clone(), 100.0, now));

        assert_eq!(account.position_of(&asset).unwrap().size, Size::new(dec!(10)));
        assert_eq!(account.cash.balance(&Currency::usd()), 100_000.0 - 1_000.0);
    }

    #[test]
    fn cash_account_rejects_short_entry() {
        let now = Utc::now();
        let mut broker = broker(now);
        let asset = Asset::stock("TEST");

        broker.place(vec![Instruction::Single(SingleOrder::market(asset.clone(), Size::new(dec!(-10))))]);
        let account = broker.sync(&bar_event(asset.clone(), 100.0, now));

        assert!(account.position_of(&asset).is_none());
        let rejected = account.closed_orders.iter().find(|o| o.asset == asset).unwrap();
        assert_eq!(rejected.status, OrderStatus::Rejected);
    }

    #[test]
    fn bracket_take_profit_cancels_stop_loss() {
        let now = Utc::now();
        let mut broker = broker(now);
        let asset = Asset::stock("TEST");

        broker.place(vec![Instruction::Bracket {
            entry: SingleOrder::market(asset.clone(), Size::new(dec!(10))),
            take_profit: SingleOrder::limit(asset.clone(), Size::new(dec!(-10)), 110.0),
            stop_loss: SingleOrder::stop(asset.clone(), Size::new(dec!(-10)), 90.0),
        }]);

        broker.sync(&bar_event(asset.clone(), 100.0, now));
        let account = broker.sync(&bar_event(asset.clone(), 115.0, now + Duration::minutes(1)));

        assert!(account.position_of(&asset).is_none());
        let stop_leg = account
            .closed_orders
            .iter()
            .find(|o| matches!(o.bracket_role, Some(BracketRole::StopLoss { .. })))
            .unwrap();
        assert_eq!(stop_leg.status, OrderStatus::Cancelled);
    }

    #[test]
    fn cancel_instruction_closes_open_order() {
        let now = Utc::now();
        let mut broker = broker(now);
        let asset = Asset::stock("TEST");

        broker.place(vec![Instruction::Single(SingleOrder::limit(asset.clone(), Size::new(dec!(10)), 50.0))]);
        broker.place(vec![Instruction::Cancel { target: 1 }]);
        let account = broker.sync(&bar_event(asset.clone(), 100.0, now));

        let cancelled = account.closed_orders.iter().find(|o| o.id == 1).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[test]
    fn ioc_cancels_residual_after_one_step() {
        let now = Utc::now();
        let mut broker = broker(now);
        let asset = Asset::stock("TEST");

        broker.place(vec![Instruction::Single(
            SingleOrder::limit(asset.clone(), Size::new(dec!(10)), 50.0).with_tif(TimeInForce::Ioc),
        )]);
        // limit never triggers at this price, so IOC should cancel it on the very first step.
        let account = broker.sync(&bar_event(asset.clone(), 100.0, now));

        let order = account.closed_orders.iter().find(|o| o.id == 1).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }
}
