//! Per-order-type execution rules turning a triggered order into fills against one step's market
//! data (spec §4.6 "Order Executors"). Each function mutates the order's `status`/`filled_size`
//! in place and returns the `(size, price)` pairs to record as trades this step.

use chrono::{DateTime, Utc};

use crate::event::{PriceItem, PriceKind};
use crate::execution::pricing::PricingEngine;
use crate::model::size::Size;
use crate::order::{Order, OrderKind, OrderStatus};

/// Runs one step of `order`'s executor against `item` (absent if the asset didn't trade this
/// event), producing zero or more `(size, price)` fills. Leaves `order.status`/`filled_size`
/// updated to reflect any fill. TIF enforcement (IOC/FOK/DAY/GTD) is applied by the broker after
/// calling this, since it needs broker-wide step context.
pub fn execute_step(
    order: &mut Order,
    pricing: &dyn PricingEngine,
    item: Option<&PriceItem>,
    time: DateTime<Utc>,
) -> Vec<(Size, f64)> {
    let Some(item) = item else {
        return Vec::new();
    };

    match order.kind {
        OrderKind::Market => execute_market(order, pricing, item),
        OrderKind::Limit { limit } => execute_limit(order, pricing, item, limit),
        OrderKind::Stop { stop } => execute_stop(order, pricing, item, stop),
        OrderKind::StopLimit { stop, limit } => execute_stop_limit(order, pricing, item, stop, limit),
        OrderKind::Trail { percent } => execute_trail(order, pricing, item, percent, time),
    }
}

fn apply_fill(order: &mut Order, fill_size: Size, fill_price: f64) -> Vec<(Size, f64)> {
    order.filled_size = order.filled_size + fill_size;
    if order.residual().is_zero() {
        order.status = OrderStatus::Completed;
    }
    vec![(fill_size, fill_price)]
}

fn signed_fill(order: &Order, pricing: &dyn PricingEngine, item: &PriceItem) -> Size {
    let residual = order.residual();
    pricing.fillable_size(item, residual)
}

fn execute_market(order: &mut Order, pricing: &dyn PricingEngine, item: &PriceItem) -> Vec<(Size, f64)> {
    let fill_size = signed_fill(order, pricing, item);
    if fill_size.is_zero() {
        return Vec::new();
    }
    let price = pricing.market_price(item, fill_size);
    apply_fill(order, fill_size, price)
}

fn execute_limit(
    order: &mut Order,
    pricing: &dyn PricingEngine,
    item: &PriceItem,
    limit: f64,
) -> Vec<(Size, f64)> {
    let triggered = if order.residual().is_long() {
        item.get_price(PriceKind::Low) <= limit
    } else {
        item.get_price(PriceKind::High) >= limit
    };
    if !triggered {
        return Vec::new();
    }
    let fill_size = signed_fill(order, pricing, item);
    if fill_size.is_zero() {
        return Vec::new();
    }
    let price = pricing.limit_fill_price(limit, item, fill_size);
    apply_fill(order, fill_size, price)
}

fn execute_stop(
    order: &mut Order,
    pricing: &dyn PricingEngine,
    item: &PriceItem,
    stop: f64,
) -> Vec<(Size, f64)> {
    let triggered = if order.residual().is_long() {
        item.get_price(PriceKind::High) >= stop
    } else {
        item.get_price(PriceKind::Low) <= stop
    };
    if !triggered {
        return Vec::new();
    }
    let fill_size = signed_fill(order, pricing, item);
    if fill_size.is_zero() {
        return Vec::new();
    }
    let price = pricing.stop_fill_price(stop, item, fill_size);
    apply_fill(order, fill_size, price)
}

fn execute_stop_limit(
    order: &mut Order,
    pricing: &dyn PricingEngine,
    item: &PriceItem,
    stop: f64,
    limit: f64,
) -> Vec<(Size, f64)> {
    if !order.armed {
        let stop_triggered = if order.residual().is_long() {
            item.get_price(PriceKind::High) >= stop
        } else {
            item.get_price(PriceKind::Low) <= stop
        };
        if stop_triggered {
            order.armed = true;
        } else {
            return Vec::new();
        }
    }
    execute_limit(order, pricing, item, limit)
}

/// A sell trail tracks the highest price seen since arming and triggers when price falls below
/// `highest * (1 - pct)`; a buy trail mirrors this on the low side. Once triggered, the order
/// completes as a market order (spec §4.6).
fn execute_trail(
    order: &mut Order,
    pricing: &dyn PricingEngine,
    item: &PriceItem,
    percent: f64,
    _time: DateTime<Utc>,
) -> Vec<(Size, f64)> {
    let is_sell = order.residual().is_short();
    let reference = if is_sell {
        item.get_price(PriceKind::High)
    } else {
        item.get_price(PriceKind::Low)
    };

    let extremum = match order.trail_extremum {
        None => {
            order.armed = true;
            order.trail_extremum = Some(reference);
            reference
        }
        Some(previous) => {
            let updated = if is_sell {
                previous.max(reference)
            } else {
                previous.min(reference)
            };
            order.trail_extremum = Some(updated);
            updated
        }
    };

    let triggered = if is_sell {
        item.get_price(PriceKind::Low) <= extremum * (1.0 - percent)
    } else {
        item.get_price(PriceKind::High) >= extremum * (1.0 + percent)
    };
    if !triggered {
        return Vec::new();
    }

    execute_market(order, pricing, item)
}
