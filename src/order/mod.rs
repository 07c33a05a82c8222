//! [`Instruction`]s submitted to a broker and the lifecycle of the [`Order`] they create
//! (spec §3 "Order", §4.6 "Order Executors").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::asset::Asset;
use crate::model::size::Size;

/// Unique identifier assigned by the broker on acceptance (spec §3: "Orders are identified by an
/// id assigned by the broker on acceptance").
pub type OrderId = u64;

/// Policy controlling how long an order remains active (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good 'til cancelled (default) — no expiry.
    Gtc,
    /// Auto-cancel at the close of the asset's exchange on the next day boundary.
    Day,
    /// Cancel any residual quantity after the first execution step.
    Ioc,
    /// Fill the entire quantity on this step or cancel.
    Fok,
    /// Cancel at or after the given date.
    Gtd(DateTime<Utc>),
}

impl Default for TimeInForce {
    fn default() -> Self {
        TimeInForce::Gtc
    }
}

/// The single-leg order variants (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Limit { limit: f64 },
    Stop { stop: f64 },
    StopLimit { stop: f64, limit: f64 },
    Trail { percent: f64 },
}

/// A single-leg order description, the common payload of an [`Instruction::Single`],
/// [`Instruction::Bracket`] leg, or an [`Instruction::Update`] replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleOrder {
    pub asset: Asset,
    pub size: Size,
    pub kind: OrderKind,
    pub tif: TimeInForce,
    pub tag: Option<String>,
}

impl SingleOrder {
    pub fn new(asset: Asset, size: Size, kind: OrderKind) -> Self {
        Self {
            asset,
            size,
            kind,
            tif: TimeInForce::default(),
            tag: None,
        }
    }

    pub fn market(asset: Asset, size: Size) -> Self {
        Self::new(asset, size, OrderKind::Market)
    }

    pub fn limit(asset: Asset, size: Size, limit: f64) -> Self {
        Self::new(asset, size, OrderKind::Limit { limit })
    }

    pub fn stop(asset: Asset, size: Size, stop: f64) -> Self {
        Self::new(asset, size, OrderKind::Stop { stop })
    }

    pub fn with_tif(mut self, tif: TimeInForce) -> Self {
        self.tif = tif;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// A concrete command sent from a converter to the broker (spec §3 "Order"/Glossary
/// "Instruction"): a single order, a bracket (entry + OCO take-profit/stop-loss), or a
/// modification of an existing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    Single(SingleOrder),
    Bracket {
        entry: SingleOrder,
        take_profit: SingleOrder,
        stop_loss: SingleOrder,
    },
    Cancel { target: OrderId },
    Update { target: OrderId, replacement: SingleOrder },
}

/// The order status state machine (spec §3): `Initial -> Accepted -> {Completed, Cancelled,
/// Expired, Rejected}`. The last four are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Initial,
    Accepted,
    Completed,
    Cancelled,
    Expired,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed
                | OrderStatus::Cancelled
                | OrderStatus::Expired
                | OrderStatus::Rejected
        )
    }

    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Initial | OrderStatus::Accepted)
    }
}

/// Marks which leg of a bracket an [`Order`] represents, if any, and how it relates to its
/// sibling for one-cancels-other semantics (spec §4.6 "Bracket").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BracketRole {
    /// Carries the ids of the two OCO children, armed only once this entry completes.
    Entry { take_profit: OrderId, stop_loss: OrderId },
    /// Carries the sibling's id: filling one cancels the other.
    TakeProfit { sibling: OrderId },
    StopLoss { sibling: OrderId },
}

/// A broker-tracked order: the immutable description plus its mutable lifecycle fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub asset: Asset,
    pub size: Size,
    pub kind: OrderKind,
    pub tif: TimeInForce,
    pub tag: Option<String>,
    pub status: OrderStatus,
    pub accepted_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Cumulative signed quantity filled so far; magnitude never exceeds `size`'s.
    pub filled_size: Size,
    pub bracket_role: Option<BracketRole>,
    /// Armed only once its bracket entry has completed; OCO children are otherwise inert. Also
    /// used by `Trail` orders to track whether the trailing extremum has started recording, and
    /// by `StopLimit` orders to track whether the stop has triggered.
    pub armed: bool,
    /// Running extremum (highest price seen for a sell trail, lowest for a buy trail) since
    /// arming; `None` until armed.
    pub trail_extremum: Option<f64>,
}

impl Order {
    pub fn residual(&self) -> Size {
        self.size + (-self.filled_size)
    }

    pub fn is_bracket_child(&self) -> bool {
        matches!(
            self.bracket_role,
            Some(BracketRole::TakeProfit { .. }) | Some(BracketRole::StopLoss { .. })
        )
    }
}

/// An immutable fill record (spec §3 "Trade").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub time: DateTime<Utc>,
    pub order_id: OrderId,
    pub asset: Asset,
    pub size: Size,
    pub price: f64,
    pub fee: f64,
    pub pnl: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_iff_initial_or_accepted() {
        assert!(OrderStatus::Initial.is_open());
        assert!(OrderStatus::Accepted.is_open());
        assert!(!OrderStatus::Completed.is_open());
        assert!(!OrderStatus::Rejected.is_open());
    }

    #[test]
    fn terminal_set_matches_spec() {
        for status in [
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Expired,
            OrderStatus::Rejected,
        ] {
            assert!(status.is_terminal());
        }
        assert!(!OrderStatus::Initial.is_terminal());
    }
}
