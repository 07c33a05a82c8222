use thiserror::Error;

use crate::fx::FxError;
use crate::order::OrderId;

/// All errors generated in the `account` module.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountError {
    #[error("unknown order id {0}")]
    UnknownOrder(OrderId),

    #[error("order {0} is not open and cannot be accepted/rejected/cancelled")]
    OrderNotOpen(OrderId),

    #[error("order {0} is not accepted and cannot receive fills")]
    OrderNotAccepted(OrderId),

    #[error("duplicate order id {0}")]
    DuplicateOrderId(OrderId),

    #[error("fx conversion failed: {0}")]
    Fx(#[from] FxError),
}
