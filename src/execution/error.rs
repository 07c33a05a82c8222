use thiserror::Error;

use crate::order::OrderId;

/// All errors generated in the `execution` module.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("unknown asset {0}")]
    UnknownAsset(String),

    #[error("unsupported order type for this broker")]
    UnsupportedOrderType,

    #[error("insufficient buying power for order on {0}")]
    InsufficientBuyingPower(String),

    #[error("fractional size not allowed for this asset/order type")]
    FractionalSizeNotAllowed,

    #[error("time-in-force not supported by this broker")]
    UnsupportedTimeInForce,

    #[error("cannot cancel order {0}: not open")]
    CancelNotOpen(OrderId),

    #[error("cannot update order {0}: not open, or replacement changes asset/size")]
    UpdateRejected(OrderId),

    #[error("account error: {0}")]
    Account(#[from] crate::account::error::AccountError),

    #[error("fx conversion failed: {0}")]
    Fx(#[from] crate::fx::FxError),
}
