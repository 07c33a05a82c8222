//! Turns placed [`crate::order::Instruction`]s into tracked orders and fills: the
//! [`broker::SimBroker`], per-order-type [`executors`], [`pricing`] models and [`fees`] schedules
//! (spec §4.6, §4.7, §4.9).

/// Execution module specific errors.
pub mod error;

/// The simulated broker that turns [`crate::order::Instruction`]s into tracked orders and fills.
pub mod broker;
/// Per-order-type execution state machines (spec §4.6).
pub mod executors;
/// Broker commission/fee schedules (spec §4.7).
pub mod fees;
/// Market-data-to-execution-price models (spec §4.7).
pub mod pricing;
