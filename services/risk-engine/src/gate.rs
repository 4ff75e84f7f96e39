//! The engine-facing risk seam
//!
//! The matching engine holds the gate by trait so tests can install
//! a mock that always passes, always fails, or records calls.

use rust_decimal::Decimal;
use thiserror::Error;
use types::fill::Fill;
use types::order::Order;

/// Pre-trade gate consulted on every submission
///
/// `check` may mutate internal state (the rate window); `apply_fill`
/// is called once per fill, in execution order, during `submit`.
pub trait RiskGate {
    /// Evaluate an order against all limits; first violation wins
    fn check(&mut self, order: &Order) -> Result<(), RiskViolation>;

    /// Reflect an execution into position and exposure state
    fn apply_fill(&mut self, fill: &Fill);
}

/// A failed limit check, naming the limit and the offending value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RiskViolation {
    #[error("order rate limit exceeded: {limit} orders per second")]
    OrderRate { limit: u32 },

    #[error("order size limit exceeded: {size} > {limit}")]
    OrderSize { size: u64, limit: u64 },

    #[error("position limit exceeded: {projected} > {limit}")]
    PositionLimit { projected: i64, limit: u64 },

    #[error("global position limit exceeded: {projected} > {limit}")]
    GlobalPositionLimit { projected: u64, limit: u64 },

    #[error("notional limit exceeded: {projected} > {limit}")]
    NotionalLimit { projected: Decimal, limit: Decimal },

    #[error("global notional limit exceeded: {projected} > {limit}")]
    GlobalNotionalLimit { projected: Decimal, limit: Decimal },
}
