//! Order lifecycle types

use crate::ids::{OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order execution policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Execute at the limit price or better; residual rests in the book
    Limit,
    /// Execute at the best available prices; residual is cancelled
    Market,
    /// Immediate-or-cancel: match what is possible now, cancel the rest
    Ioc,
    /// Fill-or-kill: match the entire quantity immediately or cancel
    /// without any fill
    Fok,
}

/// Reason an order was rejected at submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// Non-positive quantity or an id already resting in the book
    #[error("invalid order")]
    InvalidOrder,
    /// A pre-trade risk limit failed; the message names the limit and
    /// the offending value
    #[error("risk check failed: {0}")]
    RiskLimit(String),
}

/// Order status
///
/// `New → (PartiallyFilled)* → Filled | Cancelled | Rejected`.
/// Filled, Cancelled, and Rejected are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason")]
pub enum OrderStatus {
    #[serde(rename = "NEW")]
    New,

    #[serde(rename = "PARTIALLY_FILLED")]
    PartiallyFilled,

    #[serde(rename = "FILLED")]
    Filled,

    #[serde(rename = "CANCELLED")]
    Cancelled,

    #[serde(rename = "REJECTED")]
    Rejected(RejectReason),
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected(_)
        )
    }
}

/// An order submitted to the venue
///
/// `timestamp` is the caller-supplied monotonic submission time in
/// nanoseconds. It determines time priority within a price level and
/// is refreshed when a modify changes the price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    /// Limit price; zero for MARKET orders
    pub price: Price,
    /// Original size
    pub quantity: Quantity,
    /// Monotonically non-decreasing, never exceeds `quantity`
    pub filled_quantity: Quantity,
    pub status: OrderStatus,
    pub timestamp: i64,
}

impl Order {
    /// Create a new order in the NEW state
    pub fn new(
        id: OrderId,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            symbol,
            side,
            order_type,
            price,
            quantity,
            filled_quantity: Quantity::zero(),
            status: OrderStatus::New,
            timestamp,
        }
    }

    /// Quantity still open to be filled
    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    /// Check if the order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    /// Check if the order has any fills
    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Check if the order can still be matched
    pub fn is_active(&self) -> bool {
        matches!(self.status, OrderStatus::New | OrderStatus::PartiallyFilled)
    }

    /// Apply a fill and adjust status
    ///
    /// # Panics
    /// Panics if the fill would exceed the order quantity
    pub fn add_fill(&mut self, fill_quantity: Quantity) {
        let new_filled = self.filled_quantity + fill_quantity;
        assert!(
            new_filled <= self.quantity,
            "Fill would exceed order quantity"
        );
        self.filled_quantity = new_filled;

        if self.is_filled() {
            self.status = OrderStatus::Filled;
        } else if self.has_fills() {
            self.status = OrderStatus::PartiallyFilled;
        }
    }

    /// Cancel the order
    ///
    /// # Panics
    /// Panics if the order is already in a terminal state
    pub fn cancel(&mut self) {
        assert!(!self.status.is_terminal(), "Cannot cancel terminal order");
        self.status = OrderStatus::Cancelled;
    }

    /// Reject the order
    pub fn reject(&mut self, reason: RejectReason) {
        self.status = OrderStatus::Rejected(reason);
    }
}
