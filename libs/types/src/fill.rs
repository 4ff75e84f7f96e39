//! Fill (execution) records
//!
//! A fill describes one execution between an incoming taker order and
//! a resting maker order. Fills are immutable; the engine emits them
//! in execution order and retains no history.

use crate::ids::{OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One execution between a taker and a maker order
///
/// `side` is the taker's side; `price` is always the maker's resting
/// price, so any price improvement accrues to the taker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// The incoming (aggressor) order
    pub taker_order_id: OrderId,
    /// The resting (passive) order that was consumed
    pub maker_order_id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    /// Execution time in nanoseconds
    pub executed_at: i64,
}

impl Fill {
    /// Create a new fill
    pub fn new(
        taker_order_id: OrderId,
        maker_order_id: OrderId,
        symbol: Symbol,
        side: Side,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) -> Self {
        Self {
            taker_order_id,
            maker_order_id,
            symbol,
            side,
            price,
            quantity,
            executed_at,
        }
    }

    /// Notional value of the execution (price × quantity)
    pub fn notional(&self) -> Decimal {
        self.price.as_decimal() * self.quantity.as_decimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_creation() {
        let fill = Fill::new(
            OrderId::new(3),
            OrderId::new(1),
            Symbol::new("AAPL"),
            Side::Buy,
            Price::from_u64(150),
            Quantity::new(100),
            1_000,
        );

        assert_eq!(fill.taker_order_id, OrderId::new(3));
        assert_eq!(fill.maker_order_id, OrderId::new(1));
        assert_eq!(fill.notional(), Decimal::from(15_000));
    }

    #[test]
    fn test_fill_serialization() {
        let fill = Fill::new(
            OrderId::new(2),
            OrderId::new(1),
            Symbol::new("MSFT"),
            Side::Sell,
            Price::from_str("410.50").unwrap(),
            Quantity::new(25),
            2_000,
        );

        let json = serde_json::to_string(&fill).unwrap();
        let deserialized: Fill = serde_json::from_str(&json).unwrap();
        assert_eq!(fill, deserialized);
    }
}
