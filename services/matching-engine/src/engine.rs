//! Matching engine core
//!
//! Owns one order book per symbol and orchestrates a submission:
//! risk gate, matching, residual handling per order type, and
//! observer callbacks.

use std::collections::HashMap;

use tracing::debug;

use risk_engine::gate::RiskGate;
use types::fill::Fill;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, RejectReason};

use crate::book::OrderBook;
use crate::events::{FillCallback, OrderCallback};

/// Single-threaded matching engine
///
/// Not thread-safe: embedders exposing it to multiple producers must
/// serialize all `submit`/`cancel`/`modify` calls externally.
pub struct MatchingEngine {
    /// Order books per symbol
    books: HashMap<Symbol, OrderBook>,
    /// Pre-trade risk gate; submissions bypass risk when absent
    risk: Option<Box<dyn RiskGate>>,
    fill_callback: Option<FillCallback>,
    order_callback: Option<OrderCallback>,
    total_orders: u64,
    total_fills: u64,
}

impl MatchingEngine {
    /// Create an engine with no books, no risk gate, and no observers
    pub fn new() -> Self {
        Self {
            books: HashMap::new(),
            risk: None,
            fill_callback: None,
            order_callback: None,
            total_orders: 0,
            total_fills: 0,
        }
    }

    /// Submit an order
    ///
    /// Runs the risk gate, matches against the symbol's book, handles
    /// the residual per order type, and returns the fills generated,
    /// in execution order. The final order snapshot goes to the order
    /// callback after all fill callbacks.
    pub fn submit(&mut self, mut order: Order) -> Vec<Fill> {
        self.total_orders += 1;

        if order.quantity.is_zero() || self.id_is_live(order.id) {
            debug!(order_id = %order.id, "order rejected: invalid");
            order.reject(RejectReason::InvalidOrder);
            self.notify_order(&order);
            return Vec::new();
        }

        if let Some(risk) = self.risk.as_mut() {
            if let Err(violation) = risk.check(&order) {
                debug!(order_id = %order.id, %violation, "order rejected by risk gate");
                order.reject(RejectReason::RiskLimit(violation.to_string()));
                self.notify_order(&order);
                return Vec::new();
            }
        }

        let symbol = order.symbol.clone();
        self.books
            .entry(symbol.clone())
            .or_insert_with(|| OrderBook::new(symbol.clone()));

        // LIMIT, IOC, and FOK are bounded by the order's price;
        // MARKET sweeps without a bound.
        let limit = match order.order_type {
            OrderType::Limit | OrderType::Ioc | OrderType::Fok => Some(order.price),
            OrderType::Market => None,
        };

        // Fill-or-kill is all-or-nothing: verify the full quantity is
        // available before touching the book.
        if order.order_type == OrderType::Fok {
            let book = self.books.get(&symbol).expect("book created above");
            if book.crossable_quantity(order.side, limit, order.quantity) < order.quantity {
                debug!(order_id = %order.id, "fill-or-kill unsatisfiable, cancelled");
                order.cancel();
                self.notify_order(&order);
                return Vec::new();
            }
        }

        // Split borrows: the book borrow must end before callbacks run.
        let fills = {
            let book = self.books.get_mut(&symbol).expect("book created above");
            book.execute_fill(
                order.side,
                order.remaining_quantity(),
                limit,
                order.id,
                order.timestamp,
            )
        };

        for fill in &fills {
            order.add_fill(fill.quantity);
            self.notify_fill(fill);
            if let Some(risk) = self.risk.as_mut() {
                risk.apply_fill(fill);
            }
            self.total_fills += 1;
        }

        if !order.remaining_quantity().is_zero() {
            match order.order_type {
                OrderType::Limit => {
                    let book = self.books.get_mut(&symbol).expect("book created above");
                    book.add(order.clone());
                }
                OrderType::Market | OrderType::Ioc | OrderType::Fok => order.cancel(),
            }
        }

        self.notify_order(&order);
        fills
    }

    /// Cancel a resting order
    ///
    /// Returns false if the symbol or id is unknown. On success the
    /// removed order is reported Cancelled through the order callback.
    pub fn cancel(&mut self, symbol: &Symbol, id: OrderId) -> bool {
        let Some(book) = self.books.get_mut(symbol) else {
            return false;
        };
        match book.cancel(id) {
            Some(mut order) => {
                debug!(order_id = %order.id, "resting order cancelled");
                order.cancel();
                self.notify_order(&order);
                true
            }
            None => false,
        }
    }

    /// Modify a resting order; `None` keeps the existing value
    pub fn modify(
        &mut self,
        symbol: &Symbol,
        id: OrderId,
        new_price: Option<Price>,
        new_quantity: Option<Quantity>,
        timestamp: i64,
    ) -> bool {
        match self.books.get_mut(symbol) {
            Some(book) => book.modify(id, new_price, new_quantity, timestamp),
            None => false,
        }
    }

    /// Read-only view of a symbol's book
    pub fn order_book(&self, symbol: &Symbol) -> Option<&OrderBook> {
        self.books.get(symbol)
    }

    /// Install the fill observer
    pub fn set_fill_callback(&mut self, callback: FillCallback) {
        self.fill_callback = Some(callback);
    }

    /// Install the order-status observer
    pub fn set_order_callback(&mut self, callback: OrderCallback) {
        self.order_callback = Some(callback);
    }

    /// Install the pre-trade risk gate
    pub fn set_risk_manager(&mut self, risk: Box<dyn RiskGate>) {
        self.risk = Some(risk);
    }

    /// Orders processed, including rejects
    pub fn total_orders_processed(&self) -> u64 {
        self.total_orders
    }

    /// Fills generated across all submissions
    pub fn total_fills_generated(&self) -> u64 {
        self.total_fills
    }

    /// Order ids must be unique across all live orders in the engine
    fn id_is_live(&self, id: OrderId) -> bool {
        self.books.values().any(|book| book.contains(id))
    }

    fn notify_fill(&mut self, fill: &Fill) {
        if let Some(callback) = self.fill_callback.as_mut() {
            callback(fill);
        }
    }

    fn notify_order(&mut self, order: &Order) {
        if let Some(callback) = self.order_callback.as_mut() {
            callback(order);
        }
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}
