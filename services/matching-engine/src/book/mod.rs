//! Per-symbol order book with price-time priority
//!
//! Two price ladders (bids best-last, asks best-first in `BTreeMap`
//! key order) whose levels are FIFO queues threaded through a single
//! id-keyed arena. The arena doubles as the id index, giving O(1)
//! cancel of any resting order.

mod level;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use types::fill::Fill;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use self::level::{Arena, BookEntry, PriceLevel};

/// Order book for one symbol
///
/// The book only stores and matches; order status transitions on
/// cancel and residual handling belong to the engine.
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: Symbol,
    /// Bid levels; best bid is the last key
    bids: BTreeMap<Price, PriceLevel>,
    /// Ask levels; best ask is the first key
    asks: BTreeMap<Price, PriceLevel>,
    /// Resting orders and their queue links, keyed by id
    entries: Arena,
}

impl OrderBook {
    /// Create an empty book for a symbol
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            entries: Arena::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Add a resting order to the tail of its (side, price) level
    ///
    /// Returns false for zero remaining quantity or a duplicate id.
    /// Never matches; matching is `execute_fill`'s job.
    pub fn add(&mut self, order: Order) -> bool {
        if order.remaining_quantity().is_zero() {
            return false;
        }
        if self.entries.contains_key(&order.id) {
            return false;
        }

        let id = order.id;
        let side = order.side;
        let price = order.price;
        self.entries.insert(id, BookEntry::new(order));

        let ladder = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        ladder
            .entry(price)
            .or_insert_with(PriceLevel::new)
            .push_back(id, &mut self.entries);
        true
    }

    /// Remove a resting order by id in O(1)
    ///
    /// Returns the forgotten order, status untouched. Drops the level
    /// if it drained.
    pub fn cancel(&mut self, id: OrderId) -> Option<Order> {
        let (side, price) = {
            let entry = self.entries.get(&id)?;
            (entry.order.side, entry.order.price)
        };

        let ladder = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = ladder.get_mut(&price)?;
        let entry = level.unlink(id, &mut self.entries)?;
        if level.is_empty() {
            ladder.remove(&price);
        }
        Some(entry.order)
    }

    /// Modify a resting order
    ///
    /// `None` keeps the existing value. A price change re-queues the
    /// order at the new price with the supplied timestamp, losing
    /// time priority; a quantity-only change keeps queue position. A
    /// new quantity at or below the filled quantity is rejected.
    pub fn modify(
        &mut self,
        id: OrderId,
        new_price: Option<Price>,
        new_quantity: Option<Quantity>,
        timestamp: i64,
    ) -> bool {
        let (current_price, current_quantity, filled) = match self.entries.get(&id) {
            Some(entry) => (
                entry.order.price,
                entry.order.quantity,
                entry.order.filled_quantity,
            ),
            None => return false,
        };

        if let Some(quantity) = new_quantity {
            if quantity <= filled {
                return false;
            }
        }

        match new_price {
            Some(price) if price != current_price => {
                let mut order = self
                    .cancel(id)
                    .expect("resting order must cancel during modify");
                order.price = price;
                if let Some(quantity) = new_quantity {
                    order.quantity = quantity;
                }
                order.timestamp = timestamp;
                self.add(order)
            }
            _ => {
                let Some(quantity) = new_quantity else {
                    return true;
                };
                if quantity == current_quantity {
                    return true;
                }

                let side = {
                    let entry = self.entries.get_mut(&id).expect("entry checked above");
                    entry.order.quantity = quantity;
                    entry.order.side
                };
                let ladder = match side {
                    Side::Buy => &mut self.bids,
                    Side::Sell => &mut self.asks,
                };
                let level = ladder
                    .get_mut(&current_price)
                    .expect("level must exist for resting order");
                if quantity > current_quantity {
                    level.increase(quantity - current_quantity);
                } else {
                    level.reduce(current_quantity - quantity);
                }
                true
            }
        }
    }

    /// Best bid as (price, aggregated level quantity)
    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids
            .iter()
            .next_back()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Best ask as (price, aggregated level quantity)
    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks
            .iter()
            .next()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Best ask minus best bid; absent unless the book is two-sided
    pub fn spread(&self) -> Option<Decimal> {
        let (bid, _) = self.best_bid()?;
        let (ask, _) = self.best_ask()?;
        Some(ask.as_decimal() - bid.as_decimal())
    }

    /// Midpoint of best bid and ask; absent unless two-sided
    pub fn mid(&self) -> Option<Decimal> {
        let (bid, _) = self.best_bid()?;
        let (ask, _) = self.best_ask()?;
        Some((bid.as_decimal() + ask.as_decimal()) / Decimal::from(2))
    }

    /// First n bid levels in price priority (best first)
    pub fn bid_levels(&self, n: usize) -> Vec<(Price, Quantity)> {
        self.bids
            .iter()
            .rev()
            .take(n)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    /// First n ask levels in price priority (best first)
    pub fn ask_levels(&self, n: usize) -> Vec<(Price, Quantity)> {
        self.asks
            .iter()
            .take(n)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    /// FIFO snapshot of the order ids queued at one level
    pub fn orders_at(&self, side: Side, price: Price) -> Vec<OrderId> {
        let ladder = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        ladder
            .get(&price)
            .map(|level| level.order_ids(&self.entries))
            .unwrap_or_default()
    }

    /// Look up a resting order by id
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.entries.get(&id).map(|entry| &entry.order)
    }

    /// Check whether an id is resting in this book
    pub fn contains(&self, id: OrderId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of resting orders across both sides
    pub fn order_count(&self) -> usize {
        self.entries.len()
    }

    pub fn bid_order_count(&self) -> usize {
        self.bids.values().map(PriceLevel::order_count).sum()
    }

    pub fn ask_order_count(&self) -> usize {
        self.asks.values().map(PriceLevel::order_count).sum()
    }

    pub fn bid_level_count(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_level_count(&self) -> usize {
        self.asks.len()
    }

    /// Resting opposite-side quantity a taker could consume within
    /// the limit, saturating at `cap`
    ///
    /// `limit = None` means no price bound. This is the fill-or-kill
    /// feasibility check, run before any book mutation.
    pub fn crossable_quantity(
        &self,
        taker_side: Side,
        limit: Option<Price>,
        cap: Quantity,
    ) -> Quantity {
        let mut available = Quantity::zero();
        match taker_side {
            Side::Buy => {
                for (&price, level) in self.asks.iter() {
                    if let Some(limit) = limit {
                        if price > limit {
                            break;
                        }
                    }
                    available += level.total_quantity();
                    if available >= cap {
                        return cap;
                    }
                }
            }
            Side::Sell => {
                for (&price, level) in self.bids.iter().rev() {
                    if let Some(limit) = limit {
                        if price < limit {
                            break;
                        }
                    }
                    available += level.total_quantity();
                    if available >= cap {
                        return cap;
                    }
                }
            }
        }
        available
    }

    /// Consume resting liquidity on the side opposite the taker
    ///
    /// Traverses levels in price priority and each level in FIFO
    /// order. Every fill executes at the maker's level price. Stops
    /// at the first level outside `limit` (`None` = unbounded) or
    /// when `quantity` is exhausted. Fully filled makers leave the
    /// book; drained levels are removed. Returns fills in execution
    /// order.
    pub fn execute_fill(
        &mut self,
        taker_side: Side,
        quantity: Quantity,
        limit: Option<Price>,
        taker_id: OrderId,
        timestamp: i64,
    ) -> Vec<Fill> {
        let mut fills = Vec::new();
        let mut remaining = quantity;
        match taker_side {
            Side::Buy => self.sweep_asks(&mut fills, &mut remaining, limit, taker_id, timestamp),
            Side::Sell => self.sweep_bids(&mut fills, &mut remaining, limit, taker_id, timestamp),
        }
        fills
    }

    /// Match a buy taker against the ask ladder, best price first
    fn sweep_asks(
        &mut self,
        fills: &mut Vec<Fill>,
        remaining: &mut Quantity,
        limit: Option<Price>,
        taker_id: OrderId,
        timestamp: i64,
    ) {
        while !remaining.is_zero() {
            let Some((&level_price, _)) = self.asks.iter().next() else {
                break;
            };
            if let Some(limit) = limit {
                if level_price > limit {
                    break;
                }
            }

            let level = self.asks.get_mut(&level_price).expect("best level exists");
            while !remaining.is_zero() {
                let Some(maker_id) = level.front() else {
                    break;
                };
                let maker = &mut self
                    .entries
                    .get_mut(&maker_id)
                    .expect("queued order is in the arena")
                    .order;

                let fill_quantity = (*remaining).min(maker.remaining_quantity());
                fills.push(Fill::new(
                    taker_id,
                    maker_id,
                    self.symbol.clone(),
                    Side::Buy,
                    level_price,
                    fill_quantity,
                    timestamp,
                ));

                maker.add_fill(fill_quantity);
                let maker_done = maker.is_filled();
                level.reduce(fill_quantity);
                *remaining -= fill_quantity;

                if maker_done {
                    level.unlink(maker_id, &mut self.entries);
                }
            }
            if level.is_empty() {
                self.asks.remove(&level_price);
            }
        }
    }

    /// Match a sell taker against the bid ladder, best price first
    fn sweep_bids(
        &mut self,
        fills: &mut Vec<Fill>,
        remaining: &mut Quantity,
        limit: Option<Price>,
        taker_id: OrderId,
        timestamp: i64,
    ) {
        while !remaining.is_zero() {
            let Some((&level_price, _)) = self.bids.iter().next_back() else {
                break;
            };
            if let Some(limit) = limit {
                if level_price < limit {
                    break;
                }
            }

            let level = self.bids.get_mut(&level_price).expect("best level exists");
            while !remaining.is_zero() {
                let Some(maker_id) = level.front() else {
                    break;
                };
                let maker = &mut self
                    .entries
                    .get_mut(&maker_id)
                    .expect("queued order is in the arena")
                    .order;

                let fill_quantity = (*remaining).min(maker.remaining_quantity());
                fills.push(Fill::new(
                    taker_id,
                    maker_id,
                    self.symbol.clone(),
                    Side::Sell,
                    level_price,
                    fill_quantity,
                    timestamp,
                ));

                maker.add_fill(fill_quantity);
                let maker_done = maker.is_filled();
                level.reduce(fill_quantity);
                *remaining -= fill_quantity;

                if maker_done {
                    level.unlink(maker_id, &mut self.entries);
                }
            }
            if level.is_empty() {
                self.bids.remove(&level_price);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::order::{OrderStatus, OrderType};

    fn make_order(id: u64, side: Side, price: u64, qty: u64) -> Order {
        Order::new(
            OrderId::new(id),
            Symbol::new("AAPL"),
            side,
            OrderType::Limit,
            Price::from_u64(price),
            Quantity::new(qty),
            id as i64,
        )
    }

    fn book_with(orders: &[(u64, Side, u64, u64)]) -> OrderBook {
        let mut book = OrderBook::new(Symbol::new("AAPL"));
        for &(id, side, price, qty) in orders {
            assert!(book.add(make_order(id, side, price, qty)));
        }
        book
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut book = book_with(&[(1, Side::Buy, 150, 100)]);
        assert!(!book.add(make_order(1, Side::Sell, 151, 50)));
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn test_add_rejects_zero_remaining() {
        let mut book = OrderBook::new(Symbol::new("AAPL"));
        let mut order = make_order(1, Side::Buy, 150, 100);
        order.add_fill(Quantity::new(100));
        assert!(!book.add(order));
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn test_best_bid_and_ask_priority() {
        let book = book_with(&[
            (1, Side::Buy, 149, 100),
            (2, Side::Buy, 150, 200),
            (3, Side::Buy, 148, 50),
            (4, Side::Sell, 151, 75),
            (5, Side::Sell, 152, 25),
        ]);

        assert_eq!(book.best_bid(), Some((Price::from_u64(150), Quantity::new(200))));
        assert_eq!(book.best_ask(), Some((Price::from_u64(151), Quantity::new(75))));
        assert_eq!(book.spread(), Some(Decimal::from(1)));
        assert_eq!(
            book.mid(),
            Some(Decimal::from(301) / Decimal::from(2))
        );
    }

    #[test]
    fn test_spread_absent_when_one_sided() {
        let book = book_with(&[(1, Side::Buy, 150, 100)]);
        assert!(book.spread().is_none());
        assert!(book.mid().is_none());
    }

    #[test]
    fn test_level_aggregation_and_depth() {
        let book = book_with(&[
            (1, Side::Buy, 150, 100),
            (2, Side::Buy, 150, 50),
            (3, Side::Buy, 149, 75),
            (4, Side::Buy, 148, 25),
        ]);

        assert_eq!(book.best_bid(), Some((Price::from_u64(150), Quantity::new(150))));

        let depth = book.bid_levels(2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0], (Price::from_u64(150), Quantity::new(150)));
        assert_eq!(depth[1], (Price::from_u64(149), Quantity::new(75)));
    }

    #[test]
    fn test_cancel_removes_order_and_level() {
        let mut book = book_with(&[(1, Side::Buy, 150, 100), (2, Side::Buy, 149, 200)]);

        let cancelled = book.cancel(OrderId::new(1)).unwrap();
        assert_eq!(cancelled.id, OrderId::new(1));
        // the book does not touch status
        assert_eq!(cancelled.status, OrderStatus::New);

        assert_eq!(book.best_bid(), Some((Price::from_u64(149), Quantity::new(200))));
        assert!(!book.contains(OrderId::new(1)));
        assert_eq!(book.bid_level_count(), 1);
    }

    #[test]
    fn test_cancel_unknown_id_twice() {
        let mut book = book_with(&[(1, Side::Buy, 150, 100)]);
        assert!(book.cancel(OrderId::new(999)).is_none());
        assert!(book.cancel(OrderId::new(999)).is_none());
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn test_cancel_restores_pre_add_state() {
        let mut book = book_with(&[(1, Side::Buy, 150, 100)]);
        book.add(make_order(2, Side::Buy, 151, 50));
        book.cancel(OrderId::new(2));

        assert_eq!(book.best_bid(), Some((Price::from_u64(150), Quantity::new(100))));
        assert_eq!(book.order_count(), 1);
        assert_eq!(book.bid_level_count(), 1);
    }

    #[test]
    fn test_modify_quantity_keeps_queue_position() {
        let mut book = book_with(&[(1, Side::Sell, 150, 100), (2, Side::Sell, 150, 50)]);

        assert!(book.modify(OrderId::new(1), None, Some(Quantity::new(60)), 10));
        assert_eq!(
            book.orders_at(Side::Sell, Price::from_u64(150)),
            vec![OrderId::new(1), OrderId::new(2)]
        );
        assert_eq!(book.best_ask(), Some((Price::from_u64(150), Quantity::new(110))));

        // restore the original quantity; position still preserved
        assert!(book.modify(OrderId::new(1), None, Some(Quantity::new(100)), 11));
        assert_eq!(book.best_ask(), Some((Price::from_u64(150), Quantity::new(150))));
        assert_eq!(
            book.orders_at(Side::Sell, Price::from_u64(150)),
            vec![OrderId::new(1), OrderId::new(2)]
        );
    }

    #[test]
    fn test_modify_price_loses_time_priority() {
        let mut book = book_with(&[(1, Side::Sell, 150, 100), (2, Side::Sell, 150, 50)]);

        assert!(book.modify(OrderId::new(1), Some(Price::from_u64(151)), None, 10));
        assert_eq!(
            book.orders_at(Side::Sell, Price::from_u64(150)),
            vec![OrderId::new(2)]
        );
        assert_eq!(
            book.orders_at(Side::Sell, Price::from_u64(151)),
            vec![OrderId::new(1)]
        );
        assert_eq!(book.order(OrderId::new(1)).unwrap().timestamp, 10);

        // moving back re-queues at the tail of the original level
        assert!(book.modify(OrderId::new(1), Some(Price::from_u64(150)), None, 11));
        assert_eq!(
            book.orders_at(Side::Sell, Price::from_u64(150)),
            vec![OrderId::new(2), OrderId::new(1)]
        );
        assert_eq!(book.ask_level_count(), 1);
    }

    #[test]
    fn test_modify_unknown_id() {
        let mut book = book_with(&[(1, Side::Buy, 150, 100)]);
        assert!(!book.modify(OrderId::new(999), None, Some(Quantity::new(10)), 10));
    }

    #[test]
    fn test_modify_below_filled_quantity_rejected() {
        let mut book = book_with(&[(1, Side::Sell, 150, 100)]);
        book.execute_fill(Side::Buy, Quantity::new(40), None, OrderId::new(2), 5);

        // 40 already filled; shrinking to 40 or less is refused
        assert!(!book.modify(OrderId::new(1), None, Some(Quantity::new(40)), 10));
        assert!(!book.modify(OrderId::new(1), None, Some(Quantity::new(30)), 10));
        let order = book.order(OrderId::new(1)).unwrap();
        assert_eq!(order.quantity, Quantity::new(100));
        assert_eq!(order.filled_quantity, Quantity::new(40));

        assert!(book.modify(OrderId::new(1), None, Some(Quantity::new(50)), 10));
        assert_eq!(book.best_ask(), Some((Price::from_u64(150), Quantity::new(10))));
    }

    #[test]
    fn test_execute_fill_consumes_fifo_within_level() {
        let mut book = book_with(&[
            (1, Side::Sell, 150, 30),
            (2, Side::Sell, 150, 30),
            (3, Side::Sell, 150, 30),
        ]);

        let fills = book.execute_fill(Side::Buy, Quantity::new(45), None, OrderId::new(9), 5);

        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].maker_order_id, OrderId::new(1));
        assert_eq!(fills[0].quantity, Quantity::new(30));
        assert_eq!(fills[1].maker_order_id, OrderId::new(2));
        assert_eq!(fills[1].quantity, Quantity::new(15));

        // order 1 is gone, order 2 is the partially filled head
        assert!(!book.contains(OrderId::new(1)));
        assert_eq!(
            book.orders_at(Side::Sell, Price::from_u64(150)),
            vec![OrderId::new(2), OrderId::new(3)]
        );
        assert_eq!(book.best_ask(), Some((Price::from_u64(150), Quantity::new(45))));
    }

    #[test]
    fn test_execute_fill_stops_at_limit_price() {
        let mut book = book_with(&[(1, Side::Sell, 150, 100), (2, Side::Sell, 151, 100)]);

        let fills = book.execute_fill(
            Side::Buy,
            Quantity::new(200),
            Some(Price::from_u64(150)),
            OrderId::new(9),
            5,
        );

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, Price::from_u64(150));
        assert_eq!(fills[0].quantity, Quantity::new(100));
        assert_eq!(book.best_ask(), Some((Price::from_u64(151), Quantity::new(100))));
    }

    #[test]
    fn test_execute_fill_sell_sweeps_bids_descending() {
        let mut book = book_with(&[(1, Side::Buy, 150, 100), (2, Side::Buy, 149, 100)]);

        let fills = book.execute_fill(
            Side::Sell,
            Quantity::new(150),
            Some(Price::from_u64(149)),
            OrderId::new(9),
            5,
        );

        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].price, Price::from_u64(150));
        assert_eq!(fills[0].quantity, Quantity::new(100));
        assert_eq!(fills[1].price, Price::from_u64(149));
        assert_eq!(fills[1].quantity, Quantity::new(50));
        assert_eq!(book.best_bid(), Some((Price::from_u64(149), Quantity::new(50))));
    }

    #[test]
    fn test_execute_fill_unbounded_sweeps_everything() {
        let mut book = book_with(&[(1, Side::Sell, 150, 100), (2, Side::Sell, 151, 200)]);

        let fills = book.execute_fill(Side::Buy, Quantity::new(500), None, OrderId::new(9), 5);

        assert_eq!(fills.len(), 2);
        assert_eq!(
            fills.iter().map(|f| f.quantity.as_u64()).sum::<u64>(),
            300
        );
        assert!(book.best_ask().is_none());
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn test_crossable_quantity_respects_limit() {
        let book = book_with(&[
            (1, Side::Sell, 150, 50),
            (2, Side::Sell, 151, 50),
            (3, Side::Sell, 152, 50),
        ]);

        assert_eq!(
            book.crossable_quantity(Side::Buy, Some(Price::from_u64(151)), Quantity::new(500)),
            Quantity::new(100)
        );
        assert_eq!(
            book.crossable_quantity(Side::Buy, None, Quantity::new(500)),
            Quantity::new(150)
        );
        // saturates at the cap without walking deeper levels
        assert_eq!(
            book.crossable_quantity(Side::Buy, None, Quantity::new(60)),
            Quantity::new(60)
        );
    }

    #[test]
    fn test_crossable_quantity_sell_side() {
        let book = book_with(&[(1, Side::Buy, 150, 40), (2, Side::Buy, 149, 40)]);

        assert_eq!(
            book.crossable_quantity(Side::Sell, Some(Price::from_u64(150)), Quantity::new(100)),
            Quantity::new(40)
        );
        assert_eq!(
            book.crossable_quantity(Side::Sell, Some(Price::from_u64(149)), Quantity::new(100)),
            Quantity::new(80)
        );
    }
}
