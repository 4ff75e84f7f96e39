//! Price level with an intrusive FIFO queue
//!
//! A price level contains all resting orders at one price, in strict
//! arrival order. The queue is a doubly-linked list threaded through
//! the book's id-keyed arena, so removal of any member by id is O(1)
//! without iterator invalidation.

use std::collections::HashMap;

use types::ids::OrderId;
use types::numeric::Quantity;
use types::order::Order;

/// Arena slot for one resting order and its queue links
#[derive(Debug, Clone)]
pub(crate) struct BookEntry {
    pub(crate) order: Order,
    pub(crate) prev: Option<OrderId>,
    pub(crate) next: Option<OrderId>,
}

impl BookEntry {
    pub(crate) fn new(order: Order) -> Self {
        Self {
            order,
            prev: None,
            next: None,
        }
    }
}

pub(crate) type Arena = HashMap<OrderId, BookEntry>;

/// One price level of a book side
///
/// Invariant: `total_quantity` equals the sum of remaining quantities
/// of the queued orders, and the level is dropped from its ladder the
/// moment the queue drains.
#[derive(Debug, Clone, Default)]
pub(crate) struct PriceLevel {
    head: Option<OrderId>,
    tail: Option<OrderId>,
    len: usize,
    total_quantity: Quantity,
}

impl PriceLevel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append an order (already inserted into the arena) to the tail
    /// of the queue, preserving time priority.
    pub(crate) fn push_back(&mut self, id: OrderId, entries: &mut Arena) {
        let remaining = {
            let entry = entries.get_mut(&id).expect("order must be in the arena");
            entry.prev = self.tail;
            entry.next = None;
            entry.order.remaining_quantity()
        };

        match self.tail {
            Some(tail) => {
                entries.get_mut(&tail).expect("tail must be in the arena").next = Some(id);
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
        self.total_quantity += remaining;
    }

    /// Detach an order from the queue and remove it from the arena
    ///
    /// Returns the removed entry, or None if the id is not queued
    /// here. The caller drops the level if it drained.
    pub(crate) fn unlink(&mut self, id: OrderId, entries: &mut Arena) -> Option<BookEntry> {
        let entry = entries.remove(&id)?;

        match entry.prev {
            Some(prev) => {
                if let Some(p) = entries.get_mut(&prev) {
                    p.next = entry.next;
                }
            }
            None => self.head = entry.next,
        }
        match entry.next {
            Some(next) => {
                if let Some(n) = entries.get_mut(&next) {
                    n.prev = entry.prev;
                }
            }
            None => self.tail = entry.prev,
        }

        self.len -= 1;
        self.total_quantity -= entry.order.remaining_quantity();
        Some(entry)
    }

    /// Id of the order at the front of the queue (oldest)
    pub(crate) fn front(&self) -> Option<OrderId> {
        self.head
    }

    /// Account for quantity consumed from a queued order
    pub(crate) fn reduce(&mut self, quantity: Quantity) {
        self.total_quantity -= quantity;
    }

    /// Account for quantity added to a queued order
    pub(crate) fn increase(&mut self, quantity: Quantity) {
        self.total_quantity += quantity;
    }

    pub(crate) fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    pub(crate) fn order_count(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// FIFO snapshot of queued order ids
    pub(crate) fn order_ids(&self, entries: &Arena) -> Vec<OrderId> {
        let mut ids = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(id) = cursor {
            ids.push(id);
            cursor = entries.get(&id).and_then(|e| e.next);
        }
        ids
    }
}
