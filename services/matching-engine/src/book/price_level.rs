//! Price level with FIFO queue
//!
//! A price level holds every resting order at one price on one side.
//! Orders are kept in arrival order to enforce time priority; the head of
//! the queue is always the next order to fill.

use std::collections::VecDeque;

use types::ids::OrderId;
use types::numeric::Quantity;

/// An order resting at a price level
///
/// Only what matching needs survives here; the price is the level's key
/// in the side map.
#[derive(Debug, Clone)]
pub struct RestingOrder {
    pub id: OrderId,
    pub remaining: Quantity,
    /// Arrival instant, Unix nanos. FIFO tie-break metadata; queue position
    /// is what actually orders fills.
    pub timestamp: i64,
}

/// All resting orders at a single price, in FIFO order
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<RestingOrder>,
    /// Maintained sum of `remaining` across the queue.
    total_quantity: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Append an order at the tail of the queue (loses time priority to
    /// everything already resting here).
    pub fn push_back(&mut self, order: RestingOrder) {
        self.total_quantity = self.total_quantity + order.remaining;
        self.orders.push_back(order);
    }

    /// Peek at the head of the queue without removing it
    pub fn front(&self) -> Option<&RestingOrder> {
        self.orders.front()
    }

    /// Fill the head of the queue by `fill` units
    ///
    /// Returns the head's id when the fill exhausts it and it is removed
    /// from the queue, `None` when it remains with a reduced residual.
    ///
    /// # Panics
    /// Panics if the level is empty or the fill exceeds the head's
    /// remaining quantity.
    pub fn fill_front(&mut self, fill: Quantity) -> Option<OrderId> {
        let head = self.orders.front_mut().expect("fill on empty price level");
        assert!(fill <= head.remaining, "fill exceeds resting remainder");

        head.remaining = head.remaining - fill;
        self.total_quantity = self.total_quantity - fill;

        if head.remaining.is_zero() {
            self.orders.pop_front().map(|o| o.id)
        } else {
            None
        }
    }

    /// Remove an order from anywhere in the queue by id
    ///
    /// Returns the removed order's remaining quantity, or `None` if the id
    /// is not resting here. Position scan plus splice; cancellation cost is
    /// linear in the level size.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Quantity> {
        let position = self.orders.iter().position(|o| o.id == order_id)?;
        let removed = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity - removed.remaining;
        Some(removed.remaining)
    }

    /// Check if the price level is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Aggregate remaining quantity at this level
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Number of orders resting at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}
