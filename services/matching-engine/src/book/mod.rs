//! Per-symbol order book and matching kernel
//!
//! The book owns the canonical resting state for one symbol and performs
//! all matching. An incoming order is matched against the best opposite
//! level first and, within a level, against the head of the FIFO queue.
//! Every match executes at the passive (resting) order's price and emits
//! one trade; trade ids are strictly increasing within one book.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::{PriceLevel, RestingOrder};

use std::collections::HashMap;

use rust_decimal::Decimal;
use types::ids::{OrderId, TradeId};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::trade::Trade;

use crate::clock;
use crate::matching::crossing;

/// Where a resting order sits, for O(log n) cancellation
///
/// Resting orders are always limit orders (market orders never rest), so
/// price and side are enough to rebuild an equivalent order on modify.
#[derive(Debug, Clone, Copy)]
struct OrderLocation {
    price: Price,
    side: Side,
}

/// Order book for a single symbol
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    bids: BidBook,
    asks: AskBook,
    /// Secondary index: order id → (price, side) of its resting slot.
    locations: HashMap<OrderId, OrderLocation>,
    /// Last trade id handed out; strictly increasing, 0 never issued.
    next_trade_id: u64,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an order and attempt matching
    ///
    /// Market orders execute against the opposite side until filled or the
    /// side is exhausted; any residual is discarded, never rested. Limit
    /// orders match while they cross, then rest their remainder at the
    /// tail of their price level.
    ///
    /// Returns the trades produced by this submission, earliest first.
    pub fn add(&mut self, mut order: Order) -> Vec<Trade> {
        let mut trades = Vec::new();

        match order.side {
            Side::Buy => self.match_against_asks(&mut order, &mut trades),
            Side::Sell => self.match_against_bids(&mut order, &mut trades),
        }

        if order.is_limit() && !order.is_fully_filled() {
            self.rest(order);
        }

        trades
    }

    /// Cancel a resting order by id
    ///
    /// Returns false if the id is not resting. Fills already executed are
    /// not reversed.
    pub fn cancel(&mut self, order_id: OrderId) -> bool {
        let Some(location) = self.locations.remove(&order_id) else {
            return false;
        };

        let removed = match location.side {
            Side::Buy => self.bids.remove(order_id, location.price),
            Side::Sell => self.asks.remove(order_id, location.price),
        };
        // The location index must always point at a live resting order.
        assert!(
            removed.is_some(),
            "order {} indexed at {} but not resting there",
            order_id,
            location.price
        );
        true
    }

    /// Side on which an order currently rests, if any
    pub fn resting_side(&self, order_id: OrderId) -> Option<Side> {
        self.locations.get(&order_id).map(|l| l.side)
    }

    /// Highest bid price
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    /// Lowest ask price
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// `best_ask - best_bid`; absent when either side is empty
    ///
    /// Never negative: the book never crosses.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Aggregate remaining quantity at the best bid (zero when no bids)
    pub fn best_bid_qty(&self) -> Quantity {
        self.bids.best_quantity()
    }

    /// Aggregate remaining quantity at the best ask (zero when no asks)
    pub fn best_ask_qty(&self) -> Quantity {
        self.asks.best_quantity()
    }

    /// Up to `n` bid levels from best outward: (price, aggregate remaining)
    pub fn bid_levels(&self, n: usize) -> Vec<(Price, Quantity)> {
        self.bids.depth(n)
    }

    /// Up to `n` ask levels from best outward: (price, aggregate remaining)
    pub fn ask_levels(&self, n: usize) -> Vec<(Price, Quantity)> {
        self.asks.depth(n)
    }

    /// Total orders resting, across both sides and all levels
    pub fn order_count(&self) -> usize {
        self.bids.order_count() + self.asks.order_count()
    }

    pub fn bid_level_count(&self) -> usize {
        self.bids.level_count()
    }

    pub fn ask_level_count(&self) -> usize {
        self.asks.level_count()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Remove every resting order and reset the trade id counter
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.locations.clear();
        self.next_trade_id = 0;
    }

    // Matching loop, incoming buy against the ask side. Mirrored below for
    // sells; the two borrows differ enough that sharing the loop costs more
    // than it saves.
    fn match_against_asks(&mut self, order: &mut Order, trades: &mut Vec<Trade>) {
        while !order.is_fully_filled() {
            let Some(best_price) = self.asks.best_price() else {
                break;
            };
            if !crossing::crosses(order.side, order.price, best_price) {
                break;
            }

            let (fill, maker_id, maker_filled) = {
                let (_, level) = self
                    .asks
                    .best_level_mut()
                    .expect("non-empty side has a best level");
                let head = level.front().expect("levels are never empty");
                let fill = order.remaining.min(head.remaining);
                let maker_id = head.id;
                let removed = level.fill_front(fill);
                (fill, maker_id, removed.is_some())
            };
            self.asks.prune_if_empty(best_price);

            order.fill(fill);
            if maker_filled {
                self.locations.remove(&maker_id);
            }

            let trade_id = self.next_trade_id();
            trades.push(Trade::new(
                trade_id,
                order.symbol.clone(),
                order.id,  // buyer is the aggressor
                maker_id,  // seller is the resting order
                best_price, // passive price
                fill,
                clock::now_nanos(),
            ));
        }
    }

    // Matching loop, incoming sell against the bid side.
    fn match_against_bids(&mut self, order: &mut Order, trades: &mut Vec<Trade>) {
        while !order.is_fully_filled() {
            let Some(best_price) = self.bids.best_price() else {
                break;
            };
            if !crossing::crosses(order.side, order.price, best_price) {
                break;
            }

            let (fill, maker_id, maker_filled) = {
                let (_, level) = self
                    .bids
                    .best_level_mut()
                    .expect("non-empty side has a best level");
                let head = level.front().expect("levels are never empty");
                let fill = order.remaining.min(head.remaining);
                let maker_id = head.id;
                let removed = level.fill_front(fill);
                (fill, maker_id, removed.is_some())
            };
            self.bids.prune_if_empty(best_price);

            order.fill(fill);
            if maker_filled {
                self.locations.remove(&maker_id);
            }

            let trade_id = self.next_trade_id();
            trades.push(Trade::new(
                trade_id,
                order.symbol.clone(),
                maker_id,  // buyer is the resting order
                order.id,  // seller is the aggressor
                best_price, // passive price
                fill,
                clock::now_nanos(),
            ));
        }
    }

    /// Rest the unfilled remainder of a limit order at the tail of its
    /// price level.
    fn rest(&mut self, order: Order) {
        let price = order.price.expect("limit orders carry a price");
        let entry = RestingOrder {
            id: order.id,
            remaining: order.remaining,
            timestamp: order.timestamp,
        };
        match order.side {
            Side::Buy => self.bids.insert(price, entry),
            Side::Sell => self.asks.insert(price, entry),
        }
        self.locations.insert(
            order.id,
            OrderLocation {
                price,
                side: order.side,
            },
        );
    }

    fn next_trade_id(&mut self) -> TradeId {
        self.next_trade_id += 1;
        TradeId::new(self.next_trade_id)
    }
}
