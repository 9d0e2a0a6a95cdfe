//! Market depth snapshots
//!
//! Aggregated per-level view of one symbol's order book, captured under a
//! read lock. Bids run from the highest price outward, asks from the
//! lowest.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::Symbol;
use crate::numeric::{Price, Quantity};

/// Snapshot of aggregate resting quantity per price level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDepth {
    pub symbol: Symbol,
    /// Bid levels, highest price first: (price, aggregate remaining).
    pub bids: Vec<(Price, Quantity)>,
    /// Ask levels, lowest price first: (price, aggregate remaining).
    pub asks: Vec<(Price, Quantity)>,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    /// `best_ask - best_bid`; absent when either side is empty.
    pub spread: Option<Decimal>,
    /// Orders resting across both sides and all levels.
    pub total_orders: usize,
    /// Capture instant, Unix nanos.
    pub timestamp: i64,
}
