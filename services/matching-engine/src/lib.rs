//! Matching Engine
//!
//! Continuous double-auction matching with strict price-time priority.
//!
//! Two layers:
//! - [`book::OrderBook`] — the per-symbol matching kernel. Owns the resting
//!   orders on both sides, matches incoming orders against the opposite
//!   side, and emits the resulting trade sequence.
//! - [`engine::MatchingEngine`] — the multi-symbol coordinator. Validates
//!   submissions against configured risk limits, serializes writes behind a
//!   reader-writer lock, serves concurrent market-data reads, and fans
//!   trade/order events out to registered observers.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced (best price first, then FIFO)
//! - Every match executes at the passive (resting) order's price
//! - Conservation of quantity: fills plus residual always equal the
//!   original order quantity
//! - The book never crosses: best bid < best ask after every submission

pub mod book;
pub mod clock;
pub mod config;
pub mod engine;
pub mod matching;

pub use book::OrderBook;
pub use config::EngineConfig;
pub use engine::{EngineStatistics, MatchingEngine};
