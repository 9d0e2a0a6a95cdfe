//! Trade execution records
//!
//! A trade is emitted by the matching kernel for every fill. Records are
//! immutable; the execution price is always the passive (resting) order's
//! price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{OrderId, Symbol, TradeId};
use crate::numeric::{Price, Quantity};

/// A single trade between a buy and a sell order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: i64, // Unix nanos
}

impl Trade {
    /// Create a new trade record
    pub fn new(
        trade_id: TradeId,
        symbol: Symbol,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        price: Price,
        quantity: Quantity,
        timestamp: i64,
    ) -> Self {
        Self {
            trade_id,
            symbol,
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            timestamp,
        }
    }

    /// Notional value (price × quantity)
    pub fn trade_value(&self) -> Decimal {
        self.price.as_decimal() * Decimal::from(self.quantity.as_u64())
    }
}
