//! Order types and validation predicates
//!
//! An order has immutable identity with a mutable residual quantity.
//! Market orders carry no price (`price == None` is the "any price"
//! sentinel); limit orders always carry one.

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::ids::{OrderId, Symbol};
use crate::numeric::{Price, Quantity};

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

/// Order execution type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderKind {
    /// Execute immediately at best available prices; never rests
    Market,
    /// Execute at the limit price or better; remainder rests
    Limit,
}

/// A trading order
///
/// `remaining` starts equal to `quantity` and only ever decreases;
/// zero remaining means fully filled. `timestamp` (Unix nanos) is the
/// FIFO tie-break within a price level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub kind: OrderKind,
    /// Limit price; `None` for market orders ("any price").
    pub price: Option<Price>,
    pub quantity: Quantity,
    pub remaining: Quantity,
    pub timestamp: i64, // Unix nanos
}

impl Order {
    /// Create a new limit order
    pub fn limit(
        id: OrderId,
        symbol: Symbol,
        side: Side,
        price: Price,
        quantity: Quantity,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            symbol,
            side,
            kind: OrderKind::Limit,
            price: Some(price),
            quantity,
            remaining: quantity,
            timestamp,
        }
    }

    /// Create a new market order (no price)
    pub fn market(
        id: OrderId,
        symbol: Symbol,
        side: Side,
        quantity: Quantity,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            symbol,
            side,
            kind: OrderKind::Market,
            price: None,
            quantity,
            remaining: quantity,
            timestamp,
        }
    }

    pub fn is_market(&self) -> bool {
        self.kind == OrderKind::Market
    }

    pub fn is_limit(&self) -> bool {
        self.kind == OrderKind::Limit
    }

    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    /// Check if the order is completely filled
    pub fn is_fully_filled(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Check if some but not all quantity has been filled
    pub fn is_partially_filled(&self) -> bool {
        !self.remaining.is_zero() && self.remaining < self.quantity
    }

    /// Reduce the residual quantity by a fill
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining quantity
    pub fn fill(&mut self, fill_quantity: Quantity) {
        assert!(
            fill_quantity <= self.remaining,
            "fill exceeds remaining quantity"
        );
        self.remaining = self.remaining - fill_quantity;
    }

    /// Validate the order shape
    ///
    /// Checks (in order): non-zero id, kind/price consistency, limit price
    /// range, quantity range, and the residual invariant
    /// `remaining <= quantity`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.id.is_valid() {
            return Err(ValidationError::ReservedOrderId);
        }
        match (self.kind, self.price) {
            (OrderKind::Limit, None) => return Err(ValidationError::MissingLimitPrice),
            (OrderKind::Market, Some(_)) => return Err(ValidationError::MarketOrderWithPrice),
            (OrderKind::Limit, Some(price)) => {
                if !price.in_valid_range() {
                    return Err(ValidationError::PriceOutOfRange {
                        price: price.to_string(),
                    });
                }
            }
            (OrderKind::Market, None) => {}
        }
        if !self.quantity.in_valid_range() {
            return Err(ValidationError::QuantityOutOfRange {
                quantity: self.quantity.as_u64(),
            });
        }
        if self.remaining > self.quantity {
            return Err(ValidationError::RemainingExceedsQuantity);
        }
        Ok(())
    }
}
