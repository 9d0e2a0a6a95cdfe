//! Identifier types for engine entities
//!
//! Order and trade identifiers are plain 64-bit integers assigned by the
//! caller (orders) or by the order book (trades); 0 is reserved as the
//! invalid sentinel. Symbols are validated byte-for-byte on construction
//! and never normalized.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

/// Reserved invalid order identifier.
pub const INVALID_ORDER_ID: u64 = 0;

/// Reserved invalid trade identifier.
pub const INVALID_TRADE_ID: u64 = 0;

/// Maximum symbol length in bytes.
pub const MAX_SYMBOL_LEN: usize = 8;

/// Unique identifier for an order.
///
/// Assigned by the submitting client; the engine only requires uniqueness
/// among live orders of one book. Zero is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Create an OrderId from a raw value (0 is allowed here; rejected by
    /// order validation).
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw identifier value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Check that this is not the reserved invalid identifier.
    pub fn is_valid(&self) -> bool {
        self.0 != INVALID_ORDER_ID
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a trade.
///
/// Strictly increasing within one order book, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(u64);

impl TradeId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != INVALID_TRADE_ID
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trading symbol (instrument identifier)
///
/// 1 to 8 ASCII alphanumeric bytes. Bytes are preserved verbatim as
/// submitted: "aapl" and "AAPL" are distinct symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol from a string
    ///
    /// # Panics
    /// Panics if the string is not 1-8 ASCII alphanumeric bytes
    pub fn new(symbol: impl Into<String>) -> Self {
        let s = symbol.into();
        assert!(Self::is_valid(&s), "symbol must be 1-8 alphanumeric bytes");
        Self(s)
    }

    /// Try to create a Symbol, returning a validation error if invalid
    pub fn try_new(symbol: impl Into<String>) -> Result<Self, ValidationError> {
        let s = symbol.into();
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidSymbol { symbol: s })
        }
    }

    /// The shape predicate: non-empty, at most 8 bytes, ASCII alphanumeric.
    pub fn is_valid(s: &str) -> bool {
        !s.is_empty() && s.len() <= MAX_SYMBOL_LEN && s.bytes().all(|b| b.is_ascii_alphanumeric())
    }

    /// Get the symbol string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
