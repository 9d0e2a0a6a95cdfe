//! Error types for the matching engine
//!
//! Error taxonomy using thiserror: validation errors (input shape wrong),
//! policy errors (input refused by configuration), and state errors. All
//! variants travel up to the caller; nothing is retried internally.

use std::fmt;
use thiserror::Error;

/// Top-level engine error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid order: {0}")]
    InvalidOrder(#[from] ValidationError),

    #[error("risk limit exceeded: {limit}")]
    RiskLimitExceeded { limit: RiskLimit },

    #[error("unknown symbol: {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("engine is stopped")]
    EngineStopped,

    #[error("symbol already exists: {symbol}")]
    SymbolExists { symbol: String },

    #[error("symbol has resting orders: {symbol}")]
    SymbolNotEmpty { symbol: String },
}

/// Order shape validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("order id 0 is reserved")]
    ReservedOrderId,

    #[error("invalid symbol: {symbol:?}")]
    InvalidSymbol { symbol: String },

    #[error("limit price {price} outside valid range")]
    PriceOutOfRange { price: String },

    #[error("limit price {price} not aligned to tick size {tick}")]
    PriceNotTickAligned { price: String, tick: String },

    #[error("limit order has no price")]
    MissingLimitPrice,

    #[error("market order carries a price")]
    MarketOrderWithPrice,

    #[error("quantity {quantity} outside valid range")]
    QuantityOutOfRange { quantity: u64 },

    #[error("remaining quantity exceeds order quantity")]
    RemainingExceedsQuantity,
}

/// Which configured risk limit refused an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLimit {
    MaxOrderPrice,
    MaxOrderQuantity,
    MaxOrdersPerSymbol,
    MaxSymbols,
}

impl fmt::Display for RiskLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskLimit::MaxOrderPrice => "max_order_price",
            RiskLimit::MaxOrderQuantity => "max_order_quantity",
            RiskLimit::MaxOrdersPerSymbol => "max_orders_per_symbol",
            RiskLimit::MaxSymbols => "max_symbols",
        };
        write!(f, "{}", name)
    }
}
