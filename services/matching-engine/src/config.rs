//! Engine configuration
//!
//! Risk and capacity limits, fixed at construction and replaceable as a
//! whole via `MatchingEngine::update_config`.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use types::numeric::{Price, Quantity};

/// Configuration parameters for the matching engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Reject limit orders priced above this.
    pub max_order_price: Price,
    /// Reject any order larger than this.
    pub max_order_quantity: Quantity,
    /// Reject submissions that would push a book past this many resting
    /// orders.
    pub max_orders_per_symbol: usize,
    /// Cap on the number of order books.
    pub max_symbols: usize,
    /// When set, limit prices must also align to `tick_size`.
    pub strict_validation: bool,
    /// Gates the engine's own tracing output.
    pub enable_logging: bool,
    /// Advisory lifetime hint for clients; the engine never ages orders
    /// out itself.
    pub order_timeout: Duration,
    /// Price grid for limit orders, checked under `strict_validation`.
    pub tick_size: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_order_price: Price::from_u64(1_000_000),
            max_order_quantity: Quantity::new(1_000_000),
            max_orders_per_symbol: 10_000,
            max_symbols: 1_000,
            strict_validation: true,
            enable_logging: true,
            order_timeout: Duration::from_millis(5_000),
            tick_size: Decimal::new(1, 2), // 0.01
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = EngineConfig::default();
        assert_eq!(config.max_order_price, Price::from_u64(1_000_000));
        assert_eq!(config.max_order_quantity, Quantity::new(1_000_000));
        assert_eq!(config.max_orders_per_symbol, 10_000);
        assert_eq!(config.max_symbols, 1_000);
        assert!(config.strict_validation);
        assert_eq!(config.order_timeout, Duration::from_millis(5_000));
        assert_eq!(config.tick_size, Decimal::new(1, 2));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = EngineConfig {
            max_order_quantity: Quantity::new(100),
            ..EngineConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
