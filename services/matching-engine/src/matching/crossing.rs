//! Crossing detection
//!
//! A buy crosses a resting sell when the bid is at or above the ask;
//! symmetric for sells. Market orders (no price) cross unconditionally.

use types::numeric::Price;
use types::order::Side;

/// Check whether an incoming order can trade against the best resting
/// level on the opposite side.
///
/// `incoming_price` is `None` for market orders.
pub fn crosses(incoming_side: Side, incoming_price: Option<Price>, resting_price: Price) -> bool {
    match incoming_price {
        None => true, // market order: any price
        Some(price) => match incoming_side {
            Side::Buy => price >= resting_price,
            Side::Sell => price <= resting_price,
        },
    }
}
