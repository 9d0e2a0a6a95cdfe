//! Fixed-point price and integer quantity types
//!
//! Prices use rust_decimal for deterministic arithmetic (no floating-point
//! errors); map keys and level aggregation rely on exact equality, which
//! binary floats cannot provide. Quantities are unsigned 64-bit integers.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Minimum valid limit-order price (one default tick).
pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// Maximum valid limit-order price.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0); // 1e9

/// Minimum valid order quantity.
pub const MIN_QUANTITY: u64 = 1;

/// Maximum valid order quantity.
pub const MAX_QUANTITY: u64 = 1_000_000_000;

/// Price type with fixed-point decimal representation
///
/// Always strictly positive; market orders carry no price at all rather
/// than a zero sentinel. Serialized as string to prevent JSON number
/// precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price from a Decimal
    ///
    /// # Panics
    /// Panics if the price is negative or zero
    pub fn new(value: Decimal) -> Self {
        assert!(value > Decimal::ZERO, "Price must be positive");
        Self(value)
    }

    /// Try to create a Price, returning None if not strictly positive
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from integer (for testing/convenience)
    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Create from string
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self::new(decimal))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Check that the price lies within the valid limit-order range.
    pub fn in_valid_range(&self) -> bool {
        self.0 >= MIN_PRICE && self.0 <= MAX_PRICE
    }

    /// Check that the price is a whole multiple of the given tick size.
    pub fn aligned_to(&self, tick: Decimal) -> bool {
        tick > Decimal::ZERO && (self.0 % tick).is_zero()
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Decimal;

    // Spread arithmetic: the difference may legitimately be zero, so the
    // result is a plain Decimal rather than a Price.
    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

// Custom serialization to preserve precision
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("Price must be positive"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity in whole units
///
/// Order quantities are validated into `[MIN_QUANTITY, MAX_QUANTITY]`;
/// residual quantities may reach zero as fills accumulate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    /// Create a new Quantity from a raw unit count
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Zero quantity (fully filled residual)
    pub fn zero() -> Self {
        Self(0)
    }

    /// Get the raw unit count
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Check if quantity is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check that an order quantity lies within the valid range.
    pub fn in_valid_range(&self) -> bool {
        (MIN_QUANTITY..=MAX_QUANTITY).contains(&self.0)
    }

    /// The smaller of two quantities (per-match fill size).
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "Quantity subtraction would be negative");
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
