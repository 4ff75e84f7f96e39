//! Fixed-point price and integral quantity types
//!
//! Prices use rust_decimal so that price-keyed containers iterate
//! deterministically (no floating-point representation drift).
//! Quantities are integral share counts.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Price with fixed-point decimal representation
///
/// Non-negative. A price of zero is the sentinel carried by MARKET
/// orders, which have no limit. Serialized as a string to prevent
/// JSON number precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Zero price (the MARKET sentinel)
    pub const ZERO: Price = Price(Decimal::ZERO);

    /// Create a new Price from a Decimal
    ///
    /// # Panics
    /// Panics if the price is negative
    pub fn new(value: Decimal) -> Self {
        assert!(value >= Decimal::ZERO, "Price must be non-negative");
        Self(value)
    }

    /// Try to create a Price, returning None if negative
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from integer
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
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

    /// Check if this is the zero sentinel
    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "Price subtraction would result in negative");
        Self(self.0 - rhs.0)
    }
}

impl Mul<Quantity> for Price {
    type Output = Decimal;

    fn mul(self, rhs: Quantity) -> Self::Output {
        self.0 * rhs.as_decimal()
    }
}

// Serialized as a string to preserve precision
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
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("Price must be non-negative"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integral order/fill quantity
///
/// Order sizes and fill sizes are whole units; partial-fill
/// bookkeeping never produces fractions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    /// Create a new Quantity
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Zero quantity
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Get the value as a Decimal, for notional arithmetic
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Check if quantity is zero
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(value)
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
        assert!(self.0 >= rhs.0, "Quantity subtraction would underflow");
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Self) {
        assert!(self.0 >= rhs.0, "Quantity subtraction would underflow");
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_creation() {
        let price = Price::from_u64(150);
        assert_eq!(price.as_decimal(), Decimal::from(150));
    }

    #[test]
    fn test_price_zero_sentinel() {
        assert!(Price::ZERO.is_zero());
        assert!(Price::try_new(Decimal::ZERO).is_some());
    }

    #[test]
    #[should_panic(expected = "Price must be non-negative")]
    fn test_price_negative_panics() {
        Price::new(Decimal::from(-100));
    }

    #[test]
    fn test_price_try_new_negative() {
        assert!(Price::try_new(Decimal::from(-1)).is_none());
    }

    #[test]
    fn test_price_arithmetic() {
        let p1 = Price::from_u64(100);
        let p2 = Price::from_u64(50);

        assert_eq!(p1 + p2, Price::from_u64(150));
        assert_eq!(p1 - p2, Price::from_u64(50));
    }

    #[test]
    fn test_price_ordering_exact() {
        // 150.1 round-trips exactly through Decimal, unlike f64
        let a = Price::from_str("150.1").unwrap();
        let b = Price::from_str("150.10").unwrap();
        assert_eq!(a, b);
        assert!(a < Price::from_str("150.2").unwrap());
    }

    #[test]
    fn test_price_serialization() {
        let price = Price::from_str("150.25").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"150.25\"");

        let deserialized: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, deserialized);
    }

    #[test]
    fn test_price_times_quantity() {
        let notional = Price::from_u64(150) * Quantity::new(100);
        assert_eq!(notional, Decimal::from(15_000));
    }

    #[test]
    fn test_quantity_arithmetic() {
        let mut q = Quantity::new(100);
        q -= Quantity::new(30);
        assert_eq!(q, Quantity::new(70));
        q += Quantity::new(5);
        assert_eq!(q.as_u64(), 75);
    }

    #[test]
    #[should_panic(expected = "Quantity subtraction would underflow")]
    fn test_quantity_underflow_panics() {
        let _ = Quantity::new(1) - Quantity::new(2);
    }

    #[test]
    fn test_quantity_min_via_ord() {
        assert_eq!(Quantity::new(3).min(Quantity::new(7)), Quantity::new(3));
    }
}
