//! Type-safe price representation using decimal arithmetic.
//!
//! The shop sells in Indian rupees only, so a [`Price`] carries no currency
//! field. Amounts are whole rupees on the wire (`"price": 249`) but the type
//! keeps decimal precision so totals never go through floating point.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A rupee amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero rupees.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from whole rupees.
    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Line total for `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract().is_zero() {
            write!(f, "\u{20b9}{}", self.0.trunc())
        } else {
            write!(f, "\u{20b9}{:.2}", self.0)
        }
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        self.times(rhs)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<i64> for Price {
    fn from(rupees: i64) -> Self {
        Self::from_rupees(rupees)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract().is_zero()
            && let Some(whole) = self.0.to_i64()
        {
            return serializer.serialize_i64(whole);
        }
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a numeric rupee amount")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        Ok(Price(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        Ok(Price(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        Decimal::try_from(v)
            .map(Price)
            .map_err(|_| E::custom(format!("price {v} is not representable")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        Decimal::from_str(v.trim())
            .map(Price)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_integer_and_float() {
        let whole: Price = serde_json::from_str("249").unwrap();
        assert_eq!(whole, Price::from_rupees(249));

        let fractional: Price = serde_json::from_str("99.5").unwrap();
        assert_eq!(fractional.amount(), Decimal::new(995, 1));
    }

    #[test]
    fn test_serialize_whole_amount_as_integer() {
        assert_eq!(
            serde_json::to_string(&Price::from_rupees(150)).unwrap(),
            "150"
        );
    }

    #[test]
    fn test_line_totals_and_sum() {
        let total: Price = [Price::from_rupees(100) * 2, Price::from_rupees(45).times(3)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_rupees(335));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_rupees(1200).to_string(), "\u{20b9}1200");
        assert_eq!(Price::new(Decimal::new(995, 1)).to_string(), "\u{20b9}99.50");
    }
}
