//! Unbounded decimal amounts for token and fiat settlement.
//!
//! Flow rates are expressed in the token's smallest unit per second and can be
//! multiplied by multi-year durations, so amounts are backed by `BigDecimal`
//! rather than a fixed-width decimal.

use crate::domain::Decimal;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Arbitrary-precision signed amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(BigDecimal);

impl Amount {
    /// Parse an amount from a decimal string (plain or scientific notation).
    pub fn from_str_canonical(s: &str) -> Result<Self, bigdecimal::ParseBigDecimalError> {
        BigDecimal::from_str(s.trim()).map(Amount)
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Amount(BigDecimal::from(0))
    }

    /// Exact amount for an integer count (seconds, units).
    pub fn from_i64(value: i64) -> Self {
        Amount(BigDecimal::from(value))
    }

    /// Lift a price into amount arithmetic without loss.
    pub fn from_decimal(value: Decimal) -> Self {
        let inner = value.inner();
        Amount(BigDecimal::new(
            BigInt::from(inner.mantissa()),
            i64::from(inner.scale()),
        ))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == BigDecimal::from(0)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < BigDecimal::from(0)
    }

    /// Divide by `10^decimals` exactly, converting base units into display units.
    pub fn scale_down(&self, decimals: u32) -> Self {
        let (digits, exponent) = self.0.as_bigint_and_exponent();
        Amount(BigDecimal::new(digits, exponent + i64::from(decimals)))
    }

    /// Plain decimal string without exponent or trailing zeros.
    pub fn to_canonical_string(&self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        self.0.normalized().to_plain_string()
    }

    pub fn inner(&self) -> &BigDecimal {
        &self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Amount {
    type Err = bigdecimal::ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<BigDecimal> for Amount {
    fn from(value: BigDecimal) -> Self {
        Amount(value)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Amount::from_str_canonical(&raw).map_err(serde::de::Error::custom)
    }
}

impl std::ops::Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl<'a> std::ops::Add<&'a Amount> for Amount {
    type Output = Amount;

    fn add(self, rhs: &'a Amount) -> Amount {
        Amount(self.0 + &rhs.0)
    }
}

impl std::ops::Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl<'a> std::ops::Mul<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn mul(self, rhs: &'a Amount) -> Amount {
        Amount(&self.0 * &rhs.0)
    }
}

impl std::ops::Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::zero(), |acc, value| acc + value)
    }
}
