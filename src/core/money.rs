use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Monetary amount stored as signed integer cents.
///
/// Every balance, split and settlement amount in the engine is a `Money`, so
/// ledger arithmetic is exact and the 0.01 tolerances of the interface become
/// one-cent integer comparisons. Decimal (major-unit) values only appear at
/// the API boundary via [`Money::from_major`] / [`Money::to_major`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Converts a major-unit decimal value to cents, rounding half away from
    /// zero. Returns `None` for non-finite input or values outside the range
    /// representable in cents.
    pub fn from_major(value: f64) -> Option<Money> {
        if !value.is_finite() {
            return None;
        }
        let cents = (value * 100.0).round();
        if cents.abs() > 9.0e15 {
            return None;
        }
        Some(Money(cents as i64))
    }

    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn abs(self) -> Money {
        Money(self.0.abs())
    }

    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Money) -> Money {
        Money(self.0.max(other.0))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

// JSON carries major-unit decimals; the integer-cent representation is
// internal.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_major(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid monetary amount: {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_major_rounds_to_nearest_cent() {
        assert_eq!(Money::from_major(10.006).unwrap().cents(), 1001);
        assert_eq!(Money::from_major(10.004).unwrap().cents(), 1000);
        assert_eq!(Money::from_major(33.33).unwrap().cents(), 3333);
        assert_eq!(Money::from_major(-10.006).unwrap().cents(), -1001);
    }

    #[test]
    fn from_major_rejects_non_finite() {
        assert!(Money::from_major(f64::NAN).is_none());
        assert!(Money::from_major(f64::INFINITY).is_none());
    }

    #[test]
    fn display_pads_cents() {
        assert_eq!(Money::from_cents(905).to_string(), "9.05");
        assert_eq!(Money::from_cents(-50).to_string(), "-0.50");
    }
}
