//! Money types with precise decimal arithmetic
//!
//! All amounts in the ledger are held in a single local currency (Iraqi
//! dinar), so `Money` carries no currency tag. Arithmetic uses
//! rust_decimal to avoid floating-point drift when installment totals are
//! summed over many payments.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Display code of the ledger currency
pub const CURRENCY_CODE: &str = "IQD";

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount must be positive: {0}")]
    NotPositive(Decimal),
}

/// A monetary amount in the ledger currency
///
/// Amounts are stored with 4 decimal places internally. Negative values are
/// representable so that intermediate differences can be inspected, but the
/// balance computations go through [`Money::saturating_sub`], which never
/// drops below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp(4))
    }

    /// Creates a zero amount
    pub fn zero() -> Self {
        Self(dec!(0))
    }

    /// Creates Money from a whole number of dinars
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Subtracts `other`, flooring the result at zero
    ///
    /// # Examples
    ///
    /// ```
    /// use core_kernel::Money;
    /// use rust_decimal_macros::dec;
    ///
    /// let paid = Money::new(dec!(150000));
    /// let total = Money::new(dec!(100000));
    /// assert!(total.saturating_sub(paid).is_zero());
    /// ```
    pub fn saturating_sub(self, other: Money) -> Money {
        if other.0 >= self.0 {
            Money::zero()
        } else {
            Money::new(self.0 - other.0)
        }
    }

    /// Returns `Some(self)` when the amount is non-zero
    ///
    /// Used where the legacy data treats a zero amount as "not set".
    pub fn non_zero(self) -> Option<Money> {
        if self.is_zero() {
            None
        } else {
            Some(self)
        }
    }

    /// Validates that the amount is strictly positive
    pub fn ensure_positive(self) -> Result<Money, MoneyError> {
        if self.is_positive() {
            Ok(self)
        } else {
            Err(MoneyError::NotPositive(self.0))
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0.normalize(), CURRENCY_CODE)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money::new)
            .map_err(|_| MoneyError::InvalidAmount(s.to_string()))
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money::new(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Money::new(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Money::new(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let m = Money::new(dec!(150000.50));
        assert_eq!(m.amount(), dec!(150000.50));
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(dec!(100000));
        let b = Money::new(dec!(25000));

        assert_eq!((a + b).amount(), dec!(125000));
        assert_eq!((a - b).amount(), dec!(75000));
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        let a = Money::new(dec!(10));
        let b = Money::new(dec!(25));
        assert_eq!(a.saturating_sub(b), Money::zero());
        assert_eq!(b.saturating_sub(a).amount(), dec!(15));
    }

    #[test]
    fn test_display_includes_currency() {
        let m = Money::new(dec!(50000.00));
        assert_eq!(m.to_string(), "50000 IQD");
    }

    #[test]
    fn test_sum() {
        let total: Money = [dec!(1), dec!(2.5), dec!(3)]
            .into_iter()
            .map(Money::new)
            .sum();
        assert_eq!(total.amount(), dec!(6.5));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn saturating_sub_is_never_negative(
            a in 0i64..1_000_000_000i64,
            b in 0i64..1_000_000_000i64
        ) {
            let diff = Money::from_units(a).saturating_sub(Money::from_units(b));
            prop_assert!(!diff.is_negative());
        }

        #[test]
        fn add_then_sub_restores_value(
            a in 0i64..1_000_000_000i64,
            b in 1i64..1_000_000_000i64
        ) {
            let base = Money::from_units(a);
            let delta = Money::from_units(b);
            prop_assert_eq!((base + delta).saturating_sub(delta), base);
        }
    }
}
