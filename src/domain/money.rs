//! Integer minor-unit money type.
//!
//! Amounts are stored and compared as whole cents so threshold checks never
//! drift. rust_decimal is used only at the edges, to parse and print major
//! units ("1000.00").

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use thiserror::Error;

/// Money amount in cents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(pub i64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyParseError {
    #[error("not a decimal amount: {0}")]
    Invalid(String),
    #[error("more than two decimal places: {0}")]
    TooPrecise(String),
    #[error("amount out of range: {0}")]
    OutOfRange(String),
}

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub fn new(cents: i64) -> Self {
        Cents(cents)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Parse a major-unit amount such as `"300"` or `"25.50"`.
    ///
    /// # Errors
    /// Rejects non-numeric input and anything finer than one cent.
    pub fn from_major_str(s: &str) -> Result<Self, MoneyParseError> {
        let value =
            Decimal::from_str(s.trim()).map_err(|_| MoneyParseError::Invalid(s.to_string()))?;
        let cents = value * Decimal::ONE_HUNDRED;
        if cents.fract() != Decimal::ZERO {
            return Err(MoneyParseError::TooPrecise(s.to_string()));
        }
        i64::try_from(cents)
            .map(Cents)
            .map_err(|_| MoneyParseError::OutOfRange(s.to_string()))
    }

    /// Format as major units with exactly two decimals.
    pub fn to_major_string(&self) -> String {
        let mut value = Decimal::new(self.0, 2);
        value.rescale(2);
        value.to_string()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// How many whole `unit` amounts fit into `self`. Zero when `unit` is not positive.
    pub fn whole_multiples_of(&self, unit: Cents) -> i64 {
        if unit.0 <= 0 || self.0 <= 0 {
            return 0;
        }
        self.0 / unit.0
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Cents) {
        *self = *self + rhs;
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Self {
        iter.fold(Cents::ZERO, |acc, c| acc + c)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_major_string())
    }
}
