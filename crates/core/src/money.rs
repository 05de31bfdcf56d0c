//! Money value object (non-negative, minor units).

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::VendingError;
use crate::value_object::ValueObject;

/// Non-negative monetary amount in minor units (cents).
///
/// `Money::from_minor(350)` displays as `3.50`. Arithmetic is checked; there
/// is no way to represent a negative amount.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    const MINOR_PER_MAJOR: u64 = 100;

    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Whole units (e.g. `Money::from_major(3)` is 3.00).
    pub fn from_major(major: u64) -> Option<Self> {
        major.checked_mul(Self::MINOR_PER_MAJOR).map(Self)
    }

    pub const fn minor(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / Self::MINOR_PER_MAJOR,
            self.0 % Self::MINOR_PER_MAJOR
        )
    }
}

impl FromStr for Money {
    type Err = VendingError;

    /// Parses `"3"`, `"3.5"` or `"3.50"`. At most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || VendingError::validation(format!("invalid money amount: {s:?}"));

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if s.ends_with('.') {
            return Err(invalid());
        }

        let major: u64 = whole.parse().map_err(|_| invalid())?;
        let minor: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        Money::from_major(major)
            .and_then(|m| m.checked_add(Money(minor)))
            .ok_or_else(invalid)
    }
}
