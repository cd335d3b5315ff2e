//! Non-negative dollars-and-cents value.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use moneydesk_core::ValueObject;

use crate::error::{MoneyError, MoneyResult};

/// Round to the nearest cent, halves away from zero, and pad to two places.
pub(crate) fn round_to_cents(value: Decimal) -> Decimal {
    let mut cents = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    cents
}

/// A non-negative amount of money held at cent precision.
///
/// Construction rounds to the nearest cent, so `12.345` becomes `12.35` and
/// every later computation starts from a representable amount. The scale is
/// always two, so `2` is stored and serialized as `2.00`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct MonetaryAmount(Decimal);

impl MonetaryAmount {
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, 2));

    pub fn new(value: Decimal) -> MoneyResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MoneyError::negative("amount", value));
        }
        // Normalizes -0 as well.
        Ok(Self(round_to_cents(value.abs())))
    }

    /// Build from an integer number of cents.
    pub fn from_cents(cents: u64) -> Self {
        Self(Decimal::from_i128_with_scale(i128::from(cents), 2))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whole dollars (the amount with its cents dropped).
    pub fn whole_dollars(&self) -> MoneyResult<u64> {
        self.0
            .trunc()
            .to_u64()
            .ok_or_else(|| MoneyError::out_of_range("amount", format!("{} dollars", self.0)))
    }

    /// Cents part, `0..=99`.
    pub fn cents(&self) -> u32 {
        ((self.0 - self.0.trunc()) * Decimal::ONE_HUNDRED)
            .to_u32()
            .unwrap_or(0)
    }

    pub fn checked_add(self, other: Self) -> MoneyResult<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MoneyError::Overflow("amount sum"))
    }

    /// Difference, floored at zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }
}

impl ValueObject for MonetaryAmount {}

impl TryFrom<Decimal> for MonetaryAmount {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MonetaryAmount> for Decimal {
    fn from(value: MonetaryAmount) -> Self {
        value.0
    }
}

impl core::fmt::Display for MonetaryAmount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
