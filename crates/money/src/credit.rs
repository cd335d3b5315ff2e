//! Heuristic credit-score estimate used to price loan applications.
//!
//! This is a demo risk gate, not a bureau score: income and employment set a
//! baseline and a random term spreads applicants out. The randomness is
//! injected so callers can seed it.

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{MoneyError, MoneyResult};

pub const MIN_CREDIT_SCORE: u16 = 300;
pub const MAX_CREDIT_SCORE: u16 = 850;

const BASE_SCORE: i32 = 500;

/// Income floor and bonus, highest bracket first.
const INCOME_TIERS: [(Decimal, i32); 4] = [
    (dec!(100000), 150),
    (dec!(75000), 100),
    (dec!(50000), 75),
    (dec!(30000), 50),
];

/// Employment keyword and bonus; the first match wins.
const EMPLOYMENT_BONUSES: [(&str, i32); 3] = [
    ("full-time", 50),
    ("part-time", 25),
    ("self-employed", 30),
];

/// A credit score in `[300, 850]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct CreditScore(u16);

impl CreditScore {
    pub fn new(value: u16) -> MoneyResult<Self> {
        if !(MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&value) {
            return Err(MoneyError::out_of_range(
                "credit score",
                format!("{value} is outside {MIN_CREDIT_SCORE}..={MAX_CREDIT_SCORE}"),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for CreditScore {
    type Error = MoneyError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CreditScore> for u16 {
    fn from(value: CreditScore) -> Self {
        value.0
    }
}

impl core::fmt::Display for CreditScore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Estimate a score from annual income and a free-text employment status.
///
/// Base 500, plus an income bracket bonus (50–150), plus an employment bonus
/// (0–50, matched case-insensitively by substring), plus a uniform random
/// integer in `[-50, 49]`, clamped to `[300, 850]`.
pub fn estimate_credit_score<R>(
    annual_income: Decimal,
    employment_status: &str,
    rng: &mut R,
) -> MoneyResult<CreditScore>
where
    R: Rng + ?Sized,
{
    if annual_income.is_sign_negative() && !annual_income.is_zero() {
        return Err(MoneyError::negative("annual income", annual_income));
    }

    let variance: i32 = rng.gen_range(-50..50);
    let score = (BASE_SCORE + income_bonus(annual_income) + employment_bonus(employment_status) + variance)
        .clamp(i32::from(MIN_CREDIT_SCORE), i32::from(MAX_CREDIT_SCORE));

    CreditScore::new(score as u16)
}

fn income_bonus(annual_income: Decimal) -> i32 {
    INCOME_TIERS
        .iter()
        .find(|(floor, _)| annual_income >= *floor)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0)
}

fn employment_bonus(employment_status: &str) -> i32 {
    let status = employment_status.to_lowercase();
    EMPLOYMENT_BONUSES
        .iter()
        .find(|(keyword, _)| status.contains(keyword))
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn income_brackets() {
        assert_eq!(income_bonus(dec!(150000)), 150);
        assert_eq!(income_bonus(dec!(100000)), 150);
        assert_eq!(income_bonus(dec!(99999.99)), 100);
        assert_eq!(income_bonus(dec!(50000)), 75);
        assert_eq!(income_bonus(dec!(30000)), 50);
        assert_eq!(income_bonus(dec!(29999)), 0);
    }

    #[test]
    fn employment_matching_is_case_insensitive_and_ordered() {
        assert_eq!(employment_bonus("Full-Time engineer"), 50);
        assert_eq!(employment_bonus("PART-TIME"), 25);
        assert_eq!(employment_bonus("self-employed contractor"), 30);
        assert_eq!(employment_bonus("full-time, also part-time"), 50);
        assert_eq!(employment_bonus("retired"), 0);
    }

    #[test]
    fn score_stays_within_variance_of_baseline() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let score = estimate_credit_score(dec!(120000), "full-time", &mut rng).unwrap();
            // 500 + 150 + 50 = 700, variance [-50, 49]
            assert!((650..=749).contains(&score.value()));
        }
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let a = estimate_credit_score(dec!(40000), "part-time", &mut StdRng::seed_from_u64(42)).unwrap();
        let b = estimate_credit_score(dec!(40000), "part-time", &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn negative_income_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            estimate_credit_score(dec!(-1), "full-time", &mut rng),
            Err(MoneyError::Negative { .. })
        ));
    }

    #[test]
    fn score_bounds_are_enforced() {
        assert!(CreditScore::new(299).is_err());
        assert!(CreditScore::new(851).is_err());
        assert_eq!(CreditScore::new(850).unwrap().value(), 850);
    }

    proptest! {
        /// Property: any non-negative income and any status yields a score in [300, 850].
        #[test]
        fn score_always_in_range(income in 0u64..10_000_000, status in ".{0,40}", seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let score = estimate_credit_score(Decimal::from(income), &status, &mut rng).unwrap();
            prop_assert!((MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&score.value()));
        }
    }
}
