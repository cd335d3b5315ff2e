//! Interest-rate quote from credit score and loan type.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use moneydesk_money::CreditScore;

use crate::loan::LoanType;

/// No quote goes below this annual percentage.
pub const MIN_INTEREST_RATE: Decimal = dec!(3.0);

/// Minimum score and base annual rate, best tier first.
const SCORE_TIERS: [(u16, Decimal); 3] = [(750, dec!(6.5)), (700, dec!(7.5)), (650, dec!(8.5))];

const SUBPRIME_RATE: Decimal = dec!(12.0);

/// Annual percentage rate offered for `score` on a `loan_type` loan.
///
/// Secured loans are cheaper (home −2.0, auto −1.0), business loans dearer
/// (+1.5). The result never drops below [`MIN_INTEREST_RATE`].
pub fn quote_interest_rate(score: CreditScore, loan_type: LoanType) -> Decimal {
    let base = SCORE_TIERS
        .iter()
        .find(|(floor, _)| score.value() >= *floor)
        .map(|(_, rate)| *rate)
        .unwrap_or(SUBPRIME_RATE);

    let adjustment = match loan_type {
        LoanType::Home => dec!(-2.0),
        LoanType::Auto => dec!(-1.0),
        LoanType::Business => dec!(1.5),
        LoanType::Personal => Decimal::ZERO,
    };

    (base + adjustment).max(MIN_INTEREST_RATE)
}
