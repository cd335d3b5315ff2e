//! Fixed monthly payment of a fully amortizing loan.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{MoneyError, MoneyResult};

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Inputs to the amortization formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Decimal,
    pub annual_rate_percent: Decimal,
    pub term_months: u32,
}

impl LoanTerms {
    pub fn new(principal: Decimal, annual_rate_percent: Decimal, term_months: u32) -> MoneyResult<Self> {
        let terms = Self {
            principal,
            annual_rate_percent,
            term_months,
        };
        terms.validate()?;
        Ok(terms)
    }

    pub fn validate(&self) -> MoneyResult<()> {
        if self.principal.is_sign_negative() && !self.principal.is_zero() {
            return Err(MoneyError::negative("principal", self.principal));
        }
        if self.annual_rate_percent.is_sign_negative() && !self.annual_rate_percent.is_zero() {
            return Err(MoneyError::negative("annual rate", self.annual_rate_percent));
        }
        if self.term_months == 0 {
            return Err(MoneyError::ZeroTerm);
        }
        Ok(())
    }

    pub fn monthly_rate(&self) -> Decimal {
        self.annual_rate_percent / Decimal::ONE_HUNDRED / MONTHS_PER_YEAR
    }
}

/// Monthly payment for `terms`.
///
/// With `r` the monthly rate and `n` the term in months:
/// `P * r(1+r)^n / ((1+r)^n - 1)`, or `P / n` when `r` is zero. The result is
/// not rounded; round at display time.
pub fn amortized_payment(terms: &LoanTerms) -> MoneyResult<Decimal> {
    terms.validate()?;

    let months = Decimal::from(terms.term_months);
    let straight_line = || {
        terms
            .principal
            .checked_div(months)
            .ok_or(MoneyError::Overflow("monthly payment"))
    };

    let rate = terms.monthly_rate();
    if rate.is_zero() {
        return straight_line();
    }

    let growth = (Decimal::ONE + rate)
        .checked_powu(u64::from(terms.term_months))
        .ok_or(MoneyError::Overflow("compound growth"))?;
    let denominator = growth - Decimal::ONE;
    // A rate below Decimal precision compounds to exactly one.
    if denominator.is_zero() {
        return straight_line();
    }

    terms
        .principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(growth))
        .and_then(|v| v.checked_div(denominator))
        .ok_or(MoneyError::Overflow("monthly payment"))
}
