use rust_decimal::Decimal;
use thiserror::Error;

use moneydesk_core::DomainError;

pub type MoneyResult<T> = Result<T, MoneyError>;

/// Failure of a monetary computation.
///
/// Every calculator rejects bad input at the boundary instead of producing a
/// meaningless figure (a negative check legend, an infinite loan payment).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: Decimal },

    #[error("{field} is out of range: {detail}")]
    OutOfRange { field: &'static str, detail: String },

    #[error("loan term must be at least one month")]
    ZeroTerm,

    #[error("arithmetic overflow while computing {0}")]
    Overflow(&'static str),
}

impl MoneyError {
    pub(crate) fn negative(field: &'static str, value: Decimal) -> Self {
        Self::Negative { field, value }
    }

    pub(crate) fn out_of_range(field: &'static str, detail: impl Into<String>) -> Self {
        Self::OutOfRange {
            field,
            detail: detail.into(),
        }
    }
}

impl From<MoneyError> for DomainError {
    fn from(value: MoneyError) -> Self {
        match value {
            MoneyError::Overflow(_) => DomainError::invariant(value.to_string()),
            _ => DomainError::validation(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn input_errors_map_to_validation_and_overflow_to_invariant() {
        let negative: DomainError = MoneyError::negative("amount", dec!(-1)).into();
        assert!(matches!(negative, DomainError::Validation(msg) if msg.contains("amount")));

        let zero_term: DomainError = MoneyError::ZeroTerm.into();
        assert!(matches!(zero_term, DomainError::Validation(_)));

        let overflow: DomainError = MoneyError::Overflow("subtotal").into();
        assert!(matches!(overflow, DomainError::InvariantViolation(_)));
    }
}
