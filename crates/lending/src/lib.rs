//! Lending domain module (event-sourced).
//!
//! Loan applications, approval, disbursement and repayment, plus the pricing
//! table that turns a credit score into an interest rate.

pub mod loan;
pub mod pricing;

pub use loan::{
    ApplyForLoan, ApproveLoan, DisburseLoan, Loan, LoanApplication, LoanApplied, LoanApproved,
    LoanCommand, LoanDefaulted, LoanDisbursed, LoanEvent, LoanId, LoanRejected, LoanStatus,
    LoanType, MarkDefaulted, RecordRepayment, RejectLoan, RepaymentRecorded,
};
pub use pricing::{MIN_INTEREST_RATE, quote_interest_rate};
