//! Monetary computations shared by invoices, checks and loans.
//!
//! Everything here is a pure function of its arguments: amount-to-words for
//! printed checks, invoice subtotal/tax/total arithmetic, the fixed monthly
//! payment of an amortizing loan, and the heuristic credit-score estimate used
//! to price loan applications. All arithmetic is done on
//! [`rust_decimal::Decimal`], never on binary floats.

pub mod amortization;
pub mod amount;
pub mod credit;
pub mod error;
pub mod totals;
pub mod words;

pub use amortization::{LoanTerms, amortized_payment};
pub use amount::MonetaryAmount;
pub use credit::{CreditScore, estimate_credit_score};
pub use error::{MoneyError, MoneyResult};
pub use totals::{InvoiceLineItem, InvoiceTotals, compute_invoice_totals};
pub use words::amount_to_words;
