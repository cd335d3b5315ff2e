//! Application services: one per record kind.
//!
//! Each service owns a [`CommandDispatcher`](crate::command_dispatcher::CommandDispatcher)
//! over the shared event store, stamps commands with the current time and
//! answers the list / search / stats queries by rehydrating streams.

pub mod checks;
pub mod invoices;
pub mod loans;

pub use checks::{CheckService, CheckStats, CHECK_AGGREGATE};
pub use invoices::{InvoiceService, InvoiceStats, INVOICE_AGGREGATE};
pub use loans::{LOAN_AGGREGATE, LoanService, PaymentQuote, quote_payment};

/// Case-insensitive substring match used by the search queries.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
