//! Invoicing domain module (event-sourced).
//!
//! Business rules for client invoices: line items, tax, status lifecycle and
//! due-date handling. Deterministic domain logic only (no IO, no storage).

pub mod invoice;

pub use invoice::{
    CancelInvoice, ClientDetails, CreateInvoice, Invoice, InvoiceCancelled, InvoiceCommand,
    InvoiceCreated, InvoiceDetails, InvoiceEvent, InvoiceId, InvoiceNumber, InvoicePaid,
    InvoiceRevised, InvoiceSent, InvoiceStatus, InvoiceWentOverdue, MarkInvoiceOverdue,
    MarkInvoicePaid, PaymentMethod, ReviseInvoice, SendInvoice,
};
