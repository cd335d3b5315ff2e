use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use moneydesk_core::{Aggregate, AggregateId, AggregateRoot, DomainError};
use moneydesk_events::Event;
use moneydesk_money::{InvoiceLineItem, InvoiceTotals, compute_invoice_totals};

/// Invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub AggregateId);

impl InvoiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Human-facing invoice number, `INV-<unix millis>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    pub fn generate(at: DateTime<Utc>) -> Self {
        Self(format!("INV-{}", at.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Invoice status lifecycle.
///
/// `draft → sent → paid`, with `sent → overdue` once the due date passes and
/// `cancelled` reachable from anything but `paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

/// How the client is asked to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    CashApp,
    Paypal,
    Zelle,
    Venmo,
    Check,
    Crypto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetails {
    pub name: String,
    pub email: String,
    pub address: String,
}

/// Everything on an invoice the sender edits. Totals are never part of it;
/// they are derived from `items` and `tax_rate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDetails {
    pub client: ClientDetails,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub items: Vec<InvoiceLineItem>,
    /// Percentage, e.g. `8.25`.
    pub tax_rate: Decimal,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_details: String,
}

impl InvoiceDetails {
    fn validate(&self) -> Result<InvoiceTotals, DomainError> {
        if self.client.name.trim().is_empty() {
            return Err(DomainError::validation("client name must not be empty"));
        }
        if self.due_date < self.invoice_date {
            return Err(DomainError::validation(
                "due date must not be before invoice date",
            ));
        }
        for item in &self.items {
            if item.quantity() <= Decimal::ZERO {
                return Err(DomainError::validation(
                    "invoice line quantity must be positive",
                ));
            }
        }
        Ok(compute_invoice_totals(&self.items, self.tax_rate)?)
    }
}

/// Aggregate root: Invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    number: Option<InvoiceNumber>,
    details: Option<InvoiceDetails>,
    totals: InvoiceTotals,
    status: InvoiceStatus,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Invoice {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: InvoiceId) -> Self {
        Self {
            id,
            number: None,
            details: None,
            totals: InvoiceTotals::ZERO,
            status: InvoiceStatus::Draft,
            created_at: None,
            updated_at: None,
            paid_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn number(&self) -> Option<&InvoiceNumber> {
        self.number.as_ref()
    }

    pub fn details(&self) -> Option<&InvoiceDetails> {
        self.details.as_ref()
    }

    pub fn client_name(&self) -> &str {
        self.details.as_ref().map(|d| d.client.name.as_str()).unwrap_or("")
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.details.as_ref().map(|d| d.due_date)
    }

    pub fn items(&self) -> &[InvoiceLineItem] {
        self.details.as_ref().map(|d| d.items.as_slice()).unwrap_or(&[])
    }

    pub fn totals(&self) -> InvoiceTotals {
        self.totals
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Sent and past its due date as of `as_of`.
    pub fn is_past_due(&self, as_of: DateTime<Utc>) -> bool {
        self.status == InvoiceStatus::Sent
            && self.due_date().is_some_and(|due| due < as_of.date_naive())
    }

    /// Invariant: only sent or overdue invoices can be paid.
    pub fn can_accept_payment(&self) -> bool {
        matches!(self.status, InvoiceStatus::Sent | InvoiceStatus::Overdue)
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub invoice_id: InvoiceId,
    pub invoice_number: InvoiceNumber,
    pub details: InvoiceDetails,
    /// Create directly in `sent` instead of `draft`.
    pub send: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReviseInvoice (replaces the editable details).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviseInvoice {
    pub invoice_id: InvoiceId,
    pub details: InvoiceDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SendInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendInvoice {
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkInvoicePaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkInvoicePaid {
    pub invoice_id: InvoiceId,
    pub paid_at: DateTime<Utc>,
}

/// Command: MarkInvoiceOverdue. A no-op unless the invoice is sent and past due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkInvoiceOverdue {
    pub invoice_id: InvoiceId,
    pub as_of: DateTime<Utc>,
}

/// Command: CancelInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelInvoice {
    pub invoice_id: InvoiceId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCommand {
    CreateInvoice(CreateInvoice),
    ReviseInvoice(ReviseInvoice),
    SendInvoice(SendInvoice),
    MarkInvoicePaid(MarkInvoicePaid),
    MarkInvoiceOverdue(MarkInvoiceOverdue),
    CancelInvoice(CancelInvoice),
}

/// Event: InvoiceCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCreated {
    pub invoice_id: InvoiceId,
    pub invoice_number: InvoiceNumber,
    pub details: InvoiceDetails,
    pub totals: InvoiceTotals,
    pub status: InvoiceStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceRevised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRevised {
    pub invoice_id: InvoiceId,
    pub details: InvoiceDetails,
    pub totals: InvoiceTotals,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceSent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSent {
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoicePaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePaid {
    pub invoice_id: InvoiceId,
    pub paid_at: DateTime<Utc>,
}

/// Event: InvoiceWentOverdue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceWentOverdue {
    pub invoice_id: InvoiceId,
    pub due_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCancelled {
    pub invoice_id: InvoiceId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    InvoiceCreated(InvoiceCreated),
    InvoiceRevised(InvoiceRevised),
    InvoiceSent(InvoiceSent),
    InvoicePaid(InvoicePaid),
    InvoiceWentOverdue(InvoiceWentOverdue),
    InvoiceCancelled(InvoiceCancelled),
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceCreated(_) => "invoicing.invoice.created",
            InvoiceEvent::InvoiceRevised(_) => "invoicing.invoice.revised",
            InvoiceEvent::InvoiceSent(_) => "invoicing.invoice.sent",
            InvoiceEvent::InvoicePaid(_) => "invoicing.invoice.paid",
            InvoiceEvent::InvoiceWentOverdue(_) => "invoicing.invoice.overdue",
            InvoiceEvent::InvoiceCancelled(_) => "invoicing.invoice.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::InvoiceCreated(e) => e.occurred_at,
            InvoiceEvent::InvoiceRevised(e) => e.occurred_at,
            InvoiceEvent::InvoiceSent(e) => e.occurred_at,
            InvoiceEvent::InvoicePaid(e) => e.paid_at,
            InvoiceEvent::InvoiceWentOverdue(e) => e.occurred_at,
            InvoiceEvent::InvoiceCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Invoice {
    type Command = InvoiceCommand;
    type Event = InvoiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceEvent::InvoiceCreated(e) => {
                self.id = e.invoice_id;
                self.number = Some(e.invoice_number.clone());
                self.details = Some(e.details.clone());
                self.totals = e.totals;
                self.status = e.status;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            InvoiceEvent::InvoiceRevised(e) => {
                self.details = Some(e.details.clone());
                self.totals = e.totals;
            }
            InvoiceEvent::InvoiceSent(_) => {
                self.status = InvoiceStatus::Sent;
            }
            InvoiceEvent::InvoicePaid(e) => {
                self.status = InvoiceStatus::Paid;
                self.paid_at = Some(e.paid_at);
            }
            InvoiceEvent::InvoiceWentOverdue(_) => {
                self.status = InvoiceStatus::Overdue;
            }
            InvoiceEvent::InvoiceCancelled(_) => {
                self.status = InvoiceStatus::Cancelled;
            }
        }

        self.updated_at = Some(event.occurred_at());
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceCommand::CreateInvoice(cmd) => self.handle_create(cmd),
            InvoiceCommand::ReviseInvoice(cmd) => self.handle_revise(cmd),
            InvoiceCommand::SendInvoice(cmd) => self.handle_send(cmd),
            InvoiceCommand::MarkInvoicePaid(cmd) => self.handle_mark_paid(cmd),
            InvoiceCommand::MarkInvoiceOverdue(cmd) => self.handle_mark_overdue(cmd),
            InvoiceCommand::CancelInvoice(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Invoice {
    fn ensure_created(&self, invoice_id: InvoiceId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != invoice_id {
            return Err(DomainError::invariant("invoice_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("invoice already exists"));
        }

        let totals = cmd.details.validate()?;
        if cmd.send && cmd.details.items.is_empty() {
            return Err(DomainError::validation(
                "cannot send invoice without line items",
            ));
        }

        let status = if cmd.send {
            InvoiceStatus::Sent
        } else {
            InvoiceStatus::Draft
        };

        Ok(vec![InvoiceEvent::InvoiceCreated(InvoiceCreated {
            invoice_id: cmd.invoice_id,
            invoice_number: cmd.invoice_number.clone(),
            details: cmd.details.clone(),
            totals,
            status,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revise(&self, cmd: &ReviseInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_created(cmd.invoice_id)?;

        if !matches!(
            self.status,
            InvoiceStatus::Draft | InvoiceStatus::Sent | InvoiceStatus::Overdue
        ) {
            return Err(DomainError::conflict(format!(
                "cannot revise a {:?} invoice",
                self.status
            )));
        }

        let totals = cmd.details.validate()?;
        if self.status != InvoiceStatus::Draft && cmd.details.items.is_empty() {
            return Err(DomainError::validation(
                "a sent invoice must keep at least one line item",
            ));
        }

        Ok(vec![InvoiceEvent::InvoiceRevised(InvoiceRevised {
            invoice_id: cmd.invoice_id,
            details: cmd.details.clone(),
            totals,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_send(&self, cmd: &SendInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_created(cmd.invoice_id)?;

        if self.status != InvoiceStatus::Draft {
            return Err(DomainError::conflict("only draft invoices can be sent"));
        }
        if self.items().is_empty() {
            return Err(DomainError::validation(
                "cannot send invoice without line items",
            ));
        }

        Ok(vec![InvoiceEvent::InvoiceSent(InvoiceSent {
            invoice_id: cmd.invoice_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_paid(&self, cmd: &MarkInvoicePaid) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_created(cmd.invoice_id)?;

        if self.status == InvoiceStatus::Paid {
            return Err(DomainError::conflict("invoice is already paid"));
        }
        if !self.can_accept_payment() {
            return Err(DomainError::invariant(
                "cannot mark a draft or cancelled invoice as paid",
            ));
        }

        Ok(vec![InvoiceEvent::InvoicePaid(InvoicePaid {
            invoice_id: cmd.invoice_id,
            paid_at: cmd.paid_at,
        })])
    }

    fn handle_mark_overdue(
        &self,
        cmd: &MarkInvoiceOverdue,
    ) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_created(cmd.invoice_id)?;

        // No-op unless still sent; the caller may be working from a stale listing.
        match self.due_date() {
            Some(due_date) if self.is_past_due(cmd.as_of) => {
                Ok(vec![InvoiceEvent::InvoiceWentOverdue(InvoiceWentOverdue {
                    invoice_id: cmd.invoice_id,
                    due_date,
                    occurred_at: cmd.as_of,
                })])
            }
            _ => Ok(vec![]),
        }
    }

    fn handle_cancel(&self, cmd: &CancelInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_created(cmd.invoice_id)?;

        match self.status {
            InvoiceStatus::Cancelled => Err(DomainError::conflict("invoice is already cancelled")),
            InvoiceStatus::Paid => Err(DomainError::invariant("cannot cancel a paid invoice")),
            _ => Ok(vec![InvoiceEvent::InvoiceCancelled(InvoiceCancelled {
                invoice_id: cmd.invoice_id,
                reason: cmd.reason.clone(),
                occurred_at: cmd.occurred_at,
            })]),
        }
    }
}
