use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use moneydesk_core::AggregateId;
use moneydesk_invoicing::{
    CancelInvoice, CreateInvoice, Invoice, InvoiceCommand, InvoiceDetails, InvoiceId,
    InvoiceNumber, InvoiceStatus, MarkInvoiceOverdue, MarkInvoicePaid, ReviseInvoice, SendInvoice,
};

use super::contains_ignore_case;
use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::EventStore;

pub const INVOICE_AGGREGATE: &str = "invoicing.invoice";

/// Dashboard figures over all invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceStats {
    pub total: usize,
    pub draft: usize,
    pub sent: usize,
    pub paid: usize,
    pub overdue: usize,
    pub cancelled: usize,
    /// Sum of paid invoice totals.
    pub total_revenue: Decimal,
    /// Sum of sent and overdue invoice totals.
    pub pending_amount: Decimal,
}

#[derive(Debug)]
pub struct InvoiceService<S> {
    dispatcher: CommandDispatcher<S>,
}

impl<S: EventStore> InvoiceService<S> {
    pub fn new(store: S) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store),
        }
    }

    fn execute(&self, invoice_id: InvoiceId, command: InvoiceCommand) -> Result<Invoice, DispatchError> {
        self.dispatcher
            .dispatch(invoice_id.0, INVOICE_AGGREGATE, command, |id| {
                Invoice::empty(InvoiceId::new(id))
            })
            .inspect_err(|err| {
                tracing::warn!(invoice_id = %invoice_id, error = %err, "invoice command rejected");
            })
    }

    /// Create a new invoice, either as a draft or already sent.
    pub fn create(&self, details: InvoiceDetails, send: bool) -> Result<Invoice, DispatchError> {
        let now = Utc::now();
        let invoice_id = InvoiceId::new(AggregateId::new());
        let invoice = self.execute(
            invoice_id,
            InvoiceCommand::CreateInvoice(CreateInvoice {
                invoice_id,
                invoice_number: InvoiceNumber::generate(now),
                details,
                send,
                occurred_at: now,
            }),
        )?;
        tracing::info!(
            invoice_id = %invoice_id,
            status = ?invoice.status(),
            total = %invoice.totals().total_amount,
            "invoice created"
        );
        Ok(invoice)
    }

    pub fn revise(&self, invoice_id: InvoiceId, details: InvoiceDetails) -> Result<Invoice, DispatchError> {
        let invoice = self.execute(
            invoice_id,
            InvoiceCommand::ReviseInvoice(ReviseInvoice {
                invoice_id,
                details,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(invoice_id = %invoice_id, total = %invoice.totals().total_amount, "invoice revised");
        Ok(invoice)
    }

    pub fn send(&self, invoice_id: InvoiceId) -> Result<Invoice, DispatchError> {
        let invoice = self.execute(
            invoice_id,
            InvoiceCommand::SendInvoice(SendInvoice {
                invoice_id,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(invoice_id = %invoice_id, "invoice sent");
        Ok(invoice)
    }

    pub fn mark_paid(&self, invoice_id: InvoiceId) -> Result<Invoice, DispatchError> {
        let invoice = self.execute(
            invoice_id,
            InvoiceCommand::MarkInvoicePaid(MarkInvoicePaid {
                invoice_id,
                paid_at: Utc::now(),
            }),
        )?;
        tracing::info!(invoice_id = %invoice_id, "invoice paid");
        Ok(invoice)
    }

    pub fn cancel(&self, invoice_id: InvoiceId, reason: Option<String>) -> Result<Invoice, DispatchError> {
        let invoice = self.execute(
            invoice_id,
            InvoiceCommand::CancelInvoice(CancelInvoice {
                invoice_id,
                reason,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(invoice_id = %invoice_id, "invoice cancelled");
        Ok(invoice)
    }

    pub fn delete(&self, invoice_id: InvoiceId) -> Result<(), DispatchError> {
        self.dispatcher.delete(invoice_id.0, INVOICE_AGGREGATE)?;
        tracing::info!(invoice_id = %invoice_id, "invoice deleted");
        Ok(())
    }

    pub fn find(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>, DispatchError> {
        tracing::debug!(invoice_id = %invoice_id, "loading invoice");
        self.dispatcher
            .load(invoice_id.0, INVOICE_AGGREGATE, |id| Invoice::empty(InvoiceId::new(id)))
    }

    /// Move every sent invoice whose due date has passed to overdue.
    ///
    /// Returns how many invoices were seen moving to overdue. Invoices another
    /// caller touched in the meantime are skipped; the next sweep picks them up.
    pub fn sweep_overdue(&self, as_of: DateTime<Utc>) -> Result<usize, DispatchError> {
        let mut moved = 0;
        for invoice in self.load_all()? {
            if !invoice.is_past_due(as_of) {
                continue;
            }
            let invoice_id = invoice.id_typed();
            let command =
                InvoiceCommand::MarkInvoiceOverdue(MarkInvoiceOverdue { invoice_id, as_of });
            match self.dispatcher.dispatch(invoice_id.0, INVOICE_AGGREGATE, command, |id| {
                Invoice::empty(InvoiceId::new(id))
            }) {
                Ok(updated) if updated.status() == InvoiceStatus::Overdue => moved += 1,
                Ok(_) => {}
                Err(DispatchError::Concurrency(reason)) => {
                    tracing::debug!(invoice_id = %invoice_id, %reason, "overdue sweep lost a race");
                }
                Err(err) => {
                    tracing::warn!(invoice_id = %invoice_id, error = %err, "overdue sweep failed");
                    return Err(err);
                }
            }
        }
        if moved > 0 {
            tracing::info!(count = moved, "invoices marked overdue");
        }
        Ok(moved)
    }

    /// All invoices, newest first, after sweeping overdue ones.
    pub fn list(&self) -> Result<Vec<Invoice>, DispatchError> {
        self.list_as_of(Utc::now())
    }

    pub fn list_as_of(&self, as_of: DateTime<Utc>) -> Result<Vec<Invoice>, DispatchError> {
        self.sweep_overdue(as_of)?;
        let mut invoices = self.load_all()?;
        invoices.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_typed().0.as_uuid().cmp(a.id_typed().0.as_uuid()))
        });
        Ok(invoices)
    }

    pub fn search_by_client(&self, query: &str) -> Result<Vec<Invoice>, DispatchError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|i| contains_ignore_case(i.client_name(), query))
            .collect())
    }

    pub fn by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, DispatchError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|i| i.status() == status)
            .collect())
    }

    pub fn stats(&self) -> Result<InvoiceStats, DispatchError> {
        Ok(summarize(&self.list()?))
    }

    fn load_all(&self) -> Result<Vec<Invoice>, DispatchError> {
        self.dispatcher
            .load_all(INVOICE_AGGREGATE, |id| Invoice::empty(InvoiceId::new(id)))
    }
}

fn summarize(invoices: &[Invoice]) -> InvoiceStats {
    let mut stats = InvoiceStats {
        total: invoices.len(),
        ..InvoiceStats::default()
    };
    for invoice in invoices {
        let total = invoice.totals().total_amount.value();
        match invoice.status() {
            InvoiceStatus::Draft => stats.draft += 1,
            InvoiceStatus::Sent => {
                stats.sent += 1;
                stats.pending_amount += total;
            }
            InvoiceStatus::Paid => {
                stats.paid += 1;
                stats.total_revenue += total;
            }
            InvoiceStatus::Overdue => {
                stats.overdue += 1;
                stats.pending_amount += total;
            }
            InvoiceStatus::Cancelled => stats.cancelled += 1,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    use moneydesk_invoicing::{ClientDetails, PaymentMethod};
    use moneydesk_money::{InvoiceLineItem, MonetaryAmount};

    use super::*;
    use crate::event_store::KeyValueEventStore;
    use crate::store::InMemoryKeyValueStore;

    fn service() -> InvoiceService<KeyValueEventStore<InMemoryKeyValueStore>> {
        InvoiceService::new(KeyValueEventStore::new(InMemoryKeyValueStore::new(), "test"))
    }

    fn details(client: &str, price: Decimal, due: NaiveDate) -> InvoiceDetails {
        InvoiceDetails {
            client: ClientDetails {
                name: client.to_string(),
                email: "billing@example.test".to_string(),
                address: "1 Main St".to_string(),
            },
            invoice_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            due_date: due,
            items: vec![
                InvoiceLineItem::new("Consulting", dec!(2), MonetaryAmount::new(price).unwrap())
                    .unwrap(),
            ],
            tax_rate: dec!(10),
            notes: None,
            payment_method: PaymentMethod::Zelle,
            payment_details: "pay@example.test".to_string(),
        }
    }

    fn due(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn create_derives_totals() {
        let svc = service();
        let invoice = svc.create(details("Acme", dec!(50), due(2999, 1, 1)), false).unwrap();

        assert_eq!(invoice.status(), InvoiceStatus::Draft);
        assert_eq!(invoice.totals().subtotal.value(), dec!(100));
        assert_eq!(invoice.totals().tax_amount.value(), dec!(10));
        assert_eq!(invoice.totals().total_amount.value(), dec!(110));
        assert!(invoice.number().unwrap().as_str().starts_with("INV-"));

        let loaded = svc.find(invoice.id_typed()).unwrap().unwrap();
        assert_eq!(loaded, invoice);
    }

    #[test]
    fn revise_recomputes_totals() {
        let svc = service();
        let invoice = svc.create(details("Acme", dec!(50), due(2999, 1, 1)), true).unwrap();

        let revised = svc
            .revise(invoice.id_typed(), details("Acme", dec!(75.25), due(2999, 1, 1)))
            .unwrap();
        assert_eq!(revised.totals().subtotal.value(), dec!(150.50));
        assert_eq!(revised.totals().tax_amount.value(), dec!(15.05));
        assert_eq!(revised.totals().total_amount.value(), dec!(165.55));
    }

    #[test]
    fn sweep_moves_past_due_invoices() {
        let svc = service();
        let late = svc.create(details("Late Co", dec!(10), due(2026, 2, 1)), true).unwrap();
        let on_time = svc.create(details("Prompt Co", dec!(10), due(2026, 4, 1)), true).unwrap();
        let draft = svc.create(details("Draft Co", dec!(10), due(2026, 2, 1)), false).unwrap();

        let as_of = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(svc.sweep_overdue(as_of).unwrap(), 1);
        assert_eq!(svc.sweep_overdue(as_of).unwrap(), 0);

        let status = |id| svc.find(id).unwrap().unwrap().status();
        assert_eq!(status(late.id_typed()), InvoiceStatus::Overdue);
        assert_eq!(status(on_time.id_typed()), InvoiceStatus::Sent);
        assert_eq!(status(draft.id_typed()), InvoiceStatus::Draft);

        // Overdue invoices can still be paid.
        let paid = svc.mark_paid(late.id_typed()).unwrap();
        assert_eq!(paid.status(), InvoiceStatus::Paid);
        assert!(paid.paid_at().is_some());
    }

    #[test]
    fn concurrent_listings_share_one_sweep() {
        let svc = service();
        for n in 0..60 {
            svc.create(details(&format!("Client {n}"), dec!(5), due(2026, 2, 1)), true)
                .unwrap();
        }
        let as_of = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| svc.list_as_of(as_of)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for result in results {
            let invoices = result.unwrap();
            assert_eq!(invoices.len(), 60);
        }
        let stats = svc.stats().unwrap();
        assert_eq!(stats.overdue, 60);
        assert_eq!(stats.sent, 0);
    }

    #[test]
    fn list_is_newest_first() {
        let svc = service();
        let first = svc.create(details("One", dec!(1), due(2999, 1, 1)), false).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = svc.create(details("Two", dec!(1), due(2999, 1, 1)), false).unwrap();

        let ids: Vec<_> = svc.list().unwrap().iter().map(|i| i.id_typed()).collect();
        assert_eq!(ids, vec![second.id_typed(), first.id_typed()]);
    }

    #[test]
    fn search_and_filter() {
        let svc = service();
        svc.create(details("Acme Corp", dec!(1), due(2999, 1, 1)), false).unwrap();
        svc.create(details("Globex", dec!(1), due(2999, 1, 1)), true).unwrap();

        let found = svc.search_by_client("acme").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].client_name(), "Acme Corp");
        assert!(svc.search_by_client("initech").unwrap().is_empty());

        assert_eq!(svc.by_status(InvoiceStatus::Sent).unwrap().len(), 1);
        assert_eq!(svc.by_status(InvoiceStatus::Draft).unwrap().len(), 1);
    }

    #[test]
    fn stats_split_revenue_and_pending() {
        let svc = service();
        let paid = svc.create(details("A", dec!(50), due(2999, 1, 1)), true).unwrap();
        svc.mark_paid(paid.id_typed()).unwrap();
        svc.create(details("B", dec!(25), due(2999, 1, 1)), true).unwrap();
        svc.create(details("C", dec!(5), due(2999, 1, 1)), false).unwrap();
        let cancelled = svc.create(details("D", dec!(5), due(2999, 1, 1)), false).unwrap();
        svc.cancel(cancelled.id_typed(), None).unwrap();

        let stats = svc.stats().unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!((stats.draft, stats.sent, stats.paid, stats.cancelled), (1, 1, 1, 1));
        assert_eq!(stats.total_revenue, dec!(110));
        assert_eq!(stats.pending_amount, dec!(55));
    }

    #[test]
    fn delete_and_missing_records() {
        let svc = service();
        let invoice = svc.create(details("A", dec!(1), due(2999, 1, 1)), false).unwrap();
        svc.delete(invoice.id_typed()).unwrap();

        assert!(svc.find(invoice.id_typed()).unwrap().is_none());
        assert!(matches!(svc.delete(invoice.id_typed()), Err(DispatchError::NotFound)));
        assert!(matches!(svc.send(invoice.id_typed()), Err(DispatchError::NotFound)));
    }

    #[test]
    fn paid_invoice_cannot_be_cancelled() {
        let svc = service();
        let invoice = svc.create(details("A", dec!(1), due(2999, 1, 1)), true).unwrap();
        svc.mark_paid(invoice.id_typed()).unwrap();
        assert!(svc.cancel(invoice.id_typed(), None).is_err());
        assert_eq!(
            svc.find(invoice.id_typed()).unwrap().unwrap().status(),
            InvoiceStatus::Paid
        );
    }
}
