use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use moneydesk_checks::{
    AmendCheck, Check, CheckCommand, CheckDetails, CheckId, CheckNumber, CheckStatus,
    MarkCheckCleared, MarkCheckPrinted, VoidCheck, WriteCheck,
};
use moneydesk_core::AggregateId;
use moneydesk_invoicing::InvoiceId;

use super::contains_ignore_case;
use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::EventStore;

pub const CHECK_AGGREGATE: &str = "checks.check";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckStats {
    pub total: usize,
    pub draft: usize,
    pub printed: usize,
    pub cleared: usize,
    pub voided: usize,
    /// Sum over every check regardless of status.
    pub total_amount: Decimal,
    /// Sum of printed, not yet cleared checks.
    pub outstanding_amount: Decimal,
}

#[derive(Debug)]
pub struct CheckService<S> {
    dispatcher: CommandDispatcher<S>,
}

impl<S: EventStore> CheckService<S> {
    pub fn new(store: S) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store),
        }
    }

    fn execute(&self, check_id: CheckId, command: CheckCommand) -> Result<Check, DispatchError> {
        self.dispatcher
            .dispatch(check_id.0, CHECK_AGGREGATE, command, |id| {
                Check::empty(CheckId::new(id))
            })
            .inspect_err(|err| {
                tracing::warn!(check_id = %check_id, error = %err, "check command rejected");
            })
    }

    pub fn write(&self, details: CheckDetails) -> Result<Check, DispatchError> {
        let now = Utc::now();
        let check_id = CheckId::new(AggregateId::new());
        let check = self.execute(
            check_id,
            CheckCommand::WriteCheck(WriteCheck {
                check_id,
                check_number: CheckNumber::generate(now),
                details,
                occurred_at: now,
            }),
        )?;
        tracing::info!(check_id = %check_id, amount = %check.amount(), "check written");
        Ok(check)
    }

    pub fn amend(&self, check_id: CheckId, details: CheckDetails) -> Result<Check, DispatchError> {
        let check = self.execute(
            check_id,
            CheckCommand::AmendCheck(AmendCheck {
                check_id,
                details,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(check_id = %check_id, amount = %check.amount(), "check amended");
        Ok(check)
    }

    pub fn print(&self, check_id: CheckId) -> Result<Check, DispatchError> {
        let check = self.execute(
            check_id,
            CheckCommand::MarkCheckPrinted(MarkCheckPrinted {
                check_id,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(check_id = %check_id, "check printed");
        Ok(check)
    }

    pub fn clear(&self, check_id: CheckId) -> Result<Check, DispatchError> {
        let check = self.execute(
            check_id,
            CheckCommand::MarkCheckCleared(MarkCheckCleared {
                check_id,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(check_id = %check_id, "check cleared");
        Ok(check)
    }

    pub fn void(&self, check_id: CheckId, reason: Option<String>) -> Result<Check, DispatchError> {
        let check = self.execute(
            check_id,
            CheckCommand::VoidCheck(VoidCheck {
                check_id,
                reason,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(check_id = %check_id, "check voided");
        Ok(check)
    }

    pub fn delete(&self, check_id: CheckId) -> Result<(), DispatchError> {
        self.dispatcher.delete(check_id.0, CHECK_AGGREGATE)?;
        tracing::info!(check_id = %check_id, "check deleted");
        Ok(())
    }

    pub fn find(&self, check_id: CheckId) -> Result<Option<Check>, DispatchError> {
        tracing::debug!(check_id = %check_id, "loading check");
        self.dispatcher
            .load(check_id.0, CHECK_AGGREGATE, |id| Check::empty(CheckId::new(id)))
    }

    /// All checks, newest first.
    pub fn list(&self) -> Result<Vec<Check>, DispatchError> {
        let mut checks = self
            .dispatcher
            .load_all(CHECK_AGGREGATE, |id| Check::empty(CheckId::new(id)))?;
        checks.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_typed().0.as_uuid().cmp(a.id_typed().0.as_uuid()))
        });
        Ok(checks)
    }

    fn filtered(&self, keep: impl Fn(&Check) -> bool) -> Result<Vec<Check>, DispatchError> {
        Ok(self.list()?.into_iter().filter(|c| keep(c)).collect())
    }

    pub fn by_invoice(&self, invoice_id: InvoiceId) -> Result<Vec<Check>, DispatchError> {
        self.filtered(|c| c.invoice_id() == Some(invoice_id))
    }

    pub fn by_status(&self, status: CheckStatus) -> Result<Vec<Check>, DispatchError> {
        self.filtered(|c| c.status() == status)
    }

    pub fn by_payee(&self, query: &str) -> Result<Vec<Check>, DispatchError> {
        self.filtered(|c| contains_ignore_case(c.payee_name(), query))
    }

    /// Checks dated within `[from, to]`.
    pub fn by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Check>, DispatchError> {
        self.filtered(|c| c.date().is_some_and(|d| from <= d && d <= to))
    }

    pub fn stats(&self) -> Result<CheckStats, DispatchError> {
        let checks = self.list()?;
        let mut stats = CheckStats {
            total: checks.len(),
            ..CheckStats::default()
        };
        for check in &checks {
            let amount = check.amount().value();
            stats.total_amount += amount;
            match check.status() {
                CheckStatus::Draft => stats.draft += 1,
                CheckStatus::Printed => {
                    stats.printed += 1;
                    stats.outstanding_amount += amount;
                }
                CheckStatus::Cleared => stats.cleared += 1,
                CheckStatus::Voided => stats.voided += 1,
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use moneydesk_checks::BankAccount;
    use moneydesk_money::{MonetaryAmount, amount_to_words};

    use super::*;
    use crate::event_store::KeyValueEventStore;
    use crate::store::InMemoryKeyValueStore;

    fn service() -> CheckService<KeyValueEventStore<InMemoryKeyValueStore>> {
        CheckService::new(KeyValueEventStore::new(InMemoryKeyValueStore::new(), "test"))
    }

    fn details(payee: &str, amount: Decimal, date: NaiveDate) -> CheckDetails {
        CheckDetails {
            date,
            payee_name: payee.to_string(),
            payee_address: None,
            amount: MonetaryAmount::new(amount).unwrap(),
            memo: Some("Rent".to_string()),
            account: BankAccount {
                account_name: "Household".to_string(),
                account_number: "000123456".to_string(),
                routing_number: "021000021".to_string(),
                bank_name: "First Bank".to_string(),
                bank_address: None,
            },
            invoice_id: None,
            notes: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn write_derives_legend() {
        let svc = service();
        let check = svc.write(details("Jane Landlord", dec!(1234.56), day(1))).unwrap();

        assert_eq!(check.status(), CheckStatus::Draft);
        assert_eq!(
            check.amount_in_words(),
            "One Thousand Two Hundred Thirty Four Dollars and 56/100"
        );
        assert!(check.number().unwrap().as_str().starts_with("CHK-"));
    }

    #[test]
    fn amend_recomputes_legend() {
        let svc = service();
        let check = svc.write(details("Jane", dec!(10), day(1))).unwrap();
        let amended = svc.amend(check.id_typed(), details("Jane", dec!(2000.05), day(1))).unwrap();

        assert_eq!(
            amended.amount_in_words(),
            amount_to_words(dec!(2000.05)).unwrap()
        );
        let reloaded = svc.find(check.id_typed()).unwrap().unwrap();
        assert_eq!(reloaded.amount_in_words(), amended.amount_in_words());
    }

    #[test]
    fn lifecycle_and_guards() {
        let svc = service();
        let check = svc.write(details("Jane", dec!(10), day(1))).unwrap();
        let id = check.id_typed();

        assert!(svc.clear(id).is_err());
        svc.print(id).unwrap();
        assert!(svc.amend(id, details("Jane", dec!(20), day(1))).is_err());
        let cleared = svc.clear(id).unwrap();
        assert_eq!(cleared.status(), CheckStatus::Cleared);
        assert!(svc.void(id, None).is_err());
    }

    #[test]
    fn queries() {
        let svc = service();
        let invoice_id = InvoiceId::new(AggregateId::new());
        let mut linked = details("Acme Supplies", dec!(40), day(10));
        linked.invoice_id = Some(invoice_id);
        svc.write(linked).unwrap();
        svc.write(details("Bob's Plumbing", dec!(60), day(20))).unwrap();
        let voided = svc.write(details("ACME Rentals", dec!(5), day(25))).unwrap();
        svc.void(voided.id_typed(), Some("typo".to_string())).unwrap();

        assert_eq!(svc.by_invoice(invoice_id).unwrap().len(), 1);
        assert_eq!(svc.by_payee("acme").unwrap().len(), 2);
        assert_eq!(svc.by_status(CheckStatus::Voided).unwrap().len(), 1);
        assert_eq!(svc.by_date_range(day(10), day(20)).unwrap().len(), 2);
        assert_eq!(svc.by_date_range(day(11), day(19)).unwrap().len(), 0);
    }

    #[test]
    fn stats_track_outstanding() {
        let svc = service();
        let a = svc.write(details("A", dec!(100), day(1))).unwrap();
        let b = svc.write(details("B", dec!(50.25), day(1))).unwrap();
        svc.write(details("C", dec!(10), day(1))).unwrap();
        svc.print(a.id_typed()).unwrap();
        svc.print(b.id_typed()).unwrap();
        svc.clear(b.id_typed()).unwrap();

        let stats = svc.stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!((stats.draft, stats.printed, stats.cleared, stats.voided), (1, 1, 1, 0));
        assert_eq!(stats.total_amount, dec!(160.25));
        assert_eq!(stats.outstanding_amount, dec!(100));
    }

    #[test]
    fn delete_removes_check() {
        let svc = service();
        let check = svc.write(details("A", dec!(1), day(1))).unwrap();
        svc.delete(check.id_typed()).unwrap();
        assert!(svc.list().unwrap().is_empty());
    }
}
