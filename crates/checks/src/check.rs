use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use moneydesk_core::{Aggregate, AggregateId, AggregateRoot, DomainError};
use moneydesk_events::Event;
use moneydesk_invoicing::InvoiceId;
use moneydesk_money::MonetaryAmount;

/// Check identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckId(pub AggregateId);

impl CheckId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CheckId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Printed check number, `CHK-<unix millis>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckNumber(String);

impl CheckNumber {
    pub fn generate(at: DateTime<Utc>) -> Self {
        Self(format!("CHK-{}", at.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Check status lifecycle: `draft → printed → cleared`, or `voided` before clearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Draft,
    Printed,
    Cleared,
    Voided,
}

/// Drawer's bank account as printed on the check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub account_name: String,
    pub account_number: String,
    pub routing_number: String,
    pub bank_name: String,
    pub bank_address: Option<String>,
}

impl BankAccount {
    fn validate(&self) -> Result<(), DomainError> {
        if self.routing_number.len() != 9 || !is_digits(&self.routing_number) {
            return Err(DomainError::validation(
                "routing number must be exactly 9 digits",
            ));
        }
        if self.account_number.is_empty() || !is_digits(&self.account_number) {
            return Err(DomainError::validation(
                "account number must be non-empty digits",
            ));
        }
        Ok(())
    }
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Editable check fields. The legend is not among them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDetails {
    pub date: NaiveDate,
    pub payee_name: String,
    pub payee_address: Option<String>,
    pub amount: MonetaryAmount,
    pub memo: Option<String>,
    pub account: BankAccount,
    /// Invoice this check settles, if any.
    pub invoice_id: Option<InvoiceId>,
    pub notes: Option<String>,
}

impl CheckDetails {
    /// Validate and derive the printed legend.
    fn validate(&self) -> Result<String, DomainError> {
        if self.payee_name.trim().is_empty() {
            return Err(DomainError::validation("payee name must not be empty"));
        }
        if self.amount.is_zero() {
            return Err(DomainError::validation("check amount must be positive"));
        }
        self.account.validate()?;
        Ok(self.amount.to_words()?)
    }
}

/// Aggregate root: Check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    id: CheckId,
    number: Option<CheckNumber>,
    details: Option<CheckDetails>,
    amount_in_words: String,
    status: CheckStatus,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Check {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: CheckId) -> Self {
        Self {
            id,
            number: None,
            details: None,
            amount_in_words: String::new(),
            status: CheckStatus::Draft,
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CheckId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn number(&self) -> Option<&CheckNumber> {
        self.number.as_ref()
    }

    pub fn details(&self) -> Option<&CheckDetails> {
        self.details.as_ref()
    }

    pub fn amount(&self) -> MonetaryAmount {
        self.details
            .as_ref()
            .map(|d| d.amount)
            .unwrap_or(MonetaryAmount::ZERO)
    }

    pub fn amount_in_words(&self) -> &str {
        &self.amount_in_words
    }

    pub fn payee_name(&self) -> &str {
        self.details.as_ref().map(|d| d.payee_name.as_str()).unwrap_or("")
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.details.as_ref().map(|d| d.date)
    }

    pub fn invoice_id(&self) -> Option<InvoiceId> {
        self.details.as_ref().and_then(|d| d.invoice_id)
    }

    pub fn status(&self) -> CheckStatus {
        self.status
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Printed but not yet cleared.
    pub fn is_outstanding(&self) -> bool {
        self.status == CheckStatus::Printed
    }
}

impl AggregateRoot for Check {
    type Id = CheckId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteCheck {
    pub check_id: CheckId,
    pub check_number: CheckNumber,
    pub details: CheckDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Replace the details of a draft check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendCheck {
    pub check_id: CheckId,
    pub details: CheckDetails,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkCheckPrinted {
    pub check_id: CheckId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkCheckCleared {
    pub check_id: CheckId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidCheck {
    pub check_id: CheckId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckCommand {
    WriteCheck(WriteCheck),
    AmendCheck(AmendCheck),
    MarkCheckPrinted(MarkCheckPrinted),
    MarkCheckCleared(MarkCheckCleared),
    VoidCheck(VoidCheck),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckWritten {
    pub check_id: CheckId,
    pub check_number: CheckNumber,
    pub details: CheckDetails,
    pub amount_in_words: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAmended {
    pub check_id: CheckId,
    pub details: CheckDetails,
    pub amount_in_words: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPrinted {
    pub check_id: CheckId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckCleared {
    pub check_id: CheckId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckVoided {
    pub check_id: CheckId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckEvent {
    CheckWritten(CheckWritten),
    CheckAmended(CheckAmended),
    CheckPrinted(CheckPrinted),
    CheckCleared(CheckCleared),
    CheckVoided(CheckVoided),
}

impl Event for CheckEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CheckEvent::CheckWritten(_) => "checks.check.written",
            CheckEvent::CheckAmended(_) => "checks.check.amended",
            CheckEvent::CheckPrinted(_) => "checks.check.printed",
            CheckEvent::CheckCleared(_) => "checks.check.cleared",
            CheckEvent::CheckVoided(_) => "checks.check.voided",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CheckEvent::CheckWritten(e) => e.occurred_at,
            CheckEvent::CheckAmended(e) => e.occurred_at,
            CheckEvent::CheckPrinted(e) => e.occurred_at,
            CheckEvent::CheckCleared(e) => e.occurred_at,
            CheckEvent::CheckVoided(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Check {
    type Command = CheckCommand;
    type Event = CheckEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CheckEvent::CheckWritten(e) => {
                self.id = e.check_id;
                self.number = Some(e.check_number.clone());
                self.details = Some(e.details.clone());
                self.amount_in_words = e.amount_in_words.clone();
                self.status = CheckStatus::Draft;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            CheckEvent::CheckAmended(e) => {
                self.details = Some(e.details.clone());
                self.amount_in_words = e.amount_in_words.clone();
            }
            CheckEvent::CheckPrinted(_) => self.status = CheckStatus::Printed,
            CheckEvent::CheckCleared(_) => self.status = CheckStatus::Cleared,
            CheckEvent::CheckVoided(_) => self.status = CheckStatus::Voided,
        }

        self.updated_at = Some(event.occurred_at());
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CheckCommand::WriteCheck(cmd) => self.handle_write(cmd),
            CheckCommand::AmendCheck(cmd) => self.handle_amend(cmd),
            CheckCommand::MarkCheckPrinted(cmd) => {
                self.ensure_transition(cmd.check_id, &[CheckStatus::Draft], "printed")?;
                Ok(vec![CheckEvent::CheckPrinted(CheckPrinted {
                    check_id: cmd.check_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            CheckCommand::MarkCheckCleared(cmd) => {
                self.ensure_transition(cmd.check_id, &[CheckStatus::Printed], "cleared")?;
                Ok(vec![CheckEvent::CheckCleared(CheckCleared {
                    check_id: cmd.check_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            CheckCommand::VoidCheck(cmd) => {
                self.ensure_transition(
                    cmd.check_id,
                    &[CheckStatus::Draft, CheckStatus::Printed],
                    "voided",
                )?;
                Ok(vec![CheckEvent::CheckVoided(CheckVoided {
                    check_id: cmd.check_id,
                    reason: cmd.reason.clone(),
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

impl Check {
    fn ensure_created(&self, check_id: CheckId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != check_id {
            return Err(DomainError::invariant("check_id mismatch"));
        }
        Ok(())
    }

    fn ensure_transition(
        &self,
        check_id: CheckId,
        from: &[CheckStatus],
        to: &str,
    ) -> Result<(), DomainError> {
        self.ensure_created(check_id)?;
        if !from.contains(&self.status) {
            return Err(DomainError::conflict(format!(
                "a {:?} check cannot be {to}",
                self.status
            )));
        }
        Ok(())
    }

    fn handle_write(&self, cmd: &WriteCheck) -> Result<Vec<CheckEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("check already exists"));
        }
        let amount_in_words = cmd.details.validate()?;

        Ok(vec![CheckEvent::CheckWritten(CheckWritten {
            check_id: cmd.check_id,
            check_number: cmd.check_number.clone(),
            details: cmd.details.clone(),
            amount_in_words,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_amend(&self, cmd: &AmendCheck) -> Result<Vec<CheckEvent>, DomainError> {
        self.ensure_transition(cmd.check_id, &[CheckStatus::Draft], "amended")?;
        let amount_in_words = cmd.details.validate()?;

        Ok(vec![CheckEvent::CheckAmended(CheckAmended {
            check_id: cmd.check_id,
            details: cmd.details.clone(),
            amount_in_words,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use moneydesk_money::amount_to_words;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn test_check_id() -> CheckId {
        CheckId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
    }

    fn account() -> BankAccount {
        BankAccount {
            account_name: "Jordan Example".to_string(),
            account_number: "123456789".to_string(),
            routing_number: "011000015".to_string(),
            bank_name: "First Test Bank".to_string(),
            bank_address: None,
        }
    }

    fn details(amount: Decimal) -> CheckDetails {
        CheckDetails {
            date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            payee_name: "City Utilities".to_string(),
            payee_address: Some("9 Water Way".to_string()),
            amount: MonetaryAmount::new(amount).unwrap(),
            memo: Some("April bill".to_string()),
            account: account(),
            invoice_id: None,
            notes: None,
        }
    }

    fn written(amount: Decimal) -> (Check, CheckId) {
        let check_id = test_check_id();
        let mut check = Check::empty(check_id);
        let events = check
            .handle(&CheckCommand::WriteCheck(WriteCheck {
                check_id,
                check_number: CheckNumber::generate(test_time()),
                details: details(amount),
                occurred_at: test_time(),
            }))
            .unwrap();
        check.apply(&events[0]);
        (check, check_id)
    }

    fn run(check: &mut Check, command: CheckCommand) -> Result<(), DomainError> {
        for event in check.handle(&command)? {
            check.apply(&event);
        }
        Ok(())
    }

    #[test]
    fn writing_a_check_derives_the_legend() {
        let (check, _) = written(dec!(1234.56));
        assert_eq!(
            check.amount_in_words(),
            "One Thousand Two Hundred Thirty Four Dollars and 56/100"
        );
        assert_eq!(check.status(), CheckStatus::Draft);
    }

    #[test]
    fn amending_the_amount_recomputes_the_legend() {
        let (mut check, check_id) = written(dec!(10));
        run(
            &mut check,
            CheckCommand::AmendCheck(AmendCheck {
                check_id,
                details: details(dec!(100)),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert_eq!(check.amount_in_words(), "One Hundred Dollars");
        assert_eq!(check.version(), 2);
    }

    #[test]
    fn printed_checks_cannot_be_amended() {
        let (mut check, check_id) = written(dec!(10));
        run(
            &mut check,
            CheckCommand::MarkCheckPrinted(MarkCheckPrinted {
                check_id,
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert!(check.is_outstanding());

        let err = run(
            &mut check,
            CheckCommand::AmendCheck(AmendCheck {
                check_id,
                details: details(dec!(11)),
                occurred_at: test_time(),
            }),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn lifecycle_print_then_clear() {
        let (mut check, check_id) = written(dec!(42));
        let clear = CheckCommand::MarkCheckCleared(MarkCheckCleared {
            check_id,
            occurred_at: test_time(),
        });
        assert!(matches!(
            check.handle(&clear).unwrap_err(),
            DomainError::Conflict(_)
        ));

        run(
            &mut check,
            CheckCommand::MarkCheckPrinted(MarkCheckPrinted {
                check_id,
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        run(&mut check, clear).unwrap();
        assert_eq!(check.status(), CheckStatus::Cleared);

        let void = CheckCommand::VoidCheck(VoidCheck {
            check_id,
            reason: None,
            occurred_at: test_time(),
        });
        assert!(matches!(
            check.handle(&void).unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[test]
    fn rejects_invalid_checks() {
        let check_id = test_check_id();
        let check = Check::empty(check_id);

        let zero = details(dec!(0));
        let mut no_payee = details(dec!(5));
        no_payee.payee_name = String::new();
        let mut short_routing = details(dec!(5));
        short_routing.account.routing_number = "12345".to_string();
        let mut letters = details(dec!(5));
        letters.account.account_number = "12ab".to_string();

        for bad in [zero, no_payee, short_routing, letters] {
            let err = check
                .handle(&CheckCommand::WriteCheck(WriteCheck {
                    check_id,
                    check_number: CheckNumber::generate(test_time()),
                    details: bad,
                    occurred_at: test_time(),
                }))
                .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{err:?}");
        }
    }

    proptest! {
        /// Property: the stored legend always matches the stored amount.
        #[test]
        fn legend_matches_amount(first in 1u64..10_000_000, second in 1u64..10_000_000) {
            let (mut check, check_id) = written(Decimal::new(first as i64, 2));
            prop_assert_eq!(
                check.amount_in_words(),
                amount_to_words(check.amount().value()).unwrap()
            );

            run(
                &mut check,
                CheckCommand::AmendCheck(AmendCheck {
                    check_id,
                    details: details(Decimal::new(second as i64, 2)),
                    occurred_at: test_time(),
                }),
            )
            .unwrap();
            prop_assert_eq!(
                check.amount_in_words(),
                amount_to_words(check.amount().value()).unwrap()
            );
        }
    }
}
