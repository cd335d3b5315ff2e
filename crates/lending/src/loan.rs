use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use moneydesk_core::{Aggregate, AggregateId, AggregateRoot, DomainError, UserId};
use moneydesk_events::Event;
use moneydesk_money::{CreditScore, LoanTerms, MonetaryAmount, amortized_payment};

/// Loan identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(pub AggregateId);

impl LoanId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LoanId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    Personal,
    Business,
    Auto,
    Home,
}

/// Loan status lifecycle.
///
/// `pending → approved → active → paid_off`, with `rejected` from pending and
/// `defaulted` from active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    Active,
    PaidOff,
    Defaulted,
}

/// What the applicant asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub loan_type: LoanType,
    pub amount_requested: MonetaryAmount,
    pub term_months: u32,
    pub purpose: String,
    pub employment_status: String,
    pub annual_income: MonetaryAmount,
}

impl LoanApplication {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.amount_requested.is_zero() {
            return Err(DomainError::validation("please enter a valid loan amount"));
        }
        if self.purpose.trim().is_empty() {
            return Err(DomainError::validation("please describe the loan purpose"));
        }
        if self.employment_status.trim().is_empty() {
            return Err(DomainError::validation(
                "please specify your employment status",
            ));
        }
        if self.annual_income.is_zero() {
            return Err(DomainError::validation("please enter your annual income"));
        }
        if self.term_months == 0 {
            return Err(DomainError::validation("loan term must be at least one month"));
        }
        Ok(())
    }
}

/// Aggregate root: Loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    id: LoanId,
    applicant: Option<UserId>,
    application: Option<LoanApplication>,
    credit_score: Option<CreditScore>,
    interest_rate: Decimal,
    term_months: u32,
    amount_approved: Option<MonetaryAmount>,
    monthly_payment: Option<Decimal>,
    balance_remaining: MonetaryAmount,
    disbursement_date: Option<NaiveDate>,
    next_payment_date: Option<NaiveDate>,
    payments_made: u32,
    status: LoanStatus,
    created_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Loan {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: LoanId) -> Self {
        Self {
            id,
            applicant: None,
            application: None,
            credit_score: None,
            interest_rate: Decimal::ZERO,
            term_months: 0,
            amount_approved: None,
            monthly_payment: None,
            balance_remaining: MonetaryAmount::ZERO,
            disbursement_date: None,
            next_payment_date: None,
            payments_made: 0,
            status: LoanStatus::Pending,
            created_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> LoanId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn applicant(&self) -> Option<UserId> {
        self.applicant
    }

    pub fn application(&self) -> Option<&LoanApplication> {
        self.application.as_ref()
    }

    pub fn credit_score(&self) -> Option<CreditScore> {
        self.credit_score
    }

    pub fn interest_rate(&self) -> Decimal {
        self.interest_rate
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn amount_approved(&self) -> Option<MonetaryAmount> {
        self.amount_approved
    }

    /// Unrounded; set once the loan is approved.
    pub fn monthly_payment(&self) -> Option<Decimal> {
        self.monthly_payment
    }

    pub fn balance_remaining(&self) -> MonetaryAmount {
        self.balance_remaining
    }

    pub fn disbursement_date(&self) -> Option<NaiveDate> {
        self.disbursement_date
    }

    pub fn next_payment_date(&self) -> Option<NaiveDate> {
        self.next_payment_date
    }

    pub fn payments_made(&self) -> u32 {
        self.payments_made
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Terms the payment is computed from: approved amount when there is one,
    /// otherwise the requested amount.
    pub fn terms(&self) -> Option<LoanTerms> {
        let principal = self
            .amount_approved
            .or_else(|| self.application.as_ref().map(|a| a.amount_requested))?;
        Some(LoanTerms {
            principal: principal.value(),
            annual_rate_percent: self.interest_rate,
            term_months: self.term_months,
        })
    }
}

impl AggregateRoot for Loan {
    type Id = LoanId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: ApplyForLoan. Score and rate are decided by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyForLoan {
    pub loan_id: LoanId,
    pub applicant: UserId,
    pub application: LoanApplication,
    pub credit_score: CreditScore,
    pub interest_rate: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveLoan, optionally overriding the quoted rate or term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveLoan {
    pub loan_id: LoanId,
    pub amount_approved: MonetaryAmount,
    pub interest_rate: Option<Decimal>,
    pub term_months: Option<u32>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectLoan {
    pub loan_id: LoanId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisburseLoan {
    pub loan_id: LoanId,
    pub disbursed_on: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRepayment {
    pub loan_id: LoanId,
    pub amount: MonetaryAmount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkDefaulted {
    pub loan_id: LoanId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanCommand {
    ApplyForLoan(ApplyForLoan),
    ApproveLoan(ApproveLoan),
    RejectLoan(RejectLoan),
    DisburseLoan(DisburseLoan),
    RecordRepayment(RecordRepayment),
    MarkDefaulted(MarkDefaulted),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplied {
    pub loan_id: LoanId,
    pub applicant: UserId,
    pub application: LoanApplication,
    pub credit_score: CreditScore,
    pub interest_rate: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApproved {
    pub loan_id: LoanId,
    pub amount_approved: MonetaryAmount,
    pub interest_rate: Decimal,
    pub term_months: u32,
    pub monthly_payment: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRejected {
    pub loan_id: LoanId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDisbursed {
    pub loan_id: LoanId,
    pub disbursed_on: NaiveDate,
    pub next_payment_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentRecorded {
    pub loan_id: LoanId,
    pub amount: MonetaryAmount,
    pub balance_remaining: MonetaryAmount,
    /// `None` once the loan is paid off.
    pub next_payment_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDefaulted {
    pub loan_id: LoanId,
    pub balance_remaining: MonetaryAmount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanEvent {
    LoanApplied(LoanApplied),
    LoanApproved(LoanApproved),
    LoanRejected(LoanRejected),
    LoanDisbursed(LoanDisbursed),
    RepaymentRecorded(RepaymentRecorded),
    LoanDefaulted(LoanDefaulted),
}

impl Event for LoanEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LoanEvent::LoanApplied(_) => "lending.loan.applied",
            LoanEvent::LoanApproved(_) => "lending.loan.approved",
            LoanEvent::LoanRejected(_) => "lending.loan.rejected",
            LoanEvent::LoanDisbursed(_) => "lending.loan.disbursed",
            LoanEvent::RepaymentRecorded(_) => "lending.loan.repayment_recorded",
            LoanEvent::LoanDefaulted(_) => "lending.loan.defaulted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LoanEvent::LoanApplied(e) => e.occurred_at,
            LoanEvent::LoanApproved(e) => e.occurred_at,
            LoanEvent::LoanRejected(e) => e.occurred_at,
            LoanEvent::LoanDisbursed(e) => e.occurred_at,
            LoanEvent::RepaymentRecorded(e) => e.occurred_at,
            LoanEvent::LoanDefaulted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Loan {
    type Command = LoanCommand;
    type Event = LoanEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LoanEvent::LoanApplied(e) => {
                self.id = e.loan_id;
                self.applicant = Some(e.applicant);
                self.credit_score = Some(e.credit_score);
                self.interest_rate = e.interest_rate;
                self.term_months = e.application.term_months;
                self.balance_remaining = e.application.amount_requested;
                self.application = Some(e.application.clone());
                self.status = LoanStatus::Pending;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            LoanEvent::LoanApproved(e) => {
                self.amount_approved = Some(e.amount_approved);
                self.interest_rate = e.interest_rate;
                self.term_months = e.term_months;
                self.monthly_payment = Some(e.monthly_payment);
                self.balance_remaining = e.amount_approved;
                self.status = LoanStatus::Approved;
            }
            LoanEvent::LoanRejected(_) => {
                self.status = LoanStatus::Rejected;
            }
            LoanEvent::LoanDisbursed(e) => {
                self.disbursement_date = Some(e.disbursed_on);
                self.next_payment_date = Some(e.next_payment_date);
                self.status = LoanStatus::Active;
            }
            LoanEvent::RepaymentRecorded(e) => {
                self.balance_remaining = e.balance_remaining;
                self.next_payment_date = e.next_payment_date;
                self.payments_made += 1;
                if e.balance_remaining.is_zero() {
                    self.status = LoanStatus::PaidOff;
                }
            }
            LoanEvent::LoanDefaulted(_) => {
                self.status = LoanStatus::Defaulted;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LoanCommand::ApplyForLoan(cmd) => self.handle_apply(cmd),
            LoanCommand::ApproveLoan(cmd) => self.handle_approve(cmd),
            LoanCommand::RejectLoan(cmd) => self.handle_reject(cmd),
            LoanCommand::DisburseLoan(cmd) => self.handle_disburse(cmd),
            LoanCommand::RecordRepayment(cmd) => self.handle_repayment(cmd),
            LoanCommand::MarkDefaulted(cmd) => self.handle_default(cmd),
        }
    }
}

impl Loan {
    fn ensure_status(&self, loan_id: LoanId, expected: LoanStatus) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != loan_id {
            return Err(DomainError::invariant("loan_id mismatch"));
        }
        if self.status != expected {
            return Err(DomainError::conflict(format!(
                "loan is {:?}, expected {expected:?}",
                self.status
            )));
        }
        Ok(())
    }

    fn handle_apply(&self, cmd: &ApplyForLoan) -> Result<Vec<LoanEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("loan already exists"));
        }
        cmd.application.validate()?;
        if cmd.interest_rate < Decimal::ZERO {
            return Err(DomainError::validation("interest rate must not be negative"));
        }

        Ok(vec![LoanEvent::LoanApplied(LoanApplied {
            loan_id: cmd.loan_id,
            applicant: cmd.applicant,
            application: cmd.application.clone(),
            credit_score: cmd.credit_score,
            interest_rate: cmd.interest_rate,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &ApproveLoan) -> Result<Vec<LoanEvent>, DomainError> {
        self.ensure_status(cmd.loan_id, LoanStatus::Pending)?;

        let requested = self
            .application
            .as_ref()
            .map(|a| a.amount_requested)
            .ok_or_else(|| DomainError::invariant("pending loan without application"))?;
        if cmd.amount_approved.is_zero() {
            return Err(DomainError::validation("approved amount must be positive"));
        }
        if cmd.amount_approved > requested {
            return Err(DomainError::invariant(
                "cannot approve more than the requested amount",
            ));
        }

        let terms = LoanTerms::new(
            cmd.amount_approved.value(),
            cmd.interest_rate.unwrap_or(self.interest_rate),
            cmd.term_months.unwrap_or(self.term_months),
        )?;
        let monthly_payment = amortized_payment(&terms)?;

        Ok(vec![LoanEvent::LoanApproved(LoanApproved {
            loan_id: cmd.loan_id,
            amount_approved: cmd.amount_approved,
            interest_rate: terms.annual_rate_percent,
            term_months: terms.term_months,
            monthly_payment,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectLoan) -> Result<Vec<LoanEvent>, DomainError> {
        self.ensure_status(cmd.loan_id, LoanStatus::Pending)?;

        Ok(vec![LoanEvent::LoanRejected(LoanRejected {
            loan_id: cmd.loan_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_disburse(&self, cmd: &DisburseLoan) -> Result<Vec<LoanEvent>, DomainError> {
        self.ensure_status(cmd.loan_id, LoanStatus::Approved)?;

        let next_payment_date = months_after(cmd.disbursed_on, 1)?;

        Ok(vec![LoanEvent::LoanDisbursed(LoanDisbursed {
            loan_id: cmd.loan_id,
            disbursed_on: cmd.disbursed_on,
            next_payment_date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_repayment(&self, cmd: &RecordRepayment) -> Result<Vec<LoanEvent>, DomainError> {
        self.ensure_status(cmd.loan_id, LoanStatus::Active)?;

        if cmd.amount.is_zero() {
            return Err(DomainError::validation("repayment amount must be positive"));
        }
        if cmd.amount > self.balance_remaining {
            return Err(DomainError::invariant(
                "repayment exceeds the remaining balance",
            ));
        }

        let balance_remaining = self.balance_remaining.saturating_sub(cmd.amount);
        let next_payment_date = if balance_remaining.is_zero() {
            None
        } else {
            // Anchored on the disbursement day so a clamped month does not shift later dates.
            let disbursed_on = self
                .disbursement_date
                .ok_or_else(|| DomainError::invariant("active loan without disbursement date"))?;
            Some(months_after(disbursed_on, self.payments_made + 2)?)
        };

        Ok(vec![LoanEvent::RepaymentRecorded(RepaymentRecorded {
            loan_id: cmd.loan_id,
            amount: cmd.amount,
            balance_remaining,
            next_payment_date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_default(&self, cmd: &MarkDefaulted) -> Result<Vec<LoanEvent>, DomainError> {
        self.ensure_status(cmd.loan_id, LoanStatus::Active)?;

        Ok(vec![LoanEvent::LoanDefaulted(LoanDefaulted {
            loan_id: cmd.loan_id,
            balance_remaining: self.balance_remaining,
            occurred_at: cmd.occurred_at,
        })])
    }
}

fn months_after(date: NaiveDate, months: u32) -> Result<NaiveDate, DomainError> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| DomainError::invariant("payment date out of range"))
}
