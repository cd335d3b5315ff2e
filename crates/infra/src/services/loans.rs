use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use moneydesk_core::{AggregateId, DomainError, UserId};
use moneydesk_lending::{
    ApplyForLoan, ApproveLoan, DisburseLoan, Loan, LoanApplication, LoanCommand, LoanId,
    LoanStatus, MarkDefaulted, RecordRepayment, RejectLoan, quote_interest_rate,
};
use moneydesk_money::{LoanTerms, MonetaryAmount, MoneyResult, amortized_payment, estimate_credit_score};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::config::AppConfig;
use crate::event_store::EventStore;

pub const LOAN_AGGREGATE: &str = "lending.loan";

/// Figures shown by the payment calculator, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentQuote {
    pub monthly_payment: Decimal,
    pub total_payment: Decimal,
    pub total_interest: Decimal,
}

/// Monthly payment and lifetime cost of a loan on `terms`.
pub fn quote_payment(terms: &LoanTerms) -> MoneyResult<PaymentQuote> {
    let monthly = amortized_payment(terms)?;
    let total = monthly * Decimal::from(terms.term_months);
    let cents = |d: Decimal| {
        let mut rounded = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        rounded
    };
    Ok(PaymentQuote {
        monthly_payment: cents(monthly),
        total_payment: cents(total),
        total_interest: cents(total - terms.principal),
    })
}

#[derive(Debug)]
pub struct LoanService<S> {
    dispatcher: CommandDispatcher<S>,
    rng: Mutex<StdRng>,
    max_list: usize,
}

impl<S: EventStore> LoanService<S> {
    pub fn new(store: S, rng: StdRng, max_list: usize) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store),
            rng: Mutex::new(rng),
            max_list,
        }
    }

    /// Seeded from `rng_seed` when configured, from entropy otherwise.
    pub fn from_config(store: S, config: &AppConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(store, rng, config.max_list)
    }

    fn execute(&self, loan_id: LoanId, command: LoanCommand) -> Result<Loan, DispatchError> {
        self.dispatcher
            .dispatch(loan_id.0, LOAN_AGGREGATE, command, |id| Loan::empty(LoanId::new(id)))
            .inspect_err(|err| {
                tracing::warn!(loan_id = %loan_id, error = %err, "loan command rejected");
            })
    }

    /// File an application: estimate the applicant's score, quote a rate and
    /// record the loan as pending.
    pub fn apply(&self, applicant: UserId, application: LoanApplication) -> Result<Loan, DispatchError> {
        let credit_score = {
            // RNG state stays valid even if a holder panicked.
            let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
            estimate_credit_score(
                application.annual_income.value(),
                &application.employment_status,
                &mut *rng,
            )
            .map_err(DomainError::from)?
        };
        let interest_rate = quote_interest_rate(credit_score, application.loan_type);

        let loan_id = LoanId::new(AggregateId::new());
        let loan = self.execute(
            loan_id,
            LoanCommand::ApplyForLoan(ApplyForLoan {
                loan_id,
                applicant,
                application,
                credit_score,
                interest_rate,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(
            loan_id = %loan_id,
            credit_score = %credit_score,
            interest_rate = %interest_rate,
            "loan application recorded"
        );
        Ok(loan)
    }

    pub fn approve(
        &self,
        loan_id: LoanId,
        amount_approved: MonetaryAmount,
        interest_rate: Option<Decimal>,
        term_months: Option<u32>,
    ) -> Result<Loan, DispatchError> {
        let loan = self.execute(
            loan_id,
            LoanCommand::ApproveLoan(ApproveLoan {
                loan_id,
                amount_approved,
                interest_rate,
                term_months,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(loan_id = %loan_id, amount = %amount_approved, "loan approved");
        Ok(loan)
    }

    pub fn reject(&self, loan_id: LoanId, reason: Option<String>) -> Result<Loan, DispatchError> {
        let loan = self.execute(
            loan_id,
            LoanCommand::RejectLoan(RejectLoan {
                loan_id,
                reason,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(loan_id = %loan_id, "loan rejected");
        Ok(loan)
    }

    pub fn disburse(&self, loan_id: LoanId, disbursed_on: NaiveDate) -> Result<Loan, DispatchError> {
        let loan = self.execute(
            loan_id,
            LoanCommand::DisburseLoan(DisburseLoan {
                loan_id,
                disbursed_on,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(loan_id = %loan_id, %disbursed_on, "loan disbursed");
        Ok(loan)
    }

    pub fn repay(&self, loan_id: LoanId, amount: MonetaryAmount) -> Result<Loan, DispatchError> {
        let loan = self.execute(
            loan_id,
            LoanCommand::RecordRepayment(RecordRepayment {
                loan_id,
                amount,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(
            loan_id = %loan_id,
            amount = %amount,
            balance = %loan.balance_remaining(),
            "repayment recorded"
        );
        Ok(loan)
    }

    pub fn mark_defaulted(&self, loan_id: LoanId) -> Result<Loan, DispatchError> {
        let loan = self.execute(
            loan_id,
            LoanCommand::MarkDefaulted(MarkDefaulted {
                loan_id,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::warn!(loan_id = %loan_id, balance = %loan.balance_remaining(), "loan defaulted");
        Ok(loan)
    }

    pub fn delete(&self, loan_id: LoanId) -> Result<(), DispatchError> {
        self.dispatcher.delete(loan_id.0, LOAN_AGGREGATE)?;
        tracing::info!(loan_id = %loan_id, "loan deleted");
        Ok(())
    }

    pub fn find(&self, loan_id: LoanId) -> Result<Option<Loan>, DispatchError> {
        tracing::debug!(loan_id = %loan_id, "loading loan");
        self.dispatcher
            .load(loan_id.0, LOAN_AGGREGATE, |id| Loan::empty(LoanId::new(id)))
    }

    /// Newest first, at most `limit` (the configured default when `None`).
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<Loan>, DispatchError> {
        let mut loans = self.load_all()?;
        loans.truncate(limit.unwrap_or(self.max_list));
        Ok(loans)
    }

    pub fn by_status(&self, status: LoanStatus) -> Result<Vec<Loan>, DispatchError> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|l| l.status() == status)
            .collect())
    }

    pub fn by_applicant(&self, applicant: UserId) -> Result<Vec<Loan>, DispatchError> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|l| l.applicant() == Some(applicant))
            .collect())
    }

    /// Stand-alone calculator; touches no stored loan.
    pub fn calculate_payment(
        &self,
        principal: Decimal,
        annual_rate_percent: Decimal,
        term_months: u32,
    ) -> Result<PaymentQuote, DispatchError> {
        let terms = LoanTerms::new(principal, annual_rate_percent, term_months).map_err(DomainError::from)?;
        Ok(quote_payment(&terms).map_err(DomainError::from)?)
    }

    fn load_all(&self) -> Result<Vec<Loan>, DispatchError> {
        let mut loans = self
            .dispatcher
            .load_all(LOAN_AGGREGATE, |id| Loan::empty(LoanId::new(id)))?;
        loans.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_typed().0.as_uuid().cmp(a.id_typed().0.as_uuid()))
        });
        Ok(loans)
    }
}
