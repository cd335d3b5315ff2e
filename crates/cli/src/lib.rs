//! Command-line front end for the money calculators.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;

use moneydesk_infra::AppConfig;
use moneydesk_infra::services::quote_payment;
use moneydesk_lending::{LoanType, quote_interest_rate};
use moneydesk_money::{
    CreditScore, InvoiceLineItem, LoanTerms, MonetaryAmount, amount_to_words,
    compute_invoice_totals, estimate_credit_score,
};

#[derive(Debug, Parser)]
#[command(name = "moneydesk")]
#[command(about = "Check legends, invoice totals and loan figures")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Spell out an amount the way it is printed on a check
    Words { amount: Decimal },
    /// Subtotal, tax and total for a set of line items
    Totals {
        /// Line item as `description:quantity:unit_price` (repeatable)
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        /// Tax rate in percent
        #[arg(long, default_value = "0")]
        tax_rate: Decimal,
    },
    /// Monthly payment and lifetime cost of an amortized loan
    Payment {
        principal: Decimal,
        /// Annual rate in percent
        rate: Decimal,
        months: u32,
    },
    /// Heuristic credit score from income and employment
    Score {
        income: Decimal,
        employment: String,
        /// Overrides MONEYDESK_RNG_SEED
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Interest rate offered for a score and loan type
    Rate {
        score: u16,
        #[arg(value_enum, default_value = "personal")]
        loan_type: LoanKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoanKind {
    Personal,
    Business,
    Auto,
    Home,
}

impl From<LoanKind> for LoanType {
    fn from(kind: LoanKind) -> Self {
        match kind {
            LoanKind::Personal => LoanType::Personal,
            LoanKind::Business => LoanType::Business,
            LoanKind::Auto => LoanType::Auto,
            LoanKind::Home => LoanType::Home,
        }
    }
}

/// Run one command and render its output.
pub fn run(command: Command, config: &AppConfig) -> anyhow::Result<String> {
    match command {
        Command::Words { amount } => Ok(amount_to_words(amount)?),
        Command::Totals { items, tax_rate } => {
            let items = items
                .iter()
                .map(|raw| parse_item(raw))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let totals = compute_invoice_totals(&items, tax_rate)?;
            Ok(serde_json::to_string_pretty(&totals)?)
        }
        Command::Payment {
            principal,
            rate,
            months,
        } => {
            let quote = quote_payment(&LoanTerms::new(principal, rate, months)?)?;
            Ok(serde_json::to_string_pretty(&quote)?)
        }
        Command::Score {
            income,
            employment,
            seed,
        } => {
            let mut rng = match seed.or(config.rng_seed) {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let score = estimate_credit_score(income, &employment, &mut rng)?;
            tracing::debug!(%score, "estimated credit score");
            Ok(score.to_string())
        }
        Command::Rate { score, loan_type } => {
            let score = CreditScore::new(score)?;
            Ok(quote_interest_rate(score, loan_type.into()).to_string())
        }
    }
}

fn parse_item(raw: &str) -> anyhow::Result<InvoiceLineItem> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(price), Some(quantity), Some(description)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("line item '{raw}' must look like description:quantity:unit_price");
    };
    let quantity: Decimal = quantity
        .trim()
        .parse()
        .with_context(|| format!("bad quantity in '{raw}'"))?;
    let price: Decimal = price
        .trim()
        .parse()
        .with_context(|| format!("bad unit price in '{raw}'"))?;
    Ok(InvoiceLineItem::new(
        description.trim(),
        quantity,
        MonetaryAmount::new(price)?,
    )?)
}
