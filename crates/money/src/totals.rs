//! Invoice line items and subtotal / tax / total arithmetic.
//!
//! Rounding happens in exactly two places: each line total is rounded to the
//! cent when the line is built, and the tax amount is rounded to the cent once.
//! The subtotal and grand total are exact sums of already-rounded figures, so
//! the displayed lines, tax and total always add up.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use moneydesk_core::ValueObject;

use crate::amount::MonetaryAmount;
use crate::error::{MoneyError, MoneyResult};

/// One invoice row. `total` is always `quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LineItemRecord")]
pub struct InvoiceLineItem {
    description: String,
    quantity: Decimal,
    unit_price: MonetaryAmount,
    total: MonetaryAmount,
}

/// Wire shape of a line item; `total` is ignored and recomputed.
#[derive(Deserialize)]
struct LineItemRecord {
    description: String,
    quantity: Decimal,
    unit_price: MonetaryAmount,
}

impl InvoiceLineItem {
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: MonetaryAmount,
    ) -> MoneyResult<Self> {
        let total = line_total(quantity, unit_price)?;
        Ok(Self {
            description: description.into(),
            quantity,
            unit_price,
            total,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_price(&self) -> MonetaryAmount {
        self.unit_price
    }

    pub fn total(&self) -> MonetaryAmount {
        self.total
    }

    pub fn with_quantity(&self, quantity: Decimal) -> MoneyResult<Self> {
        Self::new(self.description.clone(), quantity, self.unit_price)
    }

    pub fn with_unit_price(&self, unit_price: MonetaryAmount) -> MoneyResult<Self> {
        Self::new(self.description.clone(), self.quantity, unit_price)
    }
}

impl ValueObject for InvoiceLineItem {}

impl TryFrom<LineItemRecord> for InvoiceLineItem {
    type Error = MoneyError;

    fn try_from(value: LineItemRecord) -> Result<Self, Self::Error> {
        Self::new(value.description, value.quantity, value.unit_price)
    }
}

fn line_total(quantity: Decimal, unit_price: MonetaryAmount) -> MoneyResult<MonetaryAmount> {
    if quantity.is_sign_negative() && !quantity.is_zero() {
        return Err(MoneyError::negative("quantity", quantity));
    }
    let raw = quantity
        .checked_mul(unit_price.value())
        .ok_or(MoneyError::Overflow("line total"))?;
    MonetaryAmount::new(raw)
}

/// Derived invoice figures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: MonetaryAmount,
    pub tax_amount: MonetaryAmount,
    pub total_amount: MonetaryAmount,
}

impl InvoiceTotals {
    pub const ZERO: Self = Self {
        subtotal: MonetaryAmount::ZERO,
        tax_amount: MonetaryAmount::ZERO,
        total_amount: MonetaryAmount::ZERO,
    };
}

/// Compute subtotal, tax and total for `items` at `tax_rate_percent`
/// (`8.25` means 8.25%).
pub fn compute_invoice_totals(
    items: &[InvoiceLineItem],
    tax_rate_percent: Decimal,
) -> MoneyResult<InvoiceTotals> {
    if tax_rate_percent.is_sign_negative() && !tax_rate_percent.is_zero() {
        return Err(MoneyError::negative("tax rate", tax_rate_percent));
    }

    let subtotal = items
        .iter()
        .try_fold(MonetaryAmount::ZERO, |sum, item| sum.checked_add(item.total()))?;

    let raw_tax = subtotal
        .value()
        .checked_mul(tax_rate_percent)
        .ok_or(MoneyError::Overflow("tax amount"))?
        / Decimal::ONE_HUNDRED;
    let tax_amount = MonetaryAmount::new(raw_tax)?;
    let total_amount = subtotal.checked_add(tax_amount)?;

    Ok(InvoiceTotals {
        subtotal,
        tax_amount,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn item(quantity: Decimal, price: Decimal) -> InvoiceLineItem {
        InvoiceLineItem::new("Consulting", quantity, MonetaryAmount::new(price).unwrap()).unwrap()
    }

    #[test]
    fn line_total_is_quantity_times_price() {
        let line = item(dec!(3), dec!(19.99));
        assert_eq!(line.total().value(), dec!(59.97));
    }

    #[test]
    fn fractional_quantities_round_line_total_to_cent() {
        let line = item(dec!(1.5), dec!(0.33));
        assert_eq!(line.total().value(), dec!(0.50));
    }

    #[test]
    fn changing_quantity_or_price_recomputes_total() {
        let line = item(dec!(2), dec!(10));
        assert_eq!(line.with_quantity(dec!(5)).unwrap().total().value(), dec!(50));
        let repriced = line
            .with_unit_price(MonetaryAmount::new(dec!(7.50)).unwrap())
            .unwrap();
        assert_eq!(repriced.total().value(), dec!(15));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let err = InvoiceLineItem::new("x", dec!(-1), MonetaryAmount::ZERO).unwrap_err();
        assert!(matches!(err, MoneyError::Negative { field: "quantity", .. }));
    }

    #[test]
    fn deserialized_total_is_recomputed() {
        let json = r#"{"description":"Widget","quantity":"4","unit_price":"2.50","total":"999"}"#;
        let line: InvoiceLineItem = serde_json::from_str(json).unwrap();
        assert_eq!(line.total().value(), dec!(10.00));
    }

    #[test]
    fn empty_invoice_is_all_zero() {
        let totals = compute_invoice_totals(&[], dec!(8.25)).unwrap();
        assert_eq!(totals, InvoiceTotals::ZERO);
    }

    #[test]
    fn tax_is_rounded_once_and_total_adds_up() {
        let items = vec![item(dec!(1), dec!(10.01)), item(dec!(2), dec!(4.99))];
        let totals = compute_invoice_totals(&items, dec!(8.25)).unwrap();
        assert_eq!(totals.subtotal.value(), dec!(19.99));
        // 19.99 * 0.0825 = 1.649175
        assert_eq!(totals.tax_amount.value(), dec!(1.65));
        assert_eq!(totals.total_amount.value(), dec!(21.64));
    }

    #[test]
    fn negative_tax_rate_is_rejected() {
        let err = compute_invoice_totals(&[], dec!(-1)).unwrap_err();
        assert!(matches!(err, MoneyError::Negative { field: "tax rate", .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: at a zero tax rate the total equals the subtotal.
        #[test]
        fn zero_tax_leaves_total_unchanged(
            lines in prop::collection::vec((1u32..50, 0u64..1_000_000), 0..12)
        ) {
            let items: Vec<InvoiceLineItem> = lines
                .iter()
                .map(|(qty, cents)| {
                    InvoiceLineItem::new("line", Decimal::from(*qty), MonetaryAmount::from_cents(*cents))
                        .unwrap()
                })
                .collect();
            let totals = compute_invoice_totals(&items, Decimal::ZERO).unwrap();
            prop_assert_eq!(totals.total_amount, totals.subtotal);
            prop_assert!(totals.tax_amount.is_zero());
        }

        /// Property: total = subtotal + tax, and subtotal = sum of line totals.
        #[test]
        fn totals_are_consistent(
            lines in prop::collection::vec((1u32..50, 0u64..1_000_000), 0..12),
            rate_bp in 0u32..3_000
        ) {
            let items: Vec<InvoiceLineItem> = lines
                .iter()
                .map(|(qty, cents)| {
                    InvoiceLineItem::new("line", Decimal::from(*qty), MonetaryAmount::from_cents(*cents))
                        .unwrap()
                })
                .collect();
            let rate = Decimal::new(rate_bp as i64, 2);
            let totals = compute_invoice_totals(&items, rate).unwrap();
            let sum: Decimal = items.iter().map(|i| i.total().value()).sum();
            prop_assert_eq!(totals.subtotal.value(), sum);
            prop_assert_eq!(
                totals.total_amount.value(),
                totals.subtotal.value() + totals.tax_amount.value()
            );
        }
    }
}
