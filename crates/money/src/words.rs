//! Long-form English legend for printed checks.

use rust_decimal::Decimal;

use crate::amount::MonetaryAmount;
use crate::error::{MoneyError, MoneyResult};

const ONES: [&str; 10] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
];

const TEENS: [&str; 10] = [
    "Ten",
    "Eleven",
    "Twelve",
    "Thirteen",
    "Fourteen",
    "Fifteen",
    "Sixteen",
    "Seventeen",
    "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

/// Base-1000 scale words, largest first.
const SCALES: [(u64, &str); 4] = [
    (1_000_000_000_000, "Trillion"),
    (1_000_000_000, "Billion"),
    (1_000_000, "Million"),
    (1_000, "Thousand"),
];

/// First whole-dollar amount that has no scale word.
const WORDS_LIMIT: u64 = 1_000_000_000_000_000;

/// Convert an amount to its check legend, e.g.
/// `1234.56` → `"One Thousand Two Hundred Thirty Four Dollars and 56/100"`.
///
/// The amount is rounded to the nearest cent first. The currency word is
/// always the plural "Dollars", including for exactly one dollar. Cents are
/// written as a plain number over 100 and omitted when zero. Exactly zero reads
/// `"Zero Dollars"`; amounts below one dollar have no dollar words at all
/// (`0.50` → `"Dollars and 50/100"`).
pub fn amount_to_words(amount: Decimal) -> MoneyResult<String> {
    MonetaryAmount::new(amount)?.to_words()
}

impl MonetaryAmount {
    /// Check legend for this amount. See [`amount_to_words`].
    pub fn to_words(&self) -> MoneyResult<String> {
        if self.is_zero() {
            return Ok("Zero Dollars".to_string());
        }

        let mut dollars = self.whole_dollars()?;
        if dollars >= WORDS_LIMIT {
            return Err(MoneyError::out_of_range(
                "amount",
                format!("{self} exceeds the largest spellable amount"),
            ));
        }

        let mut groups: Vec<String> = Vec::new();
        for (scale, name) in SCALES {
            if dollars >= scale {
                groups.push(format!("{} {name}", below_thousand(dollars / scale)));
                dollars %= scale;
            }
        }
        if dollars > 0 {
            groups.push(below_thousand(dollars));
        }

        let mut words = groups.join(" ");
        words.push_str(" Dollars");

        let cents = self.cents();
        if cents > 0 {
            words.push_str(&format!(" and {cents}/100"));
        }

        Ok(words.trim().to_string())
    }
}

/// Words for `0..=999`; empty for zero.
fn below_thousand(n: u64) -> String {
    let n = n as usize;
    match n {
        0 => String::new(),
        1..=9 => ONES[n].to_string(),
        10..=19 => TEENS[n - 10].to_string(),
        20..=99 => {
            let tens = TENS[n / 10];
            match n % 10 {
                0 => tens.to_string(),
                ones => format!("{tens} {}", ONES[ones]),
            }
        }
        _ => {
            let hundreds = format!("{} Hundred", ONES[n / 100]);
            match n % 100 {
                0 => hundreds,
                rest => format!("{hundreds} {}", below_thousand(rest as u64)),
            }
        }
    }
}
