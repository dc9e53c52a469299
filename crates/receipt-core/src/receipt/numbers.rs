//! Token classifiers: numeric values, years, and month names.

use std::collections::HashMap;
use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;

use crate::models::period::MONTH_NAMES;

/// Literal used on receipts for "no value".
pub const DASH: &str = "-";

/// Placeholder written for rows that could not be resolved.
pub const UNRESOLVED: &str = "?";

/// Classifies token texts as numbers, years, or month names.
///
/// Each matcher decides on a single token, so the line scanner can make a
/// greedy left-to-right decision without backtracking.
#[derive(Debug, Clone)]
pub struct NumberRecognizer {
    number: Regex,
    year: Regex,
    months: HashMap<&'static str, u32>,
}

impl NumberRecognizer {
    pub fn new() -> Self {
        let months = MONTH_NAMES
            .iter()
            .zip(1..)
            .map(|(&name, number)| (name, number))
            .collect();

        Self {
            number: Regex::new(r"^-?\d{1,10}([.,]\d{0,6})?$")
                .expect("number pattern is valid"),
            year: Regex::new(r"^20\d{2}$").expect("year pattern is valid"),
            months,
        }
    }

    /// Check if the text is a number (`12`, `-3,5`, `1.25`) or the `-` placeholder.
    pub fn is_number(&self, s: &str) -> bool {
        s == DASH || self.number.is_match(s)
    }

    /// Check if the text is a year between 2000 and 2099.
    pub fn is_year(&self, s: &str) -> bool {
        self.year.is_match(s)
    }

    /// 1-based month number of an exact month name.
    pub fn get_month_number(&self, s: &str) -> Option<u32> {
        self.months.get(s).copied()
    }
}

impl Default for NumberRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a stored value such as `1234,56`.
///
/// Placeholders (`?`, `-`, empty) count as zero; anything else unparseable
/// returns `None`.
pub fn parse_value(s: &str) -> Option<Decimal> {
    match s.trim() {
        "" | DASH | UNRESOLVED => Some(Decimal::ZERO),
        value => Decimal::from_str(&value.replace(',', ".")).ok(),
    }
}
