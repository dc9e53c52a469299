//! Billing period (year and month) of a receipt.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Russian month names in nominative case, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "Январь",
    "Февраль",
    "Март",
    "Апрель",
    "Май",
    "Июнь",
    "Июль",
    "Август",
    "Сентябрь",
    "Октябрь",
    "Ноябрь",
    "Декабрь",
];

/// A (year, month) pair identifying one persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    /// Month number, 1-based.
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Check if the month lies in `1..=12` and the year has at most four
    /// digits, so the file name round-trips through a directory scan.
    pub fn is_valid(&self) -> bool {
        (0..=9999).contains(&self.year) && (1..=12).contains(&self.month)
    }

    /// File name of the period record, e.g. `2024-07.csv`.
    pub fn file_name(&self) -> String {
        format!("{self}.csv")
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Localized name of a 1-based month number.
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(index).copied()
}
