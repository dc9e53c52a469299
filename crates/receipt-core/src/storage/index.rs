//! In-memory index of which months are stored for each year.

use std::collections::BTreeMap;

/// Year to bitmask of stored months (bit `n` set for month `n`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearIndex {
    masks: BTreeMap<i32, u16>,
}

impl YearIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a month as present. Returns `(new_year, new_month)`.
    ///
    /// Months outside `1..=12` are ignored.
    pub fn insert(&mut self, year: i32, month: u32) -> (bool, bool) {
        if !(1..=12).contains(&month) {
            return (false, false);
        }
        let bit = 1u16 << month;
        let new_year = !self.masks.contains_key(&year);
        let mask = self.masks.entry(year).or_insert(0);
        let new_month = *mask & bit == 0;
        *mask |= bit;
        (new_year, new_month)
    }

    pub fn contains(&self, year: i32, month: u32) -> bool {
        (1..=12).contains(&month)
            && self
                .masks
                .get(&year)
                .is_some_and(|mask| mask & (1u16 << month) != 0)
    }

    /// Years with at least one month, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.masks.keys().copied().collect()
    }

    /// Stored months of `year`, ascending.
    pub fn months(&self, year: i32) -> Vec<u32> {
        (1..=12).filter(|&month| self.contains(year, month)).collect()
    }
}
