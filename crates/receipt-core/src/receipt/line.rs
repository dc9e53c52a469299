//! Reconstruction of one printed line from its band of tokens.

use serde::Serialize;
use tracing::trace;

use super::numbers::NumberRecognizer;
use crate::models::period::Period;
use crate::models::token::Token;

/// Scanner state while walking a band from left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    CollectingName,
    CollectingNumbers,
}

/// A printed line split into a leading name and trailing numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconstructedLine {
    /// Space-joined leading tokens without digits.
    pub name: String,

    /// Numeric fields after the name, with `,` as the decimal separator.
    pub numbers: Vec<String>,

    /// Period found on this line (`<month name> <year>`), if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Period>,
}

impl ReconstructedLine {
    /// Reconstruct a line from the tokens of one band.
    ///
    /// Once a token with digits is seen, no later token joins the name.
    /// Non-numeric tokens after that point are dropped.
    pub fn build(mut tokens: Vec<Token>, nr: &NumberRecognizer, parse_date: bool) -> Self {
        tokens.sort_by(|a, b| {
            a.left
                .total_cmp(&b.left)
                .then(a.source_order.cmp(&b.source_order))
        });

        let mut state = ScanState::CollectingName;
        let mut names = Vec::new();
        let mut numbers = Vec::new();

        for token in &tokens {
            let s = token.text.as_str();
            match state {
                ScanState::CollectingName if !token.has_digits() => names.push(s),
                ScanState::CollectingName => {
                    state = ScanState::CollectingNumbers;
                    if nr.is_number(s) {
                        numbers.push(normalize_number(s));
                    }
                }
                ScanState::CollectingNumbers => {
                    if nr.is_number(s) {
                        numbers.push(normalize_number(s));
                    } else {
                        trace!("dropping trailing token {:?}", s);
                    }
                }
            }
        }

        let date = if parse_date {
            find_date(&tokens, nr)
        } else {
            None
        };

        Self {
            name: names.join(" "),
            numbers,
            date,
        }
    }

    /// Check if the name starts with any `" / "`-separated alternate.
    pub fn matches<'a>(&self, mut alternates: impl Iterator<Item = &'a str>) -> bool {
        alternates.any(|alt| self.name.starts_with(alt))
    }

    /// Pick the numbers at `columns`; negative indices yield an empty value.
    ///
    /// Returns `None` when the line has too few numbers for the largest index.
    pub fn extract(&self, columns: &[i32]) -> Option<Vec<String>> {
        if let Some(&max) = columns.iter().max() {
            if usize::try_from(max).is_ok_and(|max| max >= self.numbers.len()) {
                trace!(
                    "can not extract {:?} from {:?} for {:?}",
                    columns, self.numbers, self.name
                );
                return None;
            }
        }

        Some(
            columns
                .iter()
                .map(|&index| match usize::try_from(index) {
                    Ok(index) => self.numbers[index].clone(),
                    Err(_) => String::new(),
                })
                .collect(),
        )
    }
}

fn normalize_number(s: &str) -> String {
    s.replace('.', ",")
}

/// Find the first `<month name> <year>` pair; the first token is never a year.
fn find_date(tokens: &[Token], nr: &NumberRecognizer) -> Option<Period> {
    tokens.windows(2).find_map(|pair| {
        let year = &pair[1].text;
        if !nr.is_year(year) {
            return None;
        }
        let month = nr.get_month_number(&pair[0].text)?;
        Some(Period::new(year.parse().ok()?, month))
    })
}
