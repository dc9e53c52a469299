//! Receipt line reconstruction and schema matching.

mod bands;
mod line;
mod numbers;

pub use bands::{group_by_band, Band};
pub use line::ReconstructedLine;
pub use numbers::{parse_value, NumberRecognizer, DASH, UNRESOLVED};

use std::io::Write;

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::period::Period;
use crate::models::schema::{SchemaRow, ALTERNATES_SEPARATOR};
use crate::models::token::Token;

/// One output row: the schema row label followed by its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedRow {
    pub name: String,
    pub values: Vec<String>,
}

impl ExportedRow {
    /// Whether every value was resolved from the receipt.
    pub fn is_resolved(&self) -> bool {
        !self.values.iter().any(|v| v == UNRESOLVED)
    }
}

/// All reconstructed lines of one receipt.
#[derive(Debug, Clone, Default)]
pub struct ReceiptLineSet {
    nr: NumberRecognizer,
    first_date: Option<Period>,
    lines: Vec<ReconstructedLine>,
}

impl ReceiptLineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruct a band and append it.
    ///
    /// Dates are only looked for until the first one is found.
    pub fn add_line(&mut self, band: Vec<Token>) {
        let line = ReconstructedLine::build(band, &self.nr, self.first_date.is_none());
        if self.first_date.is_none() {
            if let Some(date) = line.date {
                debug!("Receipt period {} found on line {:?}", date, line.name);
                self.first_date = Some(date);
            }
        }
        self.lines.push(line);
    }

    /// Period of the receipt, if any line carried one.
    pub fn first_period(&self) -> Option<Period> {
        self.first_date
    }

    /// Period as `YYYY-MM`, or `unknown`.
    pub fn first_strdate(&self) -> String {
        self.first_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Reconstructed lines in band order.
    pub fn lines(&self) -> &[ReconstructedLine] {
        &self.lines
    }

    /// Find the values of the first line whose name starts with one of the
    /// alternates in `pattern` and that has enough numbers for `columns`.
    ///
    /// A matching line with too few numbers is skipped, not fatal.
    pub fn find_values(&self, pattern: &str, columns: &[i32]) -> Option<Vec<String>> {
        self.lines
            .iter()
            .filter(|line| line.matches(pattern.split(ALTERNATES_SEPARATOR)))
            .find_map(|line| line.extract(columns))
    }

    /// Resolve every schema row, substituting `?` for rows that are missing.
    pub fn export(&self, rows: &[SchemaRow]) -> Vec<ExportedRow> {
        rows.iter()
            .map(|row| {
                let values = self
                    .find_values(&row.name, &row.columns)
                    .unwrap_or_else(|| {
                        warn!("row {:?} is broken in {}", row.name, self.first_strdate());
                        vec![UNRESOLVED.to_string(); row.width()]
                    });
                ExportedRow {
                    name: row.name.clone(),
                    values,
                }
            })
            .collect()
    }

    /// Write the export as a space-delimited CSV.
    pub fn write_csv<W: Write>(&self, writer: W, rows: &[SchemaRow]) -> Result<(), csv::Error> {
        let mut writer = record_writer(writer);
        for row in self.export(rows) {
            writer.write_record(std::iter::once(&row.name).chain(&row.values))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Writer for the space-delimited, minimally quoted record format.
pub(crate) fn record_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b' ')
        .quote_style(csv::QuoteStyle::Necessary)
        .flexible(true)
        .from_writer(writer)
}
