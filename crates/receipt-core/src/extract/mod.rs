//! Positioned token input: `pdftotext -tsv` word boxes.

mod pdftotext;

pub use pdftotext::PdfToText;

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::token::Token;
use crate::receipt::{group_by_band, ReceiptLineSet};

/// TSV `level` of word records; lower levels are page/block/line markers.
const WORD_LEVEL: u32 = 5;

const REQUIRED_COLUMNS: [&str; 3] = ["left", "top", "text"];

/// Source of positioned tokens for a document.
pub trait TokenSource {
    /// Extract the positioned tokens of `input`.
    fn tokens(&self, input: &Path) -> Result<Vec<Token>, ExtractionError>;

    /// Extract tokens and reconstruct the receipt lines.
    fn line_set(&self, input: &Path) -> Result<ReceiptLineSet, ExtractionError> {
        Ok(parse_tokens(self.tokens(input)?))
    }
}

/// Reads tokens from an already extracted TSV file.
#[derive(Debug, Clone)]
pub struct TsvFile {
    words_only: bool,
}

impl TsvFile {
    pub fn new(words_only: bool) -> Self {
        Self { words_only }
    }
}

impl Default for TsvFile {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TokenSource for TsvFile {
    fn tokens(&self, input: &Path) -> Result<Vec<Token>, ExtractionError> {
        let file = File::open(input).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ExtractionError::InputNotFound(input.to_path_buf()),
            _ => ExtractionError::Io(e),
        })?;
        read_tokens(file, self.words_only)
    }
}

/// One record of the TSV output. Only the columns the engine reads.
#[derive(Debug, Deserialize)]
struct TsvRecord {
    #[serde(default)]
    level: Option<u32>,
    #[serde(default)]
    line_num: Option<u32>,
    left: f64,
    top: String,
    #[serde(default)]
    text: String,
}

/// Read tokens from tab-separated `pdftotext -tsv` output.
///
/// The header must name `left`, `top` and `text`. With `words_only`, records
/// whose `level` is not the word level are skipped.
pub fn read_tokens<R: Read>(reader: R, words_only: bool) -> Result<Vec<Token>, ExtractionError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    debug!("TSV columns: {:?}", headers);
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ExtractionError::MissingColumn(column));
        }
    }

    let mut tokens = Vec::new();
    for (source_order, record) in reader.deserialize::<TsvRecord>().enumerate() {
        let record = record?;
        if words_only && record.level.is_some_and(|level| level != WORD_LEVEL) {
            continue;
        }
        tokens.push(Token {
            text: record.text,
            left: record.left,
            band: record.top,
            source_order,
            line_num: record.line_num,
        });
    }

    debug!("Read {} tokens", tokens.len());
    Ok(tokens)
}

/// Group tokens into bands and reconstruct every line.
pub fn parse_tokens(tokens: Vec<Token>) -> ReceiptLineSet {
    let mut set = ReceiptLineSet::new();
    for band in group_by_band(tokens) {
        set.add_line(band.tokens);
    }
    set
}
