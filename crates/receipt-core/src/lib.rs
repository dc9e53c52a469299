//! Core library for receipt table extraction.
//!
//! This crate provides:
//! - Positioned text tokens read from `pdftotext -tsv` output
//! - Line reconstruction (vertical bands, name/number scanning, period recovery)
//! - Schema-driven row matching and export
//! - A per-period CSV store with yearly aggregation

pub mod error;
pub mod extract;
pub mod models;
pub mod receipt;
pub mod storage;

pub use error::{ExtractionError, ReceiptError, Result, SchemaError, StorageError};
pub use extract::{PdfToText, TokenSource, TsvFile, parse_tokens, read_tokens};
pub use models::config::ReceiptConfig;
pub use models::period::Period;
pub use models::schema::{ExtractionSchema, SchemaRow};
pub use models::token::Token;
pub use receipt::{ExportedRow, NumberRecognizer, ReceiptLineSet, ReconstructedLine};
pub use storage::{PeriodStore, SaveOutcome, YearIndex, YearTable};
