//! Error types for the receipt-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the receipt library.
#[derive(Error, Debug)]
pub enum ReceiptError {
    /// Text extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Schema loading error.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Period store error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors related to obtaining positioned tokens from a document.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The input document does not exist.
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The external extraction program could not be started.
    #[error("extraction program `{0}` not found")]
    ToolMissing(String),

    /// The external extraction program exited unsuccessfully.
    #[error("`{program}` failed with exit code {code:?}")]
    ToolFailed { program: String, code: Option<i32> },

    /// The TSV header lacks a required column.
    #[error("TSV header has no `{0}` column")]
    MissingColumn(&'static str),

    /// Malformed TSV content.
    #[error("TSV error: {0}")]
    Tsv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or validating an extraction schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Failed to read a schema file.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The JSON metadata file is malformed.
    #[error("invalid schema metadata {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The rows file is not valid CSV.
    #[error("invalid rows file {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    /// The rows file header is not `name units columns`.
    #[error("schema header mismatched in {}: {found:?}", path.display())]
    Header { path: PathBuf, found: Vec<String> },

    /// A row does not have exactly three fields.
    #[error("expected exactly 3 fields in a row ({}, line {line}), found {found}", path.display())]
    FieldCount {
        path: PathBuf,
        line: usize,
        found: usize,
    },

    /// The column list is not a comma separated list of integers.
    #[error("can not convert column indices `{value}` ({}, line {line})", path.display())]
    ColumnIndices {
        path: PathBuf,
        line: usize,
        value: String,
    },

    /// A column index is below the `-1` placeholder.
    #[error("column index {index} is out of range ({}, line {line})", path.display())]
    IndexOutOfRange {
        path: PathBuf,
        line: usize,
        index: i32,
    },

    /// A row requests more columns than the schema declares.
    #[error("row requests {count} columns but only {declared} are declared ({}, line {line})", path.display())]
    TooManyColumns {
        path: PathBuf,
        line: usize,
        count: usize,
        declared: usize,
    },

    /// The rows file declares no rows.
    #[error("schema {} declares no rows", .0.display())]
    Empty(PathBuf),
}

/// Errors related to the per-period store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error on a period file or the storage directory.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed period file.
    #[error("CSV error in {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    /// Month outside `1..=12`.
    #[error("invalid period {year}-{month}")]
    InvalidPeriod { year: i32, month: u32 },

    /// The file has a different number of rows than the schema.
    #[error("{} has {found} rows, schema declares {expected}", path.display())]
    RowCount {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    /// A row has the wrong number of columns.
    #[error("illegal number of columns in line {line} of {}: expected {expected}, found {found}", path.display())]
    ColumnCount {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A row label differs from the schema row at the same position.
    #[error("line {line} of {} is labelled {found:?}, schema expects {expected:?}", path.display())]
    LabelMismatch {
        path: PathBuf,
        line: usize,
        expected: String,
        found: String,
    },
}

/// Result type for the receipt library.
pub type Result<T> = std::result::Result<T, ReceiptError>;
