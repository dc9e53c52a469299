//! Extraction schema: which rows to pull out of a receipt and which of their
//! numeric columns to keep.
//!
//! A schema is a JSON metadata file pointing at a space-delimited rows file:
//!
//! ```text
//! name units columns
//! "Управление МКД" руб 0,1,2
//! "Содержание газонов / Уборка снега" руб 0,-1,2
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SchemaError;

const ROWS_HEADER: [&str; 3] = ["name", "units", "columns"];

/// Separator between alternate row names in a schema pattern.
pub const ALTERNATES_SEPARATOR: &str = " / ";

/// One expected row of the receipt table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRow {
    /// Row name, possibly `"alt1 / alt2"`. Also used as the output label.
    pub name: String,

    /// Unit label, passed through untouched.
    pub units: String,

    /// Indices into the reconstructed line's numbers; `-1` emits an empty value.
    pub columns: Vec<i32>,
}

impl SchemaRow {
    pub fn new(name: impl Into<String>, units: impl Into<String>, columns: Vec<i32>) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
            columns,
        }
    }

    /// Number of values this row contributes to a period record.
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// JSON metadata describing a schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaMeta {
    #[serde(default)]
    title: String,

    #[serde(default = "default_storage_dir")]
    storage_dir: PathBuf,

    #[serde(default)]
    columns_names: Vec<String>,

    rows_schema_csv_filename: PathBuf,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".data")
}

/// A loaded, validated extraction schema.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSchema {
    /// Human readable title.
    pub title: String,

    /// Storage directory, relative to the schema file's directory.
    pub storage_dir: PathBuf,

    /// Declared output column labels.
    pub columns_names: Vec<String>,

    /// Expected rows in output order.
    pub rows: Vec<SchemaRow>,

    /// File the schema was loaded from.
    #[serde(skip)]
    source: PathBuf,
}

impl ExtractionSchema {
    /// Load a schema from its JSON metadata file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let meta: SchemaMeta =
            serde_json::from_str(&content).map_err(|source| SchemaError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Schema metadata: {:?}", meta);

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let rows_path = base.join(&meta.rows_schema_csv_filename);
        let rows = load_rows(&rows_path, meta.columns_names.len())?;

        Ok(Self {
            title: meta.title,
            storage_dir: meta.storage_dir,
            columns_names: meta.columns_names,
            rows,
            source: path.to_path_buf(),
        })
    }

    /// Load a schema from a bare rows file, without JSON metadata.
    pub fn from_rows_file(path: &Path) -> Result<Self, SchemaError> {
        let rows = load_rows(path, 0)?;
        Ok(Self::from_rows(rows).with_source(path))
    }

    /// Build a schema from rows already in memory.
    pub fn from_rows(rows: Vec<SchemaRow>) -> Self {
        Self {
            title: String::new(),
            storage_dir: default_storage_dir(),
            columns_names: Vec::new(),
            rows,
            source: PathBuf::new(),
        }
    }

    /// Set the file the schema is considered to be loaded from.
    pub fn with_source(mut self, path: &Path) -> Self {
        self.source = path.to_path_buf();
        self
    }

    /// Set the storage directory.
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// File the schema was loaded from (empty if built in memory).
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Storage directory resolved against the schema file's directory.
    pub fn storage_path(&self) -> PathBuf {
        self.source
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&self.storage_dir)
    }

    /// Number of declared output columns.
    pub fn columns(&self) -> usize {
        self.columns_names.len()
    }
}

fn load_rows(path: &Path, declared_columns: usize) -> Result<Vec<SchemaRow>, SchemaError> {
    let file = File::open(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rows(file, path, declared_columns)
}

/// Parse a rows file. `declared_columns == 0` disables the width check.
pub fn parse_rows<R: Read>(
    reader: R,
    path: &Path,
    declared_columns: usize,
) -> Result<Vec<SchemaRow>, SchemaError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let csv_error = |source| SchemaError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(csv_error)?,
        None => csv::StringRecord::new(),
    };
    if header.iter().ne(ROWS_HEADER) {
        return Err(SchemaError::Header {
            path: path.to_path_buf(),
            found: header.iter().map(str::to_string).collect(),
        });
    }

    let mut rows = Vec::new();
    for (i, record) in records.enumerate() {
        let line = i + 2;
        let record = record.map_err(csv_error)?;
        if record.len() != 3 {
            return Err(SchemaError::FieldCount {
                path: path.to_path_buf(),
                line,
                found: record.len(),
            });
        }

        let columns = parse_columns(&record[2]).ok_or_else(|| SchemaError::ColumnIndices {
            path: path.to_path_buf(),
            line,
            value: record[2].to_string(),
        })?;
        if let Some(&index) = columns.iter().find(|&&index| index < -1) {
            return Err(SchemaError::IndexOutOfRange {
                path: path.to_path_buf(),
                line,
                index,
            });
        }
        if declared_columns > 0 && columns.len() > declared_columns {
            return Err(SchemaError::TooManyColumns {
                path: path.to_path_buf(),
                line,
                count: columns.len(),
                declared: declared_columns,
            });
        }

        rows.push(SchemaRow::new(&record[0], &record[1], columns));
    }

    if rows.is_empty() {
        return Err(SchemaError::Empty(path.to_path_buf()));
    }

    debug!("Loaded {} schema rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn parse_columns(s: &str) -> Option<Vec<i32>> {
    s.split(',').map(|part| part.trim().parse().ok()).collect()
}
