//! Subcommands and the state they share.

pub mod config;
pub mod import;
pub mod list;
pub mod process;
pub mod schema;
pub mod year;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::debug;

use receipt_core::{
    ExtractionSchema, PdfToText, PeriodStore, ReceiptConfig, TokenSource, TsvFile,
};

/// Configuration resolved from the command line.
pub struct Context {
    pub config: ReceiptConfig,
    pub schema_path: PathBuf,
}

impl Context {
    /// Load the config file (explicit, default location, or built-in defaults)
    /// and apply the `--schema` override.
    pub fn load(config_path: Option<&Path>, schema_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => ReceiptConfig::from_file(path)?,
            None => {
                let path = config::default_config_path();
                if path.exists() {
                    ReceiptConfig::from_file(&path)?
                } else {
                    ReceiptConfig::default()
                }
            }
        };

        let schema_path = schema_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.schema.path.clone());
        debug!("Using schema {}", schema_path.display());

        Ok(Self {
            config,
            schema_path,
        })
    }

    /// Load the active schema: JSON metadata, or a bare rows CSV.
    pub fn load_schema(&self) -> anyhow::Result<ExtractionSchema> {
        let schema = if is_rows_file(&self.schema_path) {
            ExtractionSchema::from_rows_file(&self.schema_path)
        } else {
            ExtractionSchema::load(&self.schema_path)
        };
        schema.map_err(|e| {
            anyhow::anyhow!("Can not load schema {}: {}", self.schema_path.display(), e)
        })
    }

    /// Open the period store of the active schema.
    pub fn open_store(&self) -> anyhow::Result<PeriodStore> {
        let store = match &self.config.storage.dir {
            Some(dir) => PeriodStore::open_at(dir, self.load_schema()?)?,
            None if is_rows_file(&self.schema_path) => PeriodStore::open(self.load_schema()?)?,
            None => PeriodStore::from_schema_file(&self.schema_path).with_context(|| {
                format!("Can not open the store of {}", self.schema_path.display())
            })?,
        };
        debug!("Opened store at {}", store.dir().display());
        Ok(store)
    }

    /// Token source for `input`: TSV files are read directly, anything else
    /// goes through the external extraction program.
    pub fn token_source(&self, input: &Path) -> Box<dyn TokenSource> {
        if is_tsv(input) {
            Box::new(TsvFile::new(self.config.extraction.words_only))
        } else {
            Box::new(PdfToText::from_config(&self.config.extraction))
        }
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

fn is_tsv(path: &Path) -> bool {
    has_extension(path, "tsv")
}

fn is_rows_file(path: &Path) -> bool {
    has_extension(path, "csv")
}

/// Whether `path` looks like a receipt input.
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_lowercase().as_str(), "pdf" | "tsv"))
}
