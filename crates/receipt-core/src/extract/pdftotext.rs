//! Token extraction by running `pdftotext -tsv` on a PDF.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use super::{read_tokens, TokenSource};
use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::token::Token;

/// Runs an external `pdftotext`-compatible program and reads its TSV output.
#[derive(Debug, Clone)]
pub struct PdfToText {
    program: String,
    words_only: bool,
    keep_tsv: Option<PathBuf>,
}

impl PdfToText {
    /// Create an extractor using `pdftotext` from `PATH`.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            program: config.program.clone(),
            words_only: config.words_only,
            keep_tsv: config.keep_tsv.clone(),
        }
    }

    /// Set the program to run.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Write the intermediate TSV to `path` and leave it there.
    pub fn with_kept_tsv(mut self, path: impl Into<PathBuf>) -> Self {
        self.keep_tsv = Some(path.into());
        self
    }

    fn run(&self, input: &Path, output: &Path) -> Result<(), ExtractionError> {
        info!(
            "Running {} -tsv {} {}",
            self.program,
            input.display(),
            output.display()
        );

        let status = Command::new(&self.program)
            .arg("-tsv")
            .arg(input)
            .arg(output)
            .status()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ExtractionError::ToolMissing(self.program.clone()),
                _ => ExtractionError::Io(e),
            })?;

        info!("{} returned {:?}", self.program, status.code());
        if !status.success() {
            return Err(ExtractionError::ToolFailed {
                program: self.program.clone(),
                code: status.code(),
            });
        }
        Ok(())
    }
}

impl Default for PdfToText {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for PdfToText {
    fn tokens(&self, input: &Path) -> Result<Vec<Token>, ExtractionError> {
        if !input.exists() {
            return Err(ExtractionError::InputNotFound(input.to_path_buf()));
        }

        if let Some(path) = &self.keep_tsv {
            self.run(input, path)?;
            return read_tokens(File::open(path)?, self.words_only);
        }

        // Removed when dropped, on every exit path.
        let tsv = tempfile::Builder::new()
            .prefix("receipt-")
            .suffix(".tsv")
            .tempfile()?;
        self.run(input, tsv.path())?;
        debug!("Reading tokens from {}", tsv.path().display());
        read_tokens(File::open(tsv.path())?, self.words_only)
    }
}
