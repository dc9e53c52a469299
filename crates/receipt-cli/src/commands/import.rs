//! Import command - add receipts to the monthly archive.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

use receipt_core::{Period, PeriodStore, SaveOutcome};

use super::{is_supported_input, Context};

/// Arguments for the import command.
#[derive(Args)]
pub struct ImportArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of importing a single file.
struct ImportResult {
    path: PathBuf,
    period: Option<Period>,
    outcome: SaveOutcome,
    error: Option<String>,
}

pub fn run(args: ImportArgs, ctx: &Context) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut store = ctx.open_store()?;

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported_input(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to import into {}",
        style("ℹ").blue(),
        files.len(),
        store.dir().display()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files",
            )?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        match import_file(&path, ctx, &mut store) {
            Ok((period, outcome)) => {
                if period.is_none() {
                    warn!("Period was not found in {}, skipped", path.display());
                }
                results.push(ImportResult {
                    path,
                    period,
                    outcome,
                    error: None,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to import {}: {}", path.display(), error_msg);
                    results.push(ImportResult {
                        path,
                        period: None,
                        outcome: SaveOutcome::default(),
                        error: Some(error_msg),
                    });
                } else {
                    pb.abandon();
                    error!("Failed to import {}: {}", path.display(), error_msg);
                    anyhow::bail!("Import failed: {}", error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    print_summary(&results);
    println!(
        "{} Imported {} files in {:?}",
        style("✓").green(),
        results.iter().filter(|r| r.period.is_some()).count(),
        start.elapsed()
    );

    Ok(())
}

/// Recover the period of one receipt and store its export under it.
fn import_file(
    path: &Path,
    ctx: &Context,
    store: &mut PeriodStore,
) -> anyhow::Result<(Option<Period>, SaveOutcome)> {
    let source = ctx.token_source(path);
    let Some((period, outcome)) = store.import(source.as_ref(), path)? else {
        return Ok((None, SaveOutcome::default()));
    };

    debug!("Saved {} as {}", path.display(), period);
    if outcome.new_year {
        info!("New year {} in the archive", period.year);
    }
    if !outcome.new_month {
        info!("Period {} was replaced", period);
    }

    Ok((Some(period), outcome))
}

fn print_summary(results: &[ImportResult]) {
    let mut skipped = Vec::new();
    let mut failed = Vec::new();

    for result in results {
        match (&result.period, &result.error) {
            (Some(period), _) => {
                let mut notes = Vec::new();
                if result.outcome.new_year {
                    notes.push(style("new year").cyan().to_string());
                }
                if result.outcome.new_month {
                    notes.push(style("new month").green().to_string());
                } else {
                    notes.push(style("replaced").yellow().to_string());
                }
                println!(
                    "  {} {} ({})",
                    period,
                    result.path.display(),
                    notes.join(", ")
                );
            }
            (None, Some(error)) => failed.push((&result.path, error)),
            (None, None) => skipped.push(&result.path),
        }
    }

    if !skipped.is_empty() {
        println!();
        println!("{}", style("Skipped files (no period):").yellow());
        for path in &skipped {
            println!("  - {}", path.display());
        }
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (path, error) in &failed {
            println!("  - {}: {}", path.display(), error);
        }
    }
}
