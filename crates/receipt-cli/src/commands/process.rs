//! Process command - convert a single receipt to a schema CSV.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{debug, info, warn};

use receipt_core::{ExportedRow, ExtractionSchema, PdfToText, ReceiptLineSet, TokenSource};

use super::{is_tsv, Context};

/// Output file used when the receipt carries no period.
const DEFAULT_OUTPUT: &str = "out.csv";

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, or TSV already produced by `pdftotext -tsv`)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file, `-` for stdout (default: <YYYY-MM>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Keep the intermediate TSV at this path
    #[arg(short = 't', long, value_name = "FILE")]
    tmp_tsv: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Space-delimited schema rows, the archive format
    Csv,
    /// JSON with the period and resolved rows
    Json,
    /// Reconstructed lines, for checking a schema against a new receipt
    Lines,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    period: Option<String>,
    title: &'a str,
    rows: Vec<ExportedRow>,
}

pub fn run(args: ProcessArgs, ctx: &Context) -> anyhow::Result<()> {
    let start = Instant::now();

    let schema = ctx.load_schema()?;

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let source: Box<dyn TokenSource> = match &args.tmp_tsv {
        Some(path) if !is_tsv(&args.input) => {
            Box::new(PdfToText::from_config(&ctx.config.extraction).with_kept_tsv(path))
        }
        _ => ctx.token_source(&args.input),
    };
    let lines = source.line_set(&args.input).map_err(|e| {
        anyhow::anyhow!("Can not convert {} to tokens: {}", args.input.display(), e)
    })?;

    let output = format_output(&lines, &schema, args.format)?;

    let output_path = match args.output {
        Some(path) => path,
        None => default_output(&lines),
    };

    if output_path == Path::new("-") {
        print!("{}", output);
    } else {
        info!("Writing {:?} data to {}", args.format, output_path.display());
        fs::write(&output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn default_output(lines: &ReceiptLineSet) -> PathBuf {
    match lines.first_period() {
        Some(period) => PathBuf::from(period.file_name()),
        None => {
            warn!("Period was not found in the receipt, writing {}", DEFAULT_OUTPUT);
            PathBuf::from(DEFAULT_OUTPUT)
        }
    }
}

fn format_output(
    lines: &ReceiptLineSet,
    schema: &ExtractionSchema,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Csv => {
            let mut data = Vec::new();
            lines.write_csv(&mut data, &schema.rows)?;
            Ok(String::from_utf8(data)?)
        }
        OutputFormat::Json => {
            let report = JsonReport {
                period: lines.first_period().map(|p| p.to_string()),
                title: &schema.title,
                rows: lines.export(&schema.rows),
            };
            Ok(serde_json::to_string_pretty(&report)? + "\n")
        }
        OutputFormat::Lines => Ok(format_lines(lines)),
    }
}

fn format_lines(lines: &ReceiptLineSet) -> String {
    let mut output = String::new();

    output.push_str(&format!("Period: {}\n", lines.first_strdate()));
    for (i, line) in lines.lines().iter().enumerate() {
        output.push_str(&format!(
            "{:3}: {:?} [{}]\n",
            i + 1,
            line.name,
            line.numbers.join(" ")
        ));
    }

    output
}
