//! CLI application for receipt table extraction.

mod commands;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, import, list, process, schema, year, Context};

/// Receipt tables - Extract schema rows from receipt PDFs and archive them by month
#[derive(Parser)]
#[command(name = "receipt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to schema JSON (overrides the config)
    #[arg(short, long, global = true)]
    schema: Option<PathBuf>,

    /// Write log to FILE instead of stderr
    #[arg(short, long, global = true, value_name = "FILE")]
    log: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single receipt to a schema CSV
    Process(process::ProcessArgs),

    /// Add receipts to the monthly archive
    Import(import::ImportArgs),

    /// Show the archived months of a year
    Year(year::YearArgs),

    /// List archived years and months
    List,

    /// Inspect the extraction schema
    Schema(schema::SchemaArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false);

    match &cli.log {
        Some(path) => {
            let file = File::create(path)?;
            let subscriber = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = builder.with_writer(std::io::stderr).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    // Execute command
    let context = || Context::load(cli.config.as_deref(), cli.schema.as_deref());
    match cli.command {
        Commands::Process(args) => process::run(args, &context()?),
        Commands::Import(args) => import::run(args, &context()?),
        Commands::Year(args) => year::run(args, &context()?),
        Commands::List => list::run(&context()?),
        Commands::Schema(args) => schema::run(args, &context()?),
        Commands::Config(args) => config::run(args, cli.config.as_deref()),
    }
}
