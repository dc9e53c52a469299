//! Schema command - inspect the extraction schema.

use clap::{Args, Subcommand};
use console::style;

use super::Context;

/// Arguments for the schema command.
#[derive(Args)]
pub struct SchemaArgs {
    #[command(subcommand)]
    command: SchemaCommand,
}

#[derive(Subcommand)]
enum SchemaCommand {
    /// Print the schema rows
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the schema files
    Check,
}

pub fn run(args: SchemaArgs, ctx: &Context) -> anyhow::Result<()> {
    match args.command {
        SchemaCommand::Show { json } => show_schema(ctx, json),
        SchemaCommand::Check => check_schema(ctx),
    }
}

fn show_schema(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let schema = ctx.load_schema()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    println!("{}", style(&schema.title).bold());
    println!("Storage: {}", schema.storage_path().display());
    if !schema.columns_names.is_empty() {
        println!("Columns: {}", schema.columns_names.join(", "));
    }
    println!();

    for row in &schema.rows {
        let columns: Vec<String> = row.columns.iter().map(i32::to_string).collect();
        println!("  {} [{}] {}", row.name, row.units, columns.join(","));
    }

    Ok(())
}

fn check_schema(ctx: &Context) -> anyhow::Result<()> {
    let schema = ctx.load_schema()?;

    println!(
        "{} Schema {} is valid: {} rows, {} columns",
        style("✓").green(),
        ctx.schema_path.display(),
        schema.rows.len(),
        schema.columns()
    );

    Ok(())
}
