//! Year command - show the archived months of a year.

use std::cmp::Ordering;

use chrono::Datelike;
use clap::Args;
use console::style;
use tracing::info;

use receipt_core::models::period::month_name;
use receipt_core::receipt::{parse_value, UNRESOLVED};
use receipt_core::YearTable;

use super::Context;

/// Arguments for the year command.
#[derive(Args)]
pub struct YearArgs {
    /// Year to show (default: latest archived year)
    year: Option<i32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: YearFormat,

    /// Highlight changes against the previous month
    #[arg(long)]
    compare: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum YearFormat {
    /// Aligned table, one column group per month
    Text,
    /// Comma separated, one column per month value
    Csv,
    /// The loaded year as JSON
    Json,
}

pub fn run(args: YearArgs, ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open_store()?;

    let year = match args.year {
        Some(year) => year,
        None => store
            .available_years()
            .last()
            .copied()
            .unwrap_or_else(|| chrono::Local::now().year()),
    };
    info!("Loading year {} from {}", year, store.dir().display());

    let table = store.load_year(year);
    if table.is_empty() {
        println!("{} No months archived for {}", style("ℹ").blue(), year);
        return Ok(());
    }

    match args.format {
        YearFormat::Text => print!("{}", format_text(&table, args.compare)),
        YearFormat::Csv => print!("{}", format_csv(&table)?),
        YearFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
    }

    Ok(())
}

fn heading(month: u32) -> String {
    month_name(month)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:02}", month))
}

/// Values of `row` for the month at `month_pos`.
fn month_values(table: &YearTable, row: usize, month_pos: usize) -> &[String] {
    let width = table.widths[row];
    let start = month_pos * width;
    table.rows[row].get(start..start + width).unwrap_or(&[])
}

fn format_text(table: &YearTable, compare: bool) -> String {
    let name_width = table
        .names
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0);

    // Width of each month group: widest heading or joined values.
    let group_widths: Vec<usize> = (0..table.months.len())
        .map(|pos| {
            let values = (0..table.names.len())
                .map(|row| month_values(table, row, pos).join(" ").chars().count())
                .max()
                .unwrap_or(0);
            values.max(heading(table.months[pos]).chars().count())
        })
        .collect();

    let mut output = String::new();

    output.push_str(&format!("{}\n", style(table.year).bold()));
    output.push_str(&format!("{:name_width$}", ""));
    for (pos, &month) in table.months.iter().enumerate() {
        output.push_str(&format!(" | {:>w$}", heading(month), w = group_widths[pos]));
    }
    output.push('\n');

    for (row, name) in table.names.iter().enumerate() {
        output.push_str(&format!("{:name_width$}", name));
        for pos in 0..table.months.len() {
            let values = month_values(table, row, pos);
            let plain = values.join(" ");
            let pad = group_widths[pos].saturating_sub(plain.chars().count());

            let cell = if compare {
                values
                    .iter()
                    .enumerate()
                    .map(|(column, value)| highlight(table, row, pos, column, value))
                    .collect::<Vec<_>>()
                    .join(" ")
            } else {
                plain
            };
            output.push_str(&format!(" | {}{}", " ".repeat(pad), cell));
        }
        output.push('\n');
    }

    output
}

/// Colour `value` by its change against the same column of the previous month.
fn highlight(table: &YearTable, row: usize, pos: usize, column: usize, value: &str) -> String {
    if value == UNRESOLVED {
        return style(value).dim().to_string();
    }
    if pos == 0 {
        return value.to_string();
    }

    let previous = table.cell(row, pos - 1, column).and_then(parse_value);
    let current = parse_value(value);
    match current.zip(previous).map(|(c, p)| c.cmp(&p)) {
        Some(Ordering::Greater) => style(value).red().to_string(),
        Some(Ordering::Less) => style(value).green().to_string(),
        _ => value.to_string(),
    }
}

fn format_csv(table: &YearTable) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let max_width = table.widths.iter().copied().max().unwrap_or(0);

    let mut header = vec!["name".to_string()];
    for &month in &table.months {
        for column in 0..max_width {
            header.push(format!("{:04}-{:02}.{}", table.year, month, column + 1));
        }
    }
    wtr.write_record(&header)?;

    for (row, name) in table.names.iter().enumerate() {
        let mut record = vec![name.clone()];
        for pos in 0..table.months.len() {
            let values = month_values(table, row, pos);
            record.extend(values.iter().cloned());
            record.extend(std::iter::repeat_n(String::new(), max_width - values.len()));
        }
        wtr.write_record(&record)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}
