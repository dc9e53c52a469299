//! List command - archived years and months.

use console::style;

use receipt_core::models::period::month_name;

use super::Context;

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open_store()?;

    let years = store.available_years();
    if years.is_empty() {
        println!(
            "{} No periods archived in {}",
            style("ℹ").blue(),
            store.dir().display()
        );
        return Ok(());
    }

    for year in years {
        let months: Vec<&str> = store
            .months(year)
            .into_iter()
            .filter_map(month_name)
            .collect();
        println!("{}: {}", style(year).bold(), months.join(", "));
    }

    Ok(())
}
