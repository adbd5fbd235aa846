//! `cars run` - one end-to-end pipeline cycle

use anyhow::Result;
use cars_etl::{
    EnrichedListing, EtlConfig, NoopVisualizer, Pipeline, RunOutcome, SummaryReportVisualizer,
    Visualizer,
};
use comfy_table::Table;

/// Rows shown from the enriched batch after a completed run
const PREVIEW_ROWS: usize = 5;

pub async fn run(data_dir: Option<String>, no_reports: bool) -> Result<()> {
    let mut config = EtlConfig::load()?;
    if let Some(dir) = data_dir {
        config.data_dir = dir.into();
    }

    let reports = SummaryReportVisualizer::new(&config.plots_dir);
    let visualizer: &dyn Visualizer = if no_reports { &NoopVisualizer } else { &reports };

    let pipeline = Pipeline::new(config)?;
    match pipeline.run(visualizer).await? {
        RunOutcome::Skipped => {
            println!("No new input files; nothing to do.");
        },
        RunOutcome::Completed(summary) => {
            println!(
                "Loaded {} rows from {} file(s) at rate {} ({:?}).",
                summary.loaded_rows,
                summary.source_files.len(),
                summary.rate,
                summary.rate_source,
            );
            let dropped = summary.stats.dropped_invalid
                + summary.stats.dropped_duplicate
                + summary.stats.dropped_zero_mileage;
            if dropped > 0 {
                println!(
                    "Dropped {} row(s): {} invalid, {} duplicate, {} zero-mileage.",
                    dropped,
                    summary.stats.dropped_invalid,
                    summary.stats.dropped_duplicate,
                    summary.stats.dropped_zero_mileage,
                );
            }
            if !summary.rows.is_empty() {
                println!("{}", preview_table(&summary.rows));
            }
        },
    }

    Ok(())
}

fn preview_table(rows: &[EnrichedListing]) -> Table {
    let mut table = Table::new();
    table.set_header([
        "Manufacturer",
        "Model",
        "Year",
        "Mileage",
        "Category",
        "Price",
        "Price (INR)",
        "Age",
    ]);

    for row in rows.iter().take(PREVIEW_ROWS) {
        table.add_row([
            row.listing.manufacturer.clone(),
            row.listing.model.clone(),
            row.listing.year_of_manufacture.to_string(),
            row.listing.mileage.to_string(),
            row.mileage_category.to_string(),
            row.listing.price.to_string(),
            format!("{:.2}", row.price_inr),
            row.car_age.to_string(),
        ]);
    }

    table
}
