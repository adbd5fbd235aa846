//! `cars status` - ledger and sink overview

use anyhow::Result;
use cars_etl::{EtlConfig, Loader, ProcessedLedger};
use comfy_table::Table;

pub async fn run() -> Result<()> {
    let config = EtlConfig::load()?;

    let ledger = ProcessedLedger::open(&config.ledger_path)?;

    // Do not create the database file just to report on it
    let relational_rows = if config.database_path.exists() {
        let loader = Loader::connect(&config).await?;
        loader.row_count().await?
    } else {
        0
    };

    let csv_rows = if config.output_csv.exists() {
        let content = std::fs::read_to_string(&config.output_csv)?;
        content.lines().count().saturating_sub(1) // minus header
    } else {
        0
    };

    let mut table = Table::new();
    table.set_header(["", ""]);
    table.add_row(["Committed files", &ledger.len().to_string()]);
    table.add_row(["Relational rows", &relational_rows.to_string()]);
    table.add_row(["Flat-file rows", &csv_rows.to_string()]);
    println!("{}", table);

    if !ledger.is_empty() {
        let mut files: Vec<&String> = ledger.processed_set().iter().collect();
        files.sort();
        println!("\nCommitted files:");
        for file in files {
            println!("  {}", file);
        }
    }

    Ok(())
}
