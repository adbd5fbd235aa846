//! `cars init` - create the working directories

use anyhow::{Context, Result};
use cars_etl::EtlConfig;
use tracing::info;

pub fn run() -> Result<()> {
    let config = EtlConfig::load()?;

    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!("Failed to create data directory {}", config.data_dir.display())
    })?;
    std::fs::create_dir_all(&config.plots_dir).with_context(|| {
        format!("Failed to create reports directory {}", config.plots_dir.display())
    })?;

    info!(
        data_dir = %config.data_dir.display(),
        plots_dir = %config.plots_dir.display(),
        "Initialized working directories"
    );
    println!("Created {}", config.data_dir.display());
    println!("Created {}", config.plots_dir.display());
    println!("Drop CSV files into {} and run `cars run`.", config.data_dir.display());

    Ok(())
}
