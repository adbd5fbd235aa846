//! Cars ETL CLI - Main entry point

use cars_cli::{Cli, Commands};
use cars_common::logging::{init_logging, LogConfig, LogLevel};
use clap::Parser;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag and environment
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("cars".to_string())
        .build();

    // Environment variables take precedence
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    // The CLI should still work if logging cannot be initialized
    let _ = init_logging(&log_config);

    let result = match cli.command {
        Commands::Run { data_dir, no_reports } => {
            cars_cli::commands::run::run(data_dir, no_reports).await
        },
        Commands::Status => cars_cli::commands::status::run().await,
        Commands::Init => cars_cli::commands::init::run(),
    };

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
