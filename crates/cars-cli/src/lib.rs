//! Cars ETL CLI Library
//!
//! Command definitions and handlers for the `cars` binary.

use clap::{Parser, Subcommand};

pub mod commands;

#[derive(Parser, Debug)]
#[command(name = "cars")]
#[command(author, version, about = "Incremental car-listing ETL pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one extract-transform-load cycle over the data directory
    Run {
        /// Data directory to scan (overrides CARS_DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<String>,

        /// Skip the post-load summary reports
        #[arg(long)]
        no_reports: bool,
    },

    /// Show ledger contents and sink row counts
    Status,

    /// Create the data and reports directories
    Init,
}
