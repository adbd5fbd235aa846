//! Cars ETL Core Library
//!
//! Incremental extract-transform-load pipeline for tabular car-listing
//! records.
//!
//! # Architecture
//!
//! - **config**: CARS_* environment configuration
//! - **model**: listing rows, enriched rows, batches
//! - **ledger**: append-only log of fully committed source files
//! - **rates**: currency rate resolver with a fixed fallback
//! - **extract**: file discovery, ledger filtering, batch assembly
//! - **transform**: pure cleaning and feature derivation
//! - **load**: dual-sink append (SQLite table + CSV file) + ledger commit
//! - **visualize**: post-load reporting seam
//! - **pipeline**: run orchestration
//!
//! The central contract: the ledger commit is the only durability
//! marker. Every sink write before it is an at-least-once effect, so a
//! failed run leaves its source files uncommitted and the next run
//! re-extracts them.
//!
//! # Example
//!
//! ```no_run
//! use cars_etl::{config::EtlConfig, pipeline::Pipeline, visualize::NoopVisualizer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EtlConfig::load()?;
//!     let pipeline = Pipeline::new(config)?;
//!     let outcome = pipeline.run(&NoopVisualizer).await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod extract;
pub mod ledger;
pub mod load;
pub mod model;
pub mod pipeline;
pub mod rates;
pub mod transform;
pub mod visualize;

pub use config::EtlConfig;
pub use extract::{ExtractOutcome, Extractor};
pub use ledger::ProcessedLedger;
pub use load::Loader;
pub use model::{EnrichedListing, Listing, MileageCategory, RawBatch};
pub use pipeline::{Pipeline, RunOutcome, RunSummary};
pub use rates::{RateResolver, RateSource, ResolvedRate};
pub use transform::{transform, EnrichedBatch, TransformStats};
pub use visualize::{NoopVisualizer, SummaryReportVisualizer, Visualizer};
