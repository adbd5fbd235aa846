//! Pipeline orchestrator
//!
//! Sequences extract → transform → load → visualize for one run. No
//! logic of its own beyond sequencing, short-circuiting on no-work,
//! and keeping visualization failures out of the run result.

use crate::config::EtlConfig;
use crate::extract::{ExtractOutcome, Extractor};
use crate::ledger::ProcessedLedger;
use crate::load::Loader;
use crate::model::EnrichedListing;
use crate::rates::{RateResolver, RateSource};
use crate::transform::{transform, TransformStats};
use crate::visualize::Visualizer;
use cars_common::Result;
use chrono::{Datelike, Utc};
use tracing::{error, info};
use uuid::Uuid;

/// Stages a run moves through, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Extracting,
    Transforming,
    Loading,
    Visualizing,
    Done,
    Skipped,
}

/// What a completed run produced
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: Uuid,

    /// Source files committed by this run
    pub source_files: Vec<String>,

    /// Rows extracted before cleaning
    pub extracted_rows: usize,

    /// Rows written to both sinks
    pub loaded_rows: usize,

    /// Cleaning and derivation drop counts
    pub stats: TransformStats,

    /// Exchange rate applied to the batch
    pub rate: f64,

    /// Whether the rate came from the endpoint or the fallback
    pub rate_source: RateSource,

    /// The enriched batch, for downstream consumers
    pub rows: Vec<EnrichedListing>,
}

/// Result of one pipeline run
#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing new to process; no sink or ledger mutation
    Skipped,
    Completed(RunSummary),
}

/// One-batch-at-a-time ETL runner.
///
/// Deployment constraint: a single runner per ledger/sink pair. No
/// locks are taken against concurrent runs.
pub struct Pipeline {
    config: EtlConfig,
}

impl Pipeline {
    pub fn new(config: EtlConfig) -> Result<Self> {
        config.rates.validate()?;
        Ok(Pipeline { config })
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// Run one end-to-end cycle using the wall-clock year
    pub async fn run(&self, visualizer: &dyn Visualizer) -> Result<RunOutcome> {
        self.run_with_year(visualizer, i64::from(Utc::now().year())).await
    }

    /// Run one end-to-end cycle with an injected current year
    pub async fn run_with_year(
        &self,
        visualizer: &dyn Visualizer,
        current_year: i64,
    ) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        stage(run_id, PipelineStage::Idle);

        let mut ledger = ProcessedLedger::open(&self.config.ledger_path)?;
        let resolver = RateResolver::new(self.config.rates.clone())?;
        let extractor = Extractor::new(&self.config.data_dir, resolver);

        stage(run_id, PipelineStage::Extracting);
        let (batch, rate) = match extractor.extract(&ledger).await? {
            ExtractOutcome::NoWork => {
                stage(run_id, PipelineStage::Skipped);
                return Ok(RunOutcome::Skipped);
            },
            ExtractOutcome::Batch { batch, rate } => (batch, rate),
        };
        let extracted_rows = batch.len();

        stage(run_id, PipelineStage::Transforming);
        let enriched = transform(&batch, rate.rate, current_year)?;

        stage(run_id, PipelineStage::Loading);
        let loader = Loader::connect(&self.config).await?;
        loader
            .load(&enriched.rows, &batch.source_files, &mut ledger)
            .await?;

        stage(run_id, PipelineStage::Visualizing);
        if let Err(e) = visualizer.render(&enriched.rows) {
            // A committed load is never invalidated by a chart failure
            error!(run_id = %run_id, error = %e, "Visualization failed");
        }

        stage(run_id, PipelineStage::Done);
        Ok(RunOutcome::Completed(RunSummary {
            run_id,
            source_files: batch.source_files,
            extracted_rows,
            loaded_rows: enriched.rows.len(),
            stats: enriched.stats,
            rate: rate.rate,
            rate_source: rate.source,
            rows: enriched.rows,
        }))
    }
}

fn stage(run_id: Uuid, stage: PipelineStage) {
    info!(run_id = %run_id, stage = ?stage, "Pipeline stage");
}
