//! Extractor
//!
//! Discovers candidate input files, filters out files already in the
//! ledger, concatenates the remaining rows into one batch in a stable
//! order, and resolves the exchange rate for the run. Never writes to
//! the ledger — only the loader commits.

use crate::ledger::ProcessedLedger;
use crate::model::{RawBatch, RawRow};
use crate::rates::{RateResolver, ResolvedRate};
use cars_common::{EtlError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Input file suffix the extractor looks for
const INPUT_SUFFIX: &str = "csv";

/// Result of an extraction attempt
#[derive(Debug)]
pub enum ExtractOutcome {
    /// No candidate files, or every candidate is already committed.
    /// Not an error: the run short-circuits with nothing to do.
    NoWork,

    /// A batch of new rows and the rate to transform them with
    Batch {
        batch: RawBatch,
        rate: ResolvedRate,
    },
}

/// File discovery and batch assembly
pub struct Extractor {
    data_dir: PathBuf,
    resolver: RateResolver,
}

impl Extractor {
    pub fn new(data_dir: impl Into<PathBuf>, resolver: RateResolver) -> Self {
        Extractor {
            data_dir: data_dir.into(),
            resolver,
        }
    }

    /// Build a batch from every file not yet in the ledger.
    ///
    /// Files are concatenated in lexicographic order of file name so a
    /// batch's row order is deterministic. All files must share one
    /// column shape; a mismatch is a fatal schema error, not a coerced
    /// read.
    pub async fn extract(&self, ledger: &ProcessedLedger) -> Result<ExtractOutcome> {
        let candidates = self.discover_candidates()?;

        if candidates.is_empty() {
            info!(dir = %self.data_dir.display(), "No input files found");
            return Ok(ExtractOutcome::NoWork);
        }

        let new_files: Vec<String> = candidates
            .into_iter()
            .filter(|name| !ledger.is_processed(name))
            .collect();

        if new_files.is_empty() {
            info!("No new input files, skipping extract");
            return Ok(ExtractOutcome::NoWork);
        }

        let mut rows: Vec<RawRow> = Vec::new();
        let mut expected_width: Option<usize> = None;

        for name in &new_files {
            let path = self.data_dir.join(name);
            let file_rows = read_rows(&path, name, &mut expected_width)?;
            debug!(file = %name, rows = file_rows.len(), "Read input file");
            rows.extend(file_rows);
        }

        let rate = self.resolver.resolve().await;

        info!(
            rows = rows.len(),
            files = new_files.len(),
            rate = rate.rate,
            rate_source = ?rate.source,
            "Extracted batch"
        );

        Ok(ExtractOutcome::Batch {
            batch: RawBatch {
                rows,
                source_files: new_files,
            },
            rate,
        })
    }

    /// All `*.csv` file names in the data directory, sorted
    fn discover_candidates(&self) -> Result<Vec<String>> {
        if !self.data_dir.exists() {
            return Err(EtlError::Config(format!(
                "Data directory does not exist: {}",
                self.data_dir.display()
            )));
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(INPUT_SUFFIX));
            if !is_csv {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}

/// Read one file's data rows (header stripped), enforcing a uniform
/// column shape across the whole batch.
fn read_rows(path: &Path, name: &str, expected_width: &mut Option<usize>) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| EtlError::Csv(format!("{}: {}", name, e)))?;

    let width = reader
        .headers()
        .map_err(|e| EtlError::Csv(format!("{}: {}", name, e)))?
        .len();

    match *expected_width {
        None => *expected_width = Some(width),
        Some(expected) if expected != width => {
            return Err(EtlError::Schema {
                file: name.to_string(),
                expected,
                actual: width,
            });
        },
        Some(_) => {},
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| EtlError::Csv(format!("{}: {}", name, e)))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(rows)
}
