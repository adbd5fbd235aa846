//! Processed-files ledger
//!
//! Append-only log of source files whose rows have been durably
//! written to both sinks. One file name per line, UTF-8,
//! newline-terminated. The in-memory view is rebuilt by reading the
//! whole log at open; the log only grows, there is no compaction.
//!
//! A file name appears here if and only if its batch reached both
//! sinks — the loader commits as its final step, making the ledger the
//! single durability marker for the pipeline.

use cars_common::Result;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ledger of fully committed source files
#[derive(Debug)]
pub struct ProcessedLedger {
    path: PathBuf,
    processed: HashSet<String>,
}

impl ProcessedLedger {
    /// Open a ledger, reading every committed file name into memory.
    ///
    /// A missing log file is an empty ledger, not an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let processed = if path.exists() {
            std::fs::read_to_string(&path)?
                .lines()
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            HashSet::new()
        };

        debug!(path = %path.display(), entries = processed.len(), "Opened ledger");
        Ok(ProcessedLedger { path, processed })
    }

    /// Whether a source file has already been committed
    pub fn is_processed(&self, file_id: &str) -> bool {
        self.processed.contains(file_id)
    }

    /// Set of all committed file names
    pub fn processed_set(&self) -> &HashSet<String> {
        &self.processed
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    /// Append file names to the log and sync to disk.
    ///
    /// Idempotent: names already present are skipped, so a repeated
    /// commit never produces duplicate lines.
    pub fn commit<I, S>(&mut self, file_ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let new_ids: Vec<String> = file_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .filter(|id| !self.processed.contains(id))
            .collect();

        if new_ids.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        for id in &new_ids {
            writeln!(file, "{}", id)?;
        }
        file.sync_all()?;

        debug!(path = %self.path.display(), committed = new_ids.len(), "Ledger commit");
        self.processed.extend(new_ids);
        Ok(())
    }
}
