//! Extraction driver
//!
//! Drains a `CommitWalker` into a `HistoryStore` in fixed-size batches.
//! Batching only bounds memory and transaction size: rows land in walk order
//! and the trailing partial batch is flushed before returning.

use git2::Repository;
use indicatif::ProgressBar;
use tracing::{debug, info};

use super::walker::CommitWalker;
use crate::error::Result;
use crate::models::CommitRecord;
use crate::store::HistoryStore;

/// Commits buffered before a store flush.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Keep every k-th commit of the walk; `None` or 1 keeps all
    pub sample: Option<usize>,
    pub batch_size: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            sample: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Counters from one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Commits visited by the walk, sampled-out ones included
    pub walked: usize,
    /// Commits written to the store
    pub extracted: usize,
    /// File-change rows written to the store
    pub file_changes: usize,
    /// Binary file changes dropped
    pub skipped_binary: usize,
}

/// Walk `repo` and persist every retained commit into `store`.
///
/// The first unreadable object aborts the run; the store must then be
/// treated as invalid.
pub fn extract_history(
    repo: &Repository,
    options: &ExtractOptions,
    store: &mut HistoryStore,
    progress: &ProgressBar,
) -> Result<ExtractStats> {
    let batch_size = options.batch_size.max(1);
    let mut walker = CommitWalker::new(repo, options.sample)?;
    let mut batch: Vec<CommitRecord> = Vec::with_capacity(batch_size);
    let mut stats = ExtractStats::default();

    while let Some(record) = walker.next() {
        let record = record?;
        stats.extracted += 1;
        stats.file_changes += record.changes.len();
        batch.push(record);

        if batch.len() >= batch_size {
            store.write_batch(&batch)?;
            batch.clear();
        }
        progress.set_message(format!("Processed {} commits...", walker.walked()));
    }

    if !batch.is_empty() {
        debug!("Flushing final partial batch of {} commits", batch.len());
        store.write_batch(&batch)?;
    }

    stats.walked = walker.walked();
    stats.skipped_binary = walker.skipped_binary();
    info!(
        "Extracted {} of {} walked commits ({} file changes, {} binary skipped)",
        stats.extracted, stats.walked, stats.file_changes, stats.skipped_binary
    );
    Ok(stats)
}
