//! History analysis pipeline
//!
//! Orchestrates the full run:
//! 1. Load the repository (local open or remote clone)
//! 2. Extract commit history into a fresh store
//! 3. Compute metrics from the sealed store and write the snapshot
//! 4. Derive insights from the metrics
//!
//! Each stage consumes the previous stage's output. Rendering is left to
//! the caller so the library never decides where reports go.

use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cache;
use crate::error::Result;
use crate::git::{extract_history, ExtractOptions, ExtractStats, LoadedRepository};
use crate::insights;
use crate::metrics::{self, MetricsConfig};
use crate::models::{InsightsBundle, MetricsBundle};
use crate::store::{HistoryStore, SealedStore};

/// Full analysis pipeline.
pub struct Pipeline {
    /// Overrides the per-repository cache directory
    data_dir: Option<PathBuf>,
    extract: ExtractOptions,
    metrics: MetricsConfig,
    progress: ProgressBar,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            data_dir: None,
            extract: ExtractOptions::default(),
            metrics: MetricsConfig::default(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Keep the store and snapshot in `dir` instead of the cache directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract = options;
        self
    }

    pub fn with_metrics_config(mut self, config: MetricsConfig) -> Self {
        self.metrics = config;
        self
    }

    /// Report extraction progress on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Data directory used for `loaded`.
    pub fn data_dir_for(&self, loaded: &LoadedRepository) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| cache::get_data_dir(loaded.source()))
    }

    /// Rebuild the store for `loaded` from scratch and seal it.
    pub fn extract(&self, loaded: &LoadedRepository) -> Result<ExtractedHistory> {
        let data_dir = self.data_dir_for(loaded);
        let mut store = HistoryStore::create(&cache::get_store_path(&data_dir))?;
        if let Some(clone) = loaded.scratch_dir() {
            debug!("Reading history from scratch clone {}", clone.display());
        }
        if let Some(path) = store.path() {
            info!("Extracting history into {}", path.display());
        }
        let stats = extract_history(loaded.repo(), &self.extract, &mut store, &self.progress)?;
        Ok(ExtractedHistory {
            store: store.seal(),
            stats,
            data_dir,
        })
    }

    /// Compute every metric and write `metrics.json` next to the store.
    pub fn compute_metrics(&self, history: &ExtractedHistory) -> Result<MetricsBundle> {
        let bundle = metrics::compute_metrics(&history.store, &self.metrics)?;
        metrics::write_snapshot(&bundle, &history.snapshot_path())?;
        Ok(bundle)
    }

    /// Run every stage for the repository at `location`.
    pub fn run(&self, location: &str) -> Result<Analysis> {
        let loaded = LoadedRepository::load(location)?;
        let history = self.extract(&loaded)?;
        let metrics = self.compute_metrics(&history)?;
        let insights = insights::analyze(&metrics);

        info!(
            "Analysis of {} finished: {} commits, {} summary lines",
            location,
            metrics.metadata.total_commits,
            insights.summary.len()
        );
        Ok(Analysis {
            metrics,
            insights,
            stats: history.stats,
            data_dir: history.data_dir,
        })
    }
}

/// Output of the extraction stage: the sealed store and its statistics.
pub struct ExtractedHistory {
    store: SealedStore,
    stats: ExtractStats,
    data_dir: PathBuf,
}

impl ExtractedHistory {
    pub fn store(&self) -> &SealedStore {
        &self.store
    }

    pub fn stats(&self) -> &ExtractStats {
        &self.stats
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        cache::get_snapshot_path(&self.data_dir)
    }
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub metrics: MetricsBundle,
    pub insights: InsightsBundle,
    pub stats: ExtractStats,
    /// Where `history.db` and `metrics.json` were written
    pub data_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::walker::tests::commit_files;
    use git2::Repository;
    use tempfile::tempdir;

    #[test]
    fn test_pipeline_builder() {
        let pipeline = Pipeline::new()
            .with_data_dir("/tmp/archaeology-data")
            .with_extract_options(ExtractOptions {
                sample: Some(5),
                batch_size: 10,
            });
        assert_eq!(pipeline.data_dir, Some(PathBuf::from("/tmp/archaeology-data")));
        assert_eq!(pipeline.extract.sample, Some(5));
        assert_eq!(pipeline.metrics, MetricsConfig::default());
    }

    #[test]
    fn test_stages_write_artifacts() -> anyhow::Result<()> {
        let repo_dir = tempdir()?;
        let data_dir = tempdir()?;
        let repo = Repository::init(repo_dir.path())?;
        commit_files(&repo, 1_700_000_000, "add", &[("a.txt", Some(&b"1\n2\n3\n"[..]))])?;

        let pipeline = Pipeline::new().with_data_dir(data_dir.path());
        let loaded = LoadedRepository::load(&repo_dir.path().to_string_lossy())?;
        let history = pipeline.extract(&loaded)?;
        assert_eq!(history.stats().extracted, 1);
        assert_eq!(history.store().commit_count()?, 1);
        let store_path = data_dir.path().join("history.db");
        assert_eq!(history.store().path(), Some(store_path.as_path()));

        let metrics = pipeline.compute_metrics(&history)?;
        assert_eq!(metrics.loc_over_time.len(), 1);
        assert_eq!(metrics.loc_over_time[0].loc, 3);
        assert!(data_dir.path().join("history.db").exists());
        assert!(history.snapshot_path().exists());
        Ok(())
    }

    #[test]
    fn test_run_missing_repository() {
        let err = Pipeline::new().run("/definitely/not/a/repo").unwrap_err();
        assert!(matches!(
            err,
            crate::error::ArchaeologyError::RepositoryUnavailable { .. }
        ));
    }
}
