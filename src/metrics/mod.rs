//! Metrics engine
//!
//! Every metric is a stateless function over a read-only `SealedStore`.
//! `compute_metrics` runs them in sequence and assembles the `MetricsBundle`;
//! `write_snapshot` persists the bundle as `metrics.json`.

pub mod coupling;
pub mod files;
pub mod timeline;

use std::path::Path;
use tracing::{debug, info};

use crate::error::{ArchaeologyError, Result};
use crate::models::MetricsBundle;
use crate::store::SealedStore;

pub use coupling::{temporal_coupling, CouplingThresholds};
pub use files::{file_volatility, hotspots, stability_halflife, DEFAULT_HOTSPOT_LIMIT};
pub use timeline::{commit_density, loc_trend, metadata, weekly_churn};

/// Tunables of the metrics engine.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    pub coupling: CouplingThresholds,
    pub hotspot_limit: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            coupling: CouplingThresholds::default(),
            hotspot_limit: DEFAULT_HOTSPOT_LIMIT,
        }
    }
}

/// Compute every metric from a completed store.
pub fn compute_metrics(store: &SealedStore, config: &MetricsConfig) -> Result<MetricsBundle> {
    let bundle = MetricsBundle {
        metadata: metadata(store)?,
        loc_over_time: loc_trend(store)?,
        weekly_churn: weekly_churn(store)?,
        file_volatility: file_volatility(store)?,
        commit_density: commit_density(store)?,
        hotspots: hotspots(store, config.hotspot_limit)?,
        temporal_coupling: temporal_coupling(store, &config.coupling)?,
        stability_halflife: stability_halflife(store)?,
    };

    info!(
        "Computed metrics: {} commits, {} files, {} hotspots, {} coupled pairs",
        bundle.metadata.total_commits,
        bundle.metadata.total_files,
        bundle.hotspots.len(),
        bundle.temporal_coupling.len()
    );
    Ok(bundle)
}

/// Write the bundle as pretty-printed JSON, creating parent directories.
pub fn write_snapshot(bundle: &MetricsBundle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ArchaeologyError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(bundle)?;
    std::fs::write(path, json).map_err(|e| ArchaeologyError::io(path, e))?;
    debug!("Wrote metrics snapshot to {}", path.display());
    Ok(())
}
