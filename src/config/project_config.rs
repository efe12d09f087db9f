use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{ArchaeologyError, Result};
use crate::git::{ExtractOptions, DEFAULT_BATCH_SIZE};
use crate::metrics::{CouplingThresholds, MetricsConfig, DEFAULT_HOTSPOT_LIMIT};

/// Project config file looked up in the repository root.
pub const CONFIG_FILE_NAME: &str = "archaeology.toml";

/// Project-level configuration loaded from archaeology.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectConfig {
    /// Commit walk settings
    #[serde(default)]
    pub extract: ExtractSettings,

    /// Temporal coupling noise filters
    #[serde(default)]
    pub coupling: CouplingThresholds,

    #[serde(default)]
    pub hotspots: HotspotSettings,

    /// Default output flags
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractSettings {
    /// Sampling stride, values above 1 enable sampling
    #[serde(default)]
    pub sample: Option<usize>,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            sample: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HotspotSettings {
    #[serde(default = "default_hotspot_limit")]
    pub limit: usize,
}

fn default_hotspot_limit() -> usize {
    DEFAULT_HOTSPOT_LIMIT
}

impl Default for HotspotSettings {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HOTSPOT_LIMIT,
        }
    }
}

/// Output defaults that can be set in project config
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OutputSettings {
    /// Default report format (html, json, text)
    #[serde(default)]
    pub format: Option<String>,

    /// Default report path
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Directory holding history.db and metrics.json
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl ProjectConfig {
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            sample: self.extract.sample,
            batch_size: self.extract.batch_size,
        }
    }

    pub fn metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            coupling: self.coupling.clone(),
            hotspot_limit: self.hotspots.limit,
        }
    }

    /// Reject values no run could use.
    fn validate(&self) -> std::result::Result<(), String> {
        if self.extract.sample == Some(0) {
            return Err("extract.sample must be at least 1".to_string());
        }
        if self.extract.batch_size == 0 {
            return Err("extract.batch_size must be at least 1".to_string());
        }
        if self.coupling.min_files > self.coupling.max_files {
            return Err(format!(
                "coupling.min_files ({}) exceeds coupling.max_files ({})",
                self.coupling.min_files, self.coupling.max_files
            ));
        }
        Ok(())
    }
}

/// Load project configuration from the repository root.
///
/// Returns default configuration if `archaeology.toml` is missing or invalid.
pub fn load_project_config(repo_path: &Path) -> ProjectConfig {
    let toml_path = repo_path.join(CONFIG_FILE_NAME);
    if !toml_path.exists() {
        debug!("No project config found, using defaults");
        return ProjectConfig::default();
    }

    match load_config_file(&toml_path) {
        Ok(config) => {
            debug!("Loaded project config from {}", toml_path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {}", toml_path.display(), e);
            ProjectConfig::default()
        }
    }
}

/// Load an explicitly requested config file. Any failure is an error.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig> {
    let config_error = |reason: String| ArchaeologyError::Config {
        path: path.to_path_buf(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
    let config: ProjectConfig = toml::from_str(&content).map_err(|e| config_error(e.to_string()))?;
    config.validate().map_err(config_error)?;
    Ok(config)
}
