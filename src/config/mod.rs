//! Configuration module for archaeology
//!
//! This module handles:
//! - Project-level configuration (archaeology.toml)
//! - Extraction, coupling and hotspot tunables
//! - Output defaults that CLI flags override

mod project_config;

pub use project_config::{
    load_config_file, load_project_config, ExtractSettings, HotspotSettings, OutputSettings,
    ProjectConfig, CONFIG_FILE_NAME,
};
