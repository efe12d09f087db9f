//! Report renderers for archaeology results
//!
//! Supports multiple output formats:
//! - `html` - Standalone page with Plotly charts
//! - `json` - `{ metrics, insights }` as pretty-printed JSON
//! - `text` - Terminal output with colors
//!
//! Renderers only see the two bundles, never the store or the repository.

mod html;
mod json;
mod text;

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::str::FromStr;

use crate::models::{InsightsBundle, MetricsBundle};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" | "htm" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: html, json, text",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Html => write!(f, "html"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

/// Render both bundles in the given format
pub fn report(
    metrics: &MetricsBundle,
    insights: &InsightsBundle,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Html => html::render(metrics, insights),
        OutputFormat::Json => json::render(metrics, insights),
        OutputFormat::Text => text::render(metrics, insights),
    }
}

/// Render and write a report, creating the parent directory if needed
pub fn write_report(
    metrics: &MetricsBundle,
    insights: &InsightsBundle,
    format: OutputFormat,
    path: &Path,
) -> Result<()> {
    let content = report(metrics, insights, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

/// Get the recommended file extension for a format
pub fn file_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Html => "html",
        OutputFormat::Json => "json",
        OutputFormat::Text => "txt",
    }
}
