//! JSON reporter
//!
//! Outputs `{ "metrics": ..., "insights": ... }` as pretty-printed JSON.

use anyhow::Result;
use serde::Serialize;

use crate::models::{InsightsBundle, MetricsBundle};

#[derive(Serialize)]
struct Report<'a> {
    metrics: &'a MetricsBundle,
    insights: &'a InsightsBundle,
}

/// Render both bundles as JSON
pub fn render(metrics: &MetricsBundle, insights: &InsightsBundle) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Report { metrics, insights })?)
}
