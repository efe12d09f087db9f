//! Core data models for archaeology
//!
//! Three families of types live here:
//! - extraction records produced by the commit walker and persisted in the store
//! - the `MetricsBundle` computed from the store
//! - the `InsightsBundle` derived from the metrics
//!
//! Field names of the bundles are the on-disk contract of `metrics.json`
//! and of the JSON report, so renames here are breaking changes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One non-binary file touched by a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeRecord {
    /// Repo-relative path after rename detection
    pub path: String,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

/// A walked commit together with its file changes against the first parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Full commit hash
    pub sha: String,
    /// Commit time, seconds since epoch
    pub timestamp: i64,
    pub author: String,
    /// Full message, surrounding whitespace trimmed
    pub message: String,
    pub changes: Vec<FileChangeRecord>,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Global facts about the extracted history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoMetadata {
    pub total_commits: u64,
    pub total_files: u64,
    /// Date of the earliest commit (None for an empty history)
    pub start_date: Option<NaiveDate>,
    /// Date of the latest commit (None for an empty history)
    pub end_date: Option<NaiveDate>,
}

/// Cumulative size after one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocPoint {
    pub date: DateTime<Utc>,
    pub loc: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyChurn {
    /// `%Y-W%U` key, e.g. `2024-W05`
    pub week: String,
    pub churn: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileVolatility {
    pub file: String,
    /// Distinct commits touching the file
    pub commits: u64,
    pub volatility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityPoint {
    pub date: NaiveDate,
    /// Centered 7-day rolling average of commits per day
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub file: String,
    /// volatility × ln(1 + churn)
    pub score: f64,
    pub commits: u64,
    pub churn: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingPair {
    pub file1: String,
    pub file2: String,
    /// co_changes / min(commits(file1), commits(file2))
    pub score: f64,
    pub co_changes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalfLife {
    pub days: f64,
    pub interpretation: String,
}

/// Everything the metrics engine derives from one extraction store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub metadata: RepoMetadata,
    pub loc_over_time: Vec<LocPoint>,
    pub weekly_churn: Vec<WeeklyChurn>,
    pub file_volatility: Vec<FileVolatility>,
    pub commit_density: Vec<DensityPoint>,
    pub hotspots: Vec<Hotspot>,
    pub temporal_coupling: Vec<CouplingPair>,
    pub stability_halflife: Option<HalfLife>,
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstabilityPeriod {
    pub week: String,
    pub churn: u64,
    /// churn / median weekly churn, one decimal
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskyFile {
    pub file: String,
    pub score: f64,
    pub commits: u64,
    pub churn: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingWarning {
    pub file1: String,
    pub file2: String,
    pub coupling: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stagnation {
    pub stagnant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halflife_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Bug-fix correlation is reserved for commit-message analysis.
///
/// There is deliberately no "analyzed, nothing found" variant yet, so a
/// consumer can never mistake "not analyzed" for "no bugs".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BugFixCorrelation {
    NotAnalyzed { detected: bool, note: String },
}

impl BugFixCorrelation {
    pub fn not_analyzed() -> Self {
        Self::NotAnalyzed {
            detected: false,
            note: "Bug-fix analysis requires commit message parsing (future enhancement)"
                .to_string(),
        }
    }

    pub fn is_detected(&self) -> bool {
        match self {
            Self::NotAnalyzed { .. } => false,
        }
    }
}

impl Default for BugFixCorrelation {
    fn default() -> Self {
        Self::not_analyzed()
    }
}

/// Rule-based findings derived from a `MetricsBundle`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightsBundle {
    pub instability_periods: Vec<InstabilityPeriod>,
    pub risky_files: Vec<RiskyFile>,
    pub bug_fix_correlation: BugFixCorrelation,
    pub stagnation: Stagnation,
    pub coupling_warnings: Vec<CouplingWarning>,
    pub summary: Vec<String>,
}
