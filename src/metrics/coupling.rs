//! Temporal coupling
//!
//! Two files are temporally coupled when they keep changing in the same
//! commits. Co-changes are only counted for commits touching a moderate
//! number of files, so mass renames and formatting sweeps do not couple
//! everything to everything. Per-file commit totals still count every commit.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::Result;
use crate::models::CouplingPair;
use crate::store::SealedStore;

/// Noise filters and output size for coupling analysis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CouplingThresholds {
    /// Smallest commit (in distinct files) that contributes co-changes
    pub min_files: usize,
    /// Largest commit (in distinct files) that contributes co-changes
    pub max_files: usize,
    pub min_co_changes: u64,
    /// Both files of a pair need at least this many commits overall
    pub min_file_commits: u64,
    /// Pairs need a ratio strictly above this
    pub min_score: f64,
    pub limit: usize,
}

impl Default for CouplingThresholds {
    fn default() -> Self {
        Self {
            min_files: 2,
            max_files: 10,
            min_co_changes: 3,
            min_file_commits: 5,
            min_score: 0.3,
            limit: 20,
        }
    }
}

pub fn temporal_coupling(
    store: &SealedStore,
    thresholds: &CouplingThresholds,
) -> Result<Vec<CouplingPair>> {
    Ok(couple(&store.commit_file_sets()?, thresholds))
}

/// Rank file pairs by `co_changes / min(commits(a), commits(b))`.
///
/// `commits` holds the distinct paths of each commit.
pub fn couple(commits: &[Vec<String>], thresholds: &CouplingThresholds) -> Vec<CouplingPair> {
    let mut file_commits: BTreeMap<&str, u64> = BTreeMap::new();
    let mut co_changes: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    let mut skipped = 0usize;

    for files in commits {
        for file in files {
            *file_commits.entry(file.as_str()).or_insert(0) += 1;
        }

        if files.len() < thresholds.min_files || files.len() > thresholds.max_files {
            skipped += 1;
            continue;
        }
        for (i, a) in files.iter().enumerate() {
            for b in &files[i + 1..] {
                let pair = if a <= b {
                    (a.as_str(), b.as_str())
                } else {
                    (b.as_str(), a.as_str())
                };
                *co_changes.entry(pair).or_insert(0) += 1;
            }
        }
    }
    debug!(
        "Coupling: {} candidate pairs, {} commits outside the file-count window",
        co_changes.len(),
        skipped
    );

    let mut pairs: Vec<CouplingPair> = co_changes
        .into_iter()
        .filter(|&(_, count)| count >= thresholds.min_co_changes)
        .filter_map(|((file1, file2), count)| {
            let c1 = file_commits.get(file1).copied().unwrap_or(0);
            let c2 = file_commits.get(file2).copied().unwrap_or(0);
            if c1 < thresholds.min_file_commits || c2 < thresholds.min_file_commits {
                return None;
            }
            let score = count as f64 / c1.min(c2) as f64;
            (score > thresholds.min_score).then(|| CouplingPair {
                file1: file1.to_string(),
                file2: file2.to_string(),
                score,
                co_changes: count,
            })
        })
        .collect();

    pairs.sort_by(|a, b| b.score.total_cmp(&a.score));
    pairs.truncate(thresholds.limit);
    pairs
}
