//! Per-file metrics: volatility, hotspot ranking, stability half-life

use crate::error::Result;
use crate::models::{FileVolatility, HalfLife, Hotspot};
use crate::store::{FileAggregate, SealedStore};

/// Default number of hotspots kept.
pub const DEFAULT_HOTSPOT_LIMIT: usize = 50;

const SECONDS_PER_DAY: f64 = 86_400.0;

pub fn file_volatility(store: &SealedStore) -> Result<Vec<FileVolatility>> {
    Ok(rank_volatility(
        &store.file_aggregates()?,
        store.commit_count()?,
    ))
}

/// Fraction of all commits touching each file, descending.
pub fn rank_volatility(files: &[FileAggregate], total_commits: u64) -> Vec<FileVolatility> {
    if total_commits == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<FileVolatility> = files
        .iter()
        .map(|f| FileVolatility {
            file: f.path.clone(),
            commits: f.commits,
            volatility: f.commits as f64 / total_commits as f64,
        })
        .collect();
    ranked.sort_by(|a, b| b.volatility.total_cmp(&a.volatility));
    ranked
}

pub fn hotspots(store: &SealedStore, limit: usize) -> Result<Vec<Hotspot>> {
    Ok(rank_hotspots(
        &store.file_aggregates()?,
        store.commit_count()?,
        limit,
    ))
}

pub fn hotspot_score(commits: u64, churn: u64, total_commits: u64) -> f64 {
    let volatility = commits as f64 / total_commits as f64;
    volatility * (churn as f64).ln_1p()
}

/// Top `limit` files by `volatility × ln(1 + churn)`. Ties keep path order.
pub fn rank_hotspots(files: &[FileAggregate], total_commits: u64, limit: usize) -> Vec<Hotspot> {
    if total_commits == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<Hotspot> = files
        .iter()
        .map(|f| Hotspot {
            file: f.path.clone(),
            score: hotspot_score(f.commits, f.churn, total_commits),
            commits: f.commits,
            churn: f.churn,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(limit);
    ranked
}

pub fn stability_halflife(store: &SealedStore) -> Result<Option<HalfLife>> {
    Ok(half_life(&store.file_aggregates()?))
}

/// Days between the most recently touched file and the file at the median
/// rank of last-modified order.
pub fn half_life(files: &[FileAggregate]) -> Option<HalfLife> {
    let mut last_modified: Vec<i64> = files.iter().map(|f| f.last_modified).collect();
    // Stable, so equal timestamps keep path order.
    last_modified.sort_by(|a, b| b.cmp(a));

    let half = last_modified.len() / 2;
    let latest = *last_modified.first()?;
    let at_half = *last_modified.get(half)?;

    let days = (latest - at_half) as f64 / SECONDS_PER_DAY;
    Some(HalfLife {
        days: (days * 10.0).round() / 10.0,
        interpretation: interpret_halflife(days).to_string(),
    })
}

pub fn interpret_halflife(days: f64) -> &'static str {
    if days < 14.0 {
        "Very active - rapid development"
    } else if days < 60.0 {
        "Active development"
    } else if days < 180.0 {
        "Moderate activity"
    } else {
        "Stable or stagnant"
    }
}
