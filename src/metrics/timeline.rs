//! Time-series metrics: metadata, cumulative LOC, weekly churn, commit density
//!
//! All calendar arithmetic is done in UTC.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{DensityPoint, LocPoint, RepoMetadata, WeeklyChurn};
use crate::store::{CommitLineTotals, SealedStore};

/// Half-width of the centered density window, in days.
const DENSITY_HALF_WINDOW: i64 = 3;
/// Divisor of the density window. Fixed, even where the window hangs over
/// the ends of the observed range.
const DENSITY_WINDOW_DAYS: f64 = 7.0;

pub(crate) fn utc(timestamp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(timestamp, 0).single().unwrap_or_default()
}

fn utc_date(timestamp: i64) -> NaiveDate {
    utc(timestamp).date_naive()
}

pub fn metadata(store: &SealedStore) -> Result<RepoMetadata> {
    let range = store.timestamp_range()?;
    Ok(RepoMetadata {
        total_commits: store.commit_count()?,
        total_files: store.distinct_file_count()?,
        start_date: range.map(|(min, _)| utc_date(min)),
        end_date: range.map(|(_, max)| utc_date(max)),
    })
}

pub fn loc_trend(store: &SealedStore) -> Result<Vec<LocPoint>> {
    Ok(cumulative_loc(&store.commit_line_totals()?))
}

/// Running sum of net line changes, one point per commit, floored at zero.
pub fn cumulative_loc(totals: &[CommitLineTotals]) -> Vec<LocPoint> {
    let mut cumulative: i64 = 0;
    totals
        .iter()
        .map(|commit| {
            cumulative += commit.net;
            LocPoint {
                date: utc(commit.timestamp),
                loc: cumulative.max(0),
            }
        })
        .collect()
}

pub fn weekly_churn(store: &SealedStore) -> Result<Vec<WeeklyChurn>> {
    Ok(bucket_weekly(&store.commit_line_totals()?))
}

/// `%Y-W%U` key: calendar year and Sunday-start week number.
pub fn week_key(timestamp: i64) -> String {
    utc(timestamp).format("%Y-W%U").to_string()
}

/// Sum commit churn per week, ascending by week key.
pub fn bucket_weekly(totals: &[CommitLineTotals]) -> Vec<WeeklyChurn> {
    let mut weeks: BTreeMap<String, u64> = BTreeMap::new();
    for commit in totals {
        *weeks.entry(week_key(commit.timestamp)).or_insert(0) += commit.churn;
    }
    weeks
        .into_iter()
        .map(|(week, churn)| WeeklyChurn { week, churn })
        .collect()
}

pub fn commit_density(store: &SealedStore) -> Result<Vec<DensityPoint>> {
    Ok(rolling_density(&store.commit_timestamps()?))
}

/// Centered 7-day rolling average of commits per day, for every day from the
/// first to the last commit date.
pub fn rolling_density(timestamps: &[i64]) -> Vec<DensityPoint> {
    let mut daily: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for &ts in timestamps {
        *daily.entry(utc_date(ts)).or_insert(0) += 1;
    }

    let (Some(&first), Some(&last)) = (daily.keys().next(), daily.keys().next_back()) else {
        return Vec::new();
    };

    let mut density = Vec::new();
    let mut day = first;
    while day <= last {
        let window_sum: u64 = (-DENSITY_HALF_WINDOW..=DENSITY_HALF_WINDOW)
            .filter_map(|offset| day.checked_add_signed(Duration::days(offset)))
            .filter_map(|d| daily.get(&d))
            .sum();
        density.push(DensityPoint {
            date: day,
            density: window_sum as f64 / DENSITY_WINDOW_DAYS,
        });

        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    density
}
