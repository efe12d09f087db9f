//! Insight engine
//!
//! Threshold rules over a finished `MetricsBundle`. Nothing here touches the
//! store; every rule has a defined empty result for thin histories.

use tracing::debug;

use crate::models::{
    BugFixCorrelation, CouplingWarning, InsightsBundle, InstabilityPeriod, MetricsBundle,
    RiskyFile, Stagnation, WeeklyChurn,
};

/// Fewer weeks than this give no instability baseline.
const MIN_WEEKS_FOR_INSTABILITY: usize = 4;
/// Weeks with churn above `median × INSTABILITY_FACTOR` are unstable.
const INSTABILITY_FACTOR: f64 = 2.0;
const MAX_RISKY_FILES: usize = 10;
const MIN_RISKY_FILES: usize = 3;
const COUPLING_CANDIDATES: usize = 5;
const COUPLING_WARNING_SCORE: f64 = 0.5;
const STAGNATION_DAYS: f64 = 180.0;

const COUPLING_RECOMMENDATION: &str = "Consider refactoring - high behavioral coupling";

/// Derive every insight from `metrics`.
pub fn analyze(metrics: &MetricsBundle) -> InsightsBundle {
    let mut insights = InsightsBundle {
        instability_periods: detect_instability(&metrics.weekly_churn),
        risky_files: identify_risky_files(metrics),
        bug_fix_correlation: BugFixCorrelation::not_analyzed(),
        stagnation: detect_stagnation(metrics),
        coupling_warnings: coupling_warnings(metrics),
        summary: Vec::new(),
    };
    insights.summary = summarize(metrics, &insights);

    debug!(
        "Insights: {} unstable weeks, {} risky files, {} coupling warnings",
        insights.instability_periods.len(),
        insights.risky_files.len(),
        insights.coupling_warnings.len()
    );
    insights
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Median of `values`, 0 when empty.
pub fn median(values: &[u64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 0 => (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0,
        _ => sorted[mid] as f64,
    }
}

/// Weeks whose churn exceeds twice the median weekly churn.
pub fn detect_instability(weeks: &[WeeklyChurn]) -> Vec<InstabilityPeriod> {
    if weeks.len() < MIN_WEEKS_FOR_INSTABILITY {
        return Vec::new();
    }

    let churns: Vec<u64> = weeks.iter().map(|w| w.churn).collect();
    let median = median(&churns);
    if median <= 0.0 {
        return Vec::new();
    }

    let threshold = median * INSTABILITY_FACTOR;
    weeks
        .iter()
        .filter(|w| w.churn as f64 > threshold)
        .map(|w| InstabilityPeriod {
            week: w.week.clone(),
            churn: w.churn,
            multiplier: round_to(w.churn as f64 / median, 1),
        })
        .collect()
}

/// Leading hotspots: a tenth of the list, clamped to 3..=10 entries.
pub fn identify_risky_files(metrics: &MetricsBundle) -> Vec<RiskyFile> {
    let hotspots = &metrics.hotspots;
    let count = (hotspots.len() / 10).clamp(MIN_RISKY_FILES, MAX_RISKY_FILES);
    hotspots
        .iter()
        .take(count)
        .map(|h| RiskyFile {
            file: h.file.clone(),
            score: round_to(h.score, 2),
            commits: h.commits,
            churn: h.churn,
        })
        .collect()
}

pub fn detect_stagnation(metrics: &MetricsBundle) -> Stagnation {
    let Some(halflife) = &metrics.stability_halflife else {
        return Stagnation::default();
    };
    let days = halflife.days;

    if days > STAGNATION_DAYS {
        Stagnation {
            stagnant: true,
            halflife_days: Some(days),
            message: Some(format!(
                "50% of files unchanged in {days:.0} days - possible stagnation"
            )),
        }
    } else {
        Stagnation {
            stagnant: false,
            halflife_days: Some(days),
            message: None,
        }
    }
}

pub fn coupling_warnings(metrics: &MetricsBundle) -> Vec<CouplingWarning> {
    metrics
        .temporal_coupling
        .iter()
        .take(COUPLING_CANDIDATES)
        .filter(|pair| pair.score > COUPLING_WARNING_SCORE)
        .map(|pair| CouplingWarning {
            file1: pair.file1.clone(),
            file2: pair.file2.clone(),
            coupling: round_to(pair.score, 2),
            recommendation: COUPLING_RECOMMENDATION.to_string(),
        })
        .collect()
}

fn summarize(metrics: &MetricsBundle, insights: &InsightsBundle) -> Vec<String> {
    let meta = &metrics.metadata;
    let mut summary = vec![format!(
        "Analyzed {} commits across {} files",
        meta.total_commits, meta.total_files
    )];

    if let (Some(start), Some(end)) = (meta.start_date, meta.end_date) {
        summary.push(format!("Period: {start} to {end}"));
    }

    if !insights.instability_periods.is_empty() {
        summary.push(format!(
            "⚠ {} instability period(s) detected with >2× normal churn",
            insights.instability_periods.len()
        ));
    }

    if let Some(top) = insights.risky_files.first() {
        summary.push(format!("🔥 Top hotspot: {} (score: {})", top.file, top.score));
    }

    if !insights.coupling_warnings.is_empty() {
        summary.push(format!(
            "🔗 {} high-coupling file pairs detected",
            insights.coupling_warnings.len()
        ));
    }

    if insights.stagnation.stagnant {
        summary.push("⏸ Possible stagnation detected".to_string());
    } else if let Some(days) = insights.stagnation.halflife_days {
        summary.push(format!("✓ Active codebase (half-life: {days:.0} days)"));
    }

    summary
}
