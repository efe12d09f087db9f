//! Text (terminal) reporter with colors and formatting

use anyhow::Result;

use crate::models::{InsightsBundle, MetricsBundle};

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[91m";
const BLUE: &str = "\x1b[34m";

const MAX_LISTED: usize = 10;

/// Render both bundles as formatted terminal output
pub fn render(metrics: &MetricsBundle, insights: &InsightsBundle) -> Result<String> {
    let mut out = String::new();

    out.push_str(&format!("\n{BOLD}Software Archaeology Report{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    for line in &insights.summary {
        out.push_str(&format!("  {line}\n"));
    }
    out.push('\n');

    if !insights.instability_periods.is_empty() {
        out.push_str(&format!("{BOLD}INSTABILITY{RESET}\n"));
        for period in insights.instability_periods.iter().take(MAX_LISTED) {
            out.push_str(&format!(
                "  {YELLOW}{}{RESET}  churn {}  ({}× median)\n",
                period.week, period.churn, period.multiplier
            ));
        }
        out.push('\n');
    }

    if !insights.risky_files.is_empty() {
        out.push_str(&format!("{BOLD}RISKY FILES{RESET}\n"));
        out.push_str(&format!(
            "{DIM}  SCORE   COMMITS   CHURN   FILE{RESET}\n"
        ));
        for file in &insights.risky_files {
            out.push_str(&format!(
                "  {RED}{:>5.2}{RESET}   {:>7}   {:>5}   {}\n",
                file.score,
                file.commits,
                file.churn,
                truncate_path(&file.file, 60)
            ));
        }
        out.push('\n');
    }

    if !insights.coupling_warnings.is_empty() {
        out.push_str(&format!("{BOLD}TEMPORAL COUPLING{RESET}\n"));
        for warning in &insights.coupling_warnings {
            out.push_str(&format!(
                "  {BLUE}{:.2}{RESET}  {} <-> {}\n",
                warning.coupling, warning.file1, warning.file2
            ));
        }
        out.push_str(&format!(
            "  {DIM}{}{RESET}\n\n",
            insights
                .coupling_warnings
                .first()
                .map(|w| w.recommendation.as_str())
                .unwrap_or_default()
        ));
    }

    if let Some(halflife) = &metrics.stability_halflife {
        out.push_str(&format!("{BOLD}STABILITY{RESET}\n"));
        out.push_str(&format!(
            "  Half-life: {} days ({})\n",
            halflife.days, halflife.interpretation
        ));
        if let Some(message) = &insights.stagnation.message {
            out.push_str(&format!("  {YELLOW}{message}{RESET}\n"));
        }
        out.push('\n');
    }

    Ok(out)
}

/// Keep the tail of long paths, using chars() to stay on UTF-8 boundaries
fn truncate_path(path: &str, max: usize) -> String {
    let count = path.chars().count();
    if count <= max {
        return path.to_string();
    }
    let tail: String = path.chars().skip(count - (max - 3)).collect();
    format!("...{tail}")
}
