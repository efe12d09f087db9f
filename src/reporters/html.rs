//! HTML reporter with embedded styles and Plotly charts
//!
//! Generates a standalone HTML report that can be viewed in any browser.
//! Includes:
//! - The insight summary lines
//! - Key findings (instability, risky files, coupling)
//! - LOC, weekly churn, hotspot and commit density charts
//!
//! Plotly itself is loaded from its CDN; the figures are inlined as JSON.

use anyhow::Result;
use chrono::Local;
use serde_json::{json, Value};

use crate::insights::median;
use crate::models::{InsightsBundle, MetricsBundle};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";
/// Longer series are strided down to about this many points.
const MAX_CHART_POINTS: usize = 500;
const HOTSPOT_CHART_FILES: usize = 20;
/// Key findings shows at most this many instability periods and risky files.
const FINDINGS_PER_SECTION: usize = 5;

/// Render report as standalone HTML
pub fn render(metrics: &MetricsBundle, insights: &InsightsBundle) -> Result<String> {
    let mut html = String::new();

    html.push_str(&render_head());
    html.push_str("<body>\n");
    html.push_str(&render_header(insights));
    html.push_str(&render_findings(insights));

    html.push_str(&chart_container("loc-chart", "Lines of Code Over Time"));
    html.push_str(&chart_container("churn-chart", "Weekly Code Churn"));
    html.push_str(&chart_container("hotspot-chart", "Top 20 Hotspots"));
    html.push_str(&chart_container(
        "density-chart",
        "Commit Density (7-day rolling average)",
    ));

    html.push_str("<script>\n");
    for (id, figure) in [
        ("loc-chart", loc_figure(metrics)),
        ("churn-chart", churn_figure(metrics)),
        ("hotspot-chart", hotspot_figure(metrics)),
        ("density-chart", density_figure(metrics)),
    ] {
        html.push_str(&plot_call(id, &figure)?);
    }
    html.push_str("</script>\n");

    html.push_str(&render_footer());
    html.push_str("</body>\n</html>\n");

    Ok(html)
}

fn render_head() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Software Archaeology Report</title>
    <script src="{PLOTLY_CDN}"></script>
    <style>
{CSS}
    </style>
</head>
"#
    )
}

fn render_header(insights: &InsightsBundle) -> String {
    let items: String = insights
        .summary
        .iter()
        .map(|line| format!("        <div class=\"summary-item\">{}</div>\n", html_escape(line)))
        .collect();
    format!(
        r#"<div class="header">
    <h1>📊 Software Archaeology Report</h1>
    <p class="subtitle">Codebase Evolution Analysis</p>
    <div class="summary">
{items}    </div>
</div>
"#
    )
}

fn render_findings(insights: &InsightsBundle) -> String {
    let mut html = String::from("<div class=\"insights\">\n<h2>Key Findings</h2>\n");

    if !insights.instability_periods.is_empty() {
        html.push_str("<div class=\"insight-section\"><h3>⚠ Instability Periods</h3>\n");
        for period in insights.instability_periods.iter().take(FINDINGS_PER_SECTION) {
            html.push_str(&format!(
                "<div class=\"insight-item\">Week {}: {}× normal churn</div>\n",
                html_escape(&period.week),
                period.multiplier
            ));
        }
        html.push_str("</div>\n");
    }

    if !insights.risky_files.is_empty() {
        html.push_str("<div class=\"insight-section\"><h3>🔥 High-Risk Files</h3>\n");
        for file in insights.risky_files.iter().take(FINDINGS_PER_SECTION) {
            html.push_str(&format!(
                "<div class=\"insight-item\">{} (score: {}, {} commits)</div>\n",
                html_escape(&file.file),
                file.score,
                file.commits
            ));
        }
        html.push_str("</div>\n");
    }

    if !insights.coupling_warnings.is_empty() {
        html.push_str("<div class=\"insight-section\"><h3>🔗 Temporal Coupling</h3>\n");
        for warning in &insights.coupling_warnings {
            html.push_str(&format!(
                "<div class=\"insight-item\">{} ↔ {} (coupling: {})</div>\n",
                html_escape(&warning.file1),
                html_escape(&warning.file2),
                warning.coupling
            ));
        }
        html.push_str("</div>\n");
    }

    html.push_str("</div>\n");
    html
}

fn chart_container(id: &str, title: &str) -> String {
    format!(
        "<div class=\"chart-container\">\n    <h2>{title}</h2>\n    <div id=\"{id}\"></div>\n</div>\n"
    )
}

fn plot_call(id: &str, figure: &Value) -> Result<String> {
    // A literal "</" inside the JSON would end the script element early.
    let json = serde_json::to_string(figure)?.replace("</", "<\\/");
    Ok(format!("Plotly.newPlot('{id}', {json});\n"))
}

/// Every `len / MAX_CHART_POINTS`-th item once a series exceeds the limit.
fn downsample<T>(series: &[T]) -> impl Iterator<Item = &T> {
    let step = if series.len() > MAX_CHART_POINTS {
        series.len() / MAX_CHART_POINTS
    } else {
        1
    };
    series.iter().step_by(step)
}

fn chart_layout(x_title: &str, y_title: &str, height: u32) -> Value {
    json!({
        "xaxis": { "title": { "text": x_title } },
        "yaxis": { "title": { "text": y_title } },
        "hovermode": "x unified",
        "height": height,
        "margin": { "l": 0, "r": 0, "t": 0, "b": 0 },
    })
}

fn loc_figure(metrics: &MetricsBundle) -> Value {
    let (dates, loc): (Vec<String>, Vec<i64>) = downsample(&metrics.loc_over_time)
        .map(|p| (p.date.to_rfc3339(), p.loc))
        .unzip();
    json!({
        "data": [{
            "type": "scatter",
            "x": dates,
            "y": loc,
            "mode": "lines",
            "line": { "color": "#1f77b4", "width": 2 },
            "fill": "tozeroy",
            "fillcolor": "rgba(31, 119, 180, 0.2)",
        }],
        "layout": chart_layout("Date", "Lines of Code", 400),
    })
}

fn churn_figure(metrics: &MetricsBundle) -> Value {
    let weeks: Vec<&str> = metrics.weekly_churn.iter().map(|w| w.week.as_str()).collect();
    let churn: Vec<u64> = metrics.weekly_churn.iter().map(|w| w.churn).collect();

    let mut layout = chart_layout("Week", "Lines Changed (Added + Deleted)", 400);
    if !churn.is_empty() {
        let median = median(&churn);
        layout["shapes"] = json!([{
            "type": "line",
            "xref": "paper",
            "x0": 0,
            "x1": 1,
            "y0": median,
            "y1": median,
            "line": { "color": "red", "dash": "dash" },
        }]);
        layout["annotations"] = json!([{
            "xref": "paper",
            "x": 1,
            "y": median,
            "text": format!("Median: {median:.0}"),
            "showarrow": false,
            "yanchor": "bottom",
        }]);
    }

    json!({
        "data": [{
            "type": "bar",
            "x": weeks,
            "y": churn,
            "marker": { "color": "#ff7f0e" },
        }],
        "layout": layout,
    })
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn hotspot_figure(metrics: &MetricsBundle) -> Value {
    // Reversed so the top hotspot is drawn at the top of the bar chart.
    let top: Vec<_> = metrics
        .hotspots
        .iter()
        .take(HOTSPOT_CHART_FILES)
        .rev()
        .collect();
    let files: Vec<&str> = top.iter().map(|h| basename(&h.file)).collect();
    let scores: Vec<f64> = top.iter().map(|h| h.score).collect();

    let mut layout = chart_layout("Hotspot Score", "File", 600);
    layout["hovermode"] = json!("closest");

    json!({
        "data": [{
            "type": "bar",
            "orientation": "h",
            "x": scores,
            "y": files,
            "marker": { "color": scores, "colorscale": "Reds", "showscale": true },
        }],
        "layout": layout,
    })
}

fn density_figure(metrics: &MetricsBundle) -> Value {
    let (dates, density): (Vec<String>, Vec<f64>) = downsample(&metrics.commit_density)
        .map(|p| (p.date.to_string(), p.density))
        .unzip();
    json!({
        "data": [{
            "type": "scatter",
            "x": dates,
            "y": density,
            "mode": "lines",
            "line": { "color": "#2ca02c", "width": 1 },
            "fill": "tozeroy",
            "fillcolor": "rgba(44, 160, 44, 0.2)",
        }],
        "layout": chart_layout("Date", "Commits per Day (7-day avg)", 400),
    })
}

fn render_footer() -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("<div class=\"footer\">\n    <p>Generated {timestamp}</p>\n</div>\n")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// Embedded CSS
const CSS: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
    max-width: 1400px;
    margin: 0 auto;
    padding: 20px;
    background: #f5f5f5;
    color: #333;
}

.header, .chart-container, .insights {
    background: white;
    padding: 20px 30px;
    border-radius: 8px;
    margin-bottom: 20px;
    box-shadow: 0 2px 4px rgba(0,0,0,0.1);
}

h1 { margin: 0 0 10px 0; }
.subtitle { color: #666; margin: 5px 0; }

.summary {
    background: #f8f9fa;
    padding: 15px;
    border-radius: 4px;
    margin-top: 15px;
}

.summary-item { margin: 8px 0; font-size: 14px; }

.insight-section { margin: 20px 0; }
.insight-section h3 { color: #555; margin-bottom: 10px; }

.insight-item {
    background: #f8f9fa;
    padding: 10px;
    margin: 5px 0;
    border-radius: 4px;
    font-size: 14px;
    font-family: monospace;
}

.footer { text-align: center; color: #888; font-size: 13px; padding: 10px; }

@media print {
    body { background: white; }
    .chart-container { page-break-inside: avoid; }
}
"#;
