//! CLI definition and handler

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::config::{load_config_file, load_project_config, ProjectConfig};
use crate::git::LoadedRepository;
use crate::insights;
use crate::pipeline::Pipeline;
use crate::reporters::{self, OutputFormat};

const STAGES: usize = 5;

/// Parse and validate the sampling stride (at least 1)
fn parse_sample(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("sample must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

/// Archaeology - codebase time machine
#[derive(Parser, Debug)]
#[command(name = "archaeology")]
#[command(
    version,
    about = "Mine git history for churn, hotspots, temporal coupling and stability half-life",
    after_help = "\
Examples:
  archaeology .                                   Analyze the current repository
  archaeology https://github.com/org/repo.git     Clone and analyze a remote repository
  archaeology . --sample 10                       Keep every 10th commit (large repos)
  archaeology . --format json -o metrics.json     JSON output for scripting"
)]
pub struct Cli {
    /// Path to a git repository, or a clone URL
    pub repo: String,

    /// Report path (default: output/report.<format>)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Report format: html, json, text
    #[arg(long, short = 'f', value_parser = ["html", "json", "text"])]
    pub format: Option<String>,

    /// Keep every Nth commit of the walk (1 = all commits)
    #[arg(long, value_parser = parse_sample)]
    pub sample: Option<usize>,

    /// Directory for history.db and metrics.json (default: per-repo cache dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Config file (default: archaeology.toml in the repository root)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,
}

/// Flags and config values merged with CLI > config file > default precedence.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    format: OutputFormat,
    output: PathBuf,
    data_dir: Option<PathBuf>,
    sample: Option<usize>,
}

impl Settings {
    fn resolve(cli: &Cli, config: &ProjectConfig) -> Result<Self> {
        let format = match cli.format.as_deref().or(config.output.format.as_deref()) {
            Some(name) => OutputFormat::from_str(name)?,
            None => OutputFormat::default(),
        };
        let output = cli
            .output
            .clone()
            .or_else(|| config.output.path.clone())
            .unwrap_or_else(|| {
                PathBuf::from("output").join(format!("report.{}", reporters::file_extension(format)))
            });
        Ok(Self {
            format,
            output,
            data_dir: cli.data_dir.clone().or_else(|| config.output.data_dir.clone()),
            sample: cli.sample.or(config.extract.sample),
        })
    }
}

/// Staged progress printer; silent in quiet mode.
struct Stages {
    quiet: bool,
}

impl Stages {
    fn start(&self, n: usize, label: &str) {
        if !self.quiet {
            println!("{} {}", style(format!("[{n}/{STAGES}]")).bold().cyan(), label);
        }
    }

    fn spinner(&self) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(create_spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }
}

fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn run(cli: Cli) -> Result<()> {
    let stages = Stages { quiet: cli.quiet };

    // An explicit config file is checked before any work starts.
    let explicit_config = cli
        .config
        .as_deref()
        .map(load_config_file)
        .transpose()
        .context("Failed to load config")?;

    stages.start(1, &format!("Loading repository: {}", cli.repo));
    let loaded = LoadedRepository::load(&cli.repo)
        .with_context(|| format!("Failed to load repository {}", cli.repo))?;

    let config = match explicit_config {
        Some(config) => config,
        None => load_project_config(loaded.root()),
    };
    let settings = Settings::resolve(&cli, &config)?;
    debug!("Resolved settings: {:?}", settings);

    let mut pipeline = Pipeline::new()
        .with_extract_options(crate::git::ExtractOptions {
            sample: settings.sample,
            ..config.extract_options()
        })
        .with_metrics_config(config.metrics_config());
    if let Some(dir) = &settings.data_dir {
        pipeline = pipeline.with_data_dir(dir);
    }

    stages.start(2, "Extracting commit history...");
    let spinner = stages.spinner();
    let pipeline = pipeline.with_progress(spinner.clone());
    let history = pipeline
        .extract(&loaded)
        .context("Failed to extract commit history")?;
    spinner.finish_and_clear();
    if !cli.quiet {
        let stats = history.stats();
        println!(
            "      {} commits extracted ({} walked, {} file changes)",
            style(stats.extracted).bold(),
            stats.walked,
            stats.file_changes
        );
    }

    stages.start(3, "Computing metrics...");
    let metrics = pipeline
        .compute_metrics(&history)
        .context("Failed to compute metrics")?;

    stages.start(4, "Generating insights...");
    let insights = insights::analyze(&metrics);

    stages.start(5, "Creating report...");
    reporters::write_report(&metrics, &insights, settings.format, &settings.output)?;

    if !cli.quiet {
        let store_path = history
            .store()
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| history.data_dir().to_path_buf());
        print_summary(&insights.summary, &settings.output, &store_path);
    }
    Ok(())
}

fn print_summary(summary: &[String], output: &Path, store: &Path) {
    println!();
    for line in summary {
        println!("  {line}");
    }
    println!(
        "\n{} Analysis complete: {}",
        style("✓").green().bold(),
        output.display()
    );
    println!("  {}", style(format!("Data: {}", store.display())).dim());
}
