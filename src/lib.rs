//! Archaeology - codebase time machine
//!
//! Walks a repository's commit history into a SQLite store, derives
//! evolution metrics from it (churn, volatility, hotspots, temporal coupling,
//! stability half-life) and turns those into rule-based insights.
//!
//! ```no_run
//! use archaeology::pipeline::Pipeline;
//!
//! let analysis = Pipeline::new().with_data_dir("data").run(".").unwrap();
//! for line in &analysis.insights.summary {
//!     println!("{line}");
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod insights;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod reporters;
pub mod store;

pub use error::{ArchaeologyError, Result};
pub use models::{InsightsBundle, MetricsBundle};
pub use pipeline::{Analysis, Pipeline};
