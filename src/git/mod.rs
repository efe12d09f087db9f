//! Git history extraction
//!
//! Turns a repository into a populated extraction store.
//!
//! # Example
//!
//! ```no_run
//! use archaeology::git::{extract_history, ExtractOptions, LoadedRepository};
//! use archaeology::store::HistoryStore;
//! use indicatif::ProgressBar;
//! use std::path::Path;
//!
//! let loaded = LoadedRepository::load("/path/to/repo").unwrap();
//! let mut store = HistoryStore::create(Path::new("data/history.db")).unwrap();
//! let stats = extract_history(
//!     loaded.repo(),
//!     &ExtractOptions::default(),
//!     &mut store,
//!     &ProgressBar::hidden(),
//! )
//! .unwrap();
//! println!("{} commits extracted", stats.extracted);
//! ```

pub mod extract;
pub mod loader;
pub mod walker;

pub use extract::{extract_history, ExtractOptions, ExtractStats, DEFAULT_BATCH_SIZE};
pub use loader::{LoadedRepository, RepoSource};
pub use walker::CommitWalker;
