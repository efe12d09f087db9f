//! Error types for the extraction and metrics pipeline
//!
//! Only extraction-side failures are fatal. Empty histories and thin data
//! never surface here; metrics and insights degrade to empty values instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchaeologyError {
    #[error("Repository unavailable: {location} ({reason})")]
    RepositoryUnavailable { location: String, reason: String },

    #[error("Unreadable history object {id}: {source}")]
    CorruptHistory {
        id: String,
        #[source]
        source: git2::Error,
    },

    #[error("Extraction store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize metrics snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl ArchaeologyError {
    pub(crate) fn unavailable(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::RepositoryUnavailable {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn corrupt(id: impl ToString, source: git2::Error) -> Self {
        Self::CorruptHistory {
            id: id.to_string(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchaeologyError>;
