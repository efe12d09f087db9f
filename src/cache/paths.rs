//! Data directory paths - uses ~/.cache/archaeology/<repo-hash>/ by default

use std::path::{Path, PathBuf};

use crate::git::RepoSource;

/// Extraction store file name inside a data directory.
pub const STORE_FILE: &str = "history.db";
/// Metrics snapshot file name inside a data directory.
pub const SNAPSHOT_FILE: &str = "metrics.json";

/// Default data directory for a repository.
/// Uses ~/.cache/archaeology/<repo-hash>/ on Unix, %LOCALAPPDATA%/archaeology/<repo-hash>/ on Windows.
///
/// Remote repositories are keyed on their URL, so repeated runs against the
/// same remote reuse one directory even though each run clones afresh.
pub fn get_data_dir(source: &RepoSource) -> PathBuf {
    let key = match source {
        RepoSource::Local(path) => hash_path(path),
        RepoSource::Remote(url) => hash_location(url, remote_name(url)),
    };

    let base = if cfg!(windows) {
        std::env::var("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")))
    } else {
        dirs::cache_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".cache"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    };

    base.join("archaeology").join(key)
}

pub fn get_store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE)
}

pub fn get_snapshot_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SNAPSHOT_FILE)
}

/// Hash a path to create a unique but deterministic directory name.
/// Uses the canonical path to ensure consistency.
fn hash_path(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    // file_name of the canonical path, so "." still gets a real name
    let name = canonical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("repo");
    hash_location(&canonical.to_string_lossy(), name)
}

/// Last path segment of a clone URL without `.git`.
fn remote_name(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed
        .rsplit(|c: char| c == '/' || c == ':')
        .next()
        .unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last)
}

fn hash_location(location: &str, name: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    location.hash(&mut hasher);
    let hash = hasher.finish();

    let name = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(20)
        .collect::<String>();
    let name = if name.is_empty() { "repo".to_string() } else { name };

    format!("{}-{:012x}", name, hash)
}
