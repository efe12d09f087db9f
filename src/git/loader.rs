//! Repository loading
//!
//! Opens a local repository or clones a remote one into a scratch directory
//! that lives exactly as long as the returned handle.

use git2::Repository;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{ArchaeologyError, Result};

/// Where a repository comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSource {
    Local(PathBuf),
    Remote(String),
}

impl RepoSource {
    /// Classify a user-supplied location.
    pub fn parse(location: &str) -> Self {
        const REMOTE_PREFIXES: &[&str] = &["http://", "https://", "ssh://", "git://", "git@"];
        if REMOTE_PREFIXES.iter().any(|p| location.starts_with(p)) {
            RepoSource::Remote(location.to_string())
        } else {
            RepoSource::Local(PathBuf::from(location))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, RepoSource::Remote(_))
    }
}

/// An opened repository. Remote clones are deleted on drop.
pub struct LoadedRepository {
    repo: Repository,
    source: RepoSource,
    // Declared after `repo` so the handle closes before the directory goes.
    scratch: Option<TempDir>,
}

impl LoadedRepository {
    /// Load a repository from a local path or remote URL.
    pub fn load(location: &str) -> Result<Self> {
        match RepoSource::parse(location) {
            RepoSource::Remote(url) => Self::clone_remote(url),
            RepoSource::Local(path) => Self::open_local(path),
        }
    }

    fn clone_remote(url: String) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("archaeology_")
            .tempdir()
            .map_err(|e| ArchaeologyError::unavailable(url.as_str(), e))?;

        info!("Cloning {} to {}", url, scratch.path().display());
        let repo = Repository::clone(&url, scratch.path())
            .map_err(|e| ArchaeologyError::unavailable(url.as_str(), e.message()))?;

        Ok(Self {
            repo,
            source: RepoSource::Remote(url),
            scratch: Some(scratch),
        })
    }

    fn open_local(path: PathBuf) -> Result<Self> {
        let resolved = path.canonicalize().map_err(|_| {
            ArchaeologyError::unavailable(path.display().to_string(), "path does not exist")
        })?;

        let repo = Repository::discover(&resolved).map_err(|e| {
            ArchaeologyError::unavailable(resolved.display().to_string(), e.message())
        })?;
        debug!("Opened git repository at {:?}", repo.path());

        Ok(Self {
            repo,
            source: RepoSource::Local(resolved),
            scratch: None,
        })
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn source(&self) -> &RepoSource {
        &self.source
    }

    /// Working tree root, or the git directory for bare repositories.
    pub fn root(&self) -> &Path {
        self.repo.workdir().unwrap_or_else(|| self.repo.path())
    }

    /// Scratch directory holding a remote clone.
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(|d| d.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_sources() {
        assert!(RepoSource::parse("https://github.com/rust-lang/rust").is_remote());
        assert!(RepoSource::parse("http://example.com/repo.git").is_remote());
        assert!(RepoSource::parse("git@github.com:org/repo.git").is_remote());
        assert!(RepoSource::parse("ssh://git@host/repo").is_remote());
        assert_eq!(
            RepoSource::parse("../some/repo"),
            RepoSource::Local(PathBuf::from("../some/repo"))
        );
    }

    #[test]
    fn test_missing_local_path_is_unavailable() {
        let err = LoadedRepository::load("/definitely/not/a/real/path/xyz")
            .err()
            .expect("load should fail");
        assert!(matches!(err, ArchaeologyError::RepositoryUnavailable { .. }));
        assert!(err.to_string().contains("path does not exist"));
    }

    #[test]
    fn test_non_repository_is_unavailable() -> anyhow::Result<()> {
        let dir = tempdir()?;
        // Guard against a temp dir nested inside some other checkout.
        if Repository::discover(dir.path()).is_ok() {
            return Ok(());
        }
        let result = LoadedRepository::load(dir.path().to_str().unwrap());
        assert!(matches!(
            result,
            Err(ArchaeologyError::RepositoryUnavailable { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_open_local_repository() -> anyhow::Result<()> {
        let dir = tempdir()?;
        Repository::init(dir.path())?;

        let loaded = LoadedRepository::load(dir.path().to_str().unwrap())?;
        assert!(!loaded.source().is_remote());
        assert!(loaded.scratch_dir().is_none());
        assert_eq!(loaded.root().canonicalize()?, dir.path().canonicalize()?);
        Ok(())
    }

    #[test]
    fn test_unreachable_remote_is_unavailable() {
        let result = LoadedRepository::load("https://127.0.0.1:9/nothing-here.git");
        assert!(matches!(
            result,
            Err(ArchaeologyError::RepositoryUnavailable { .. })
        ));
    }
}
