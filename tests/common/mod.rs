//! Shared helpers for integration tests: throwaway git repositories with
//! explicit commit timestamps.

#![allow(dead_code)]

use git2::{Oid, Repository, Signature, Time};
use std::path::Path;
use tempfile::TempDir;

/// 2024-01-07 00:00:00 UTC, a Sunday
pub const SUNDAY: i64 = 1_704_585_600;
pub const DAY: i64 = 86_400;

pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    pub fn location(&self) -> String {
        self.dir.path().to_string_lossy().to_string()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write (Some) or delete (None) files and commit them at `ts`.
    pub fn commit(&self, ts: i64, files: &[(&str, Option<&str>)]) -> Oid {
        let workdir = self.repo.workdir().unwrap();
        let mut index = self.repo.index().unwrap();
        for (path, content) in files {
            let full = workdir.join(path);
            match content {
                Some(text) => {
                    if let Some(parent) = full.parent() {
                        std::fs::create_dir_all(parent).unwrap();
                    }
                    std::fs::write(&full, text).unwrap();
                    index.add_path(Path::new(path)).unwrap();
                }
                None => {
                    std::fs::remove_file(&full).unwrap();
                    index.remove_path(Path::new(path)).unwrap();
                }
            }
        }
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::new("Test User", "test@example.com", &Time::new(ts, 0)).unwrap();
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, "test commit", &tree, &parents)
            .unwrap()
    }

    /// Delete the loose object file behind `oid`, leaving the history unreadable.
    pub fn remove_object(&self, oid: Oid) {
        let hex = oid.to_string();
        let path = self.repo.path().join("objects").join(&hex[..2]).join(&hex[2..]);
        std::fs::remove_file(path).unwrap();
    }

    pub fn tree_of(&self, commit: Oid) -> Oid {
        self.repo.find_commit(commit).unwrap().tree_id()
    }
}

/// `n` numbered lines, each ending in a newline.
pub fn lines(n: usize) -> String {
    (0..n).map(|i| format!("line {i}\n")).collect()
}
