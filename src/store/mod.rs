//! Persisted extraction store
//!
//! SQLite database with two tables, `commits` and `file_changes`, plus
//! secondary indexes on `file_changes(file_path)` and `file_changes(commit_sha)`.
//! The layout is stable so other tooling can read `history.db` directly.
//!
//! A store has exactly one write phase. `HistoryStore` is the writable handle
//! owned by the extractor; `seal()` consumes it and returns a `SealedStore`
//! that only exposes the aggregate reads the metrics engine needs.

use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ArchaeologyError, Result};
use crate::models::CommitRecord;

const SCHEMA_SQL: &str = "
    CREATE TABLE commits (
        sha        TEXT PRIMARY KEY,
        timestamp  INTEGER NOT NULL,
        author     TEXT NOT NULL,
        message    TEXT NOT NULL
    );

    CREATE TABLE file_changes (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        commit_sha     TEXT NOT NULL,
        file_path      TEXT NOT NULL,
        lines_added    INTEGER NOT NULL,
        lines_deleted  INTEGER NOT NULL,
        FOREIGN KEY (commit_sha) REFERENCES commits(sha)
    );

    CREATE INDEX idx_file_path ON file_changes(file_path);
    CREATE INDEX idx_commit_sha ON file_changes(commit_sha);
";

/// Writable extraction store.
pub struct HistoryStore {
    conn: Connection,
    path: Option<PathBuf>,
    commits_written: u64,
}

impl HistoryStore {
    /// Create a fresh store at `path`, destroying any previous store there.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ArchaeologyError::io(parent, e))?;
        }
        destroy(path)?;

        let conn = Connection::open(path)?;
        let store = Self::init(conn, Some(path.to_path_buf()))?;
        debug!("Created extraction store at {}", path.display());
        Ok(store)
    }

    /// Create a store that lives only as long as this handle.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn,
            path,
            commits_written: 0,
        })
    }

    /// Persist a batch of commits and their file changes in one transaction.
    ///
    /// Rows are inserted in batch order.
    pub fn write_batch(&mut self, batch: &[CommitRecord]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut insert_commit = tx.prepare_cached(
                "INSERT INTO commits (sha, timestamp, author, message) VALUES (?1, ?2, ?3, ?4)",
            )?;
            let mut insert_change = tx.prepare_cached(
                "INSERT INTO file_changes (commit_sha, file_path, lines_added, lines_deleted)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            for commit in batch {
                insert_commit.execute(params![
                    commit.sha,
                    commit.timestamp,
                    commit.author,
                    commit.message
                ])?;
                for change in &commit.changes {
                    insert_change.execute(params![
                        commit.sha,
                        change.path,
                        change.lines_added as i64,
                        change.lines_deleted as i64
                    ])?;
                }
            }
        }
        tx.commit()?;

        self.commits_written += batch.len() as u64;
        debug!(
            "Flushed batch of {} commits ({} total)",
            batch.len(),
            self.commits_written
        );
        Ok(())
    }

    /// End the write phase.
    pub fn seal(self) -> SealedStore {
        SealedStore {
            conn: self.conn,
            path: self.path,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Remove a previous store and its SQLite side files.
fn destroy(path: &Path) -> Result<()> {
    let mut targets = vec![path.to_path_buf()];
    for suffix in ["-journal", "-wal", "-shm"] {
        let mut side = path.as_os_str().to_owned();
        side.push(suffix);
        targets.push(PathBuf::from(side));
    }

    for target in targets {
        match std::fs::remove_file(&target) {
            Ok(()) => debug!("Removed previous store file {}", target.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ArchaeologyError::io(target, e)),
        }
    }
    Ok(())
}

/// Line totals of one commit that has at least one file change.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitLineTotals {
    pub timestamp: i64,
    /// Sum of (added - deleted)
    pub net: i64,
    /// Sum of (added + deleted)
    pub churn: u64,
}

/// Per-path aggregates over every change to that path.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAggregate {
    pub path: String,
    /// Distinct commits touching the path
    pub commits: u64,
    /// Sum of (added + deleted)
    pub churn: u64,
    /// Latest timestamp of a commit touching the path
    pub last_modified: i64,
}

/// Read-only view of a completed extraction store.
pub struct SealedStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SealedStore {
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn commit_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM commits", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn distinct_file_count(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT file_path) FROM file_changes",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Earliest and latest commit timestamps, None when there are no commits.
    pub fn timestamp_range(&self) -> Result<Option<(i64, i64)>> {
        let range: (Option<i64>, Option<i64>) = self.conn.query_row(
            "SELECT MIN(timestamp), MAX(timestamp) FROM commits",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(match range {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        })
    }

    /// Timestamps of every commit, ascending.
    pub fn commit_timestamps(&self) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT timestamp FROM commits ORDER BY timestamp, sha")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<i64>, _>>()
            .map_err(Into::into)
    }

    /// Line totals per commit, ascending by timestamp. Commits without file
    /// changes are absent.
    pub fn commit_line_totals(&self) -> Result<Vec<CommitLineTotals>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.timestamp,
                    SUM(fc.lines_added - fc.lines_deleted),
                    SUM(fc.lines_added + fc.lines_deleted)
             FROM commits c
             JOIN file_changes fc ON c.sha = fc.commit_sha
             GROUP BY c.sha
             ORDER BY c.timestamp, c.sha",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CommitLineTotals {
                timestamp: row.get(0)?,
                net: row.get(1)?,
                churn: row.get::<_, i64>(2)? as u64,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Aggregates for every distinct path, ordered by path.
    pub fn file_aggregates(&self) -> Result<Vec<FileAggregate>> {
        let mut stmt = self.conn.prepare(
            "SELECT fc.file_path,
                    COUNT(DISTINCT fc.commit_sha),
                    SUM(fc.lines_added + fc.lines_deleted),
                    MAX(c.timestamp)
             FROM file_changes fc
             JOIN commits c ON fc.commit_sha = c.sha
             GROUP BY fc.file_path
             ORDER BY fc.file_path",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FileAggregate {
                path: row.get(0)?,
                commits: row.get::<_, i64>(1)? as u64,
                churn: row.get::<_, i64>(2)? as u64,
                last_modified: row.get(3)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Distinct paths touched by each commit that has file changes.
    ///
    /// Commits are ordered by hash and paths within a commit by name.
    pub fn commit_file_sets(&self) -> Result<Vec<Vec<String>>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT commit_sha, file_path
             FROM file_changes
             ORDER BY commit_sha, file_path",
        )?;
        let mut rows = stmt.query([])?;

        let mut sets: Vec<Vec<String>> = Vec::new();
        let mut current_sha: Option<String> = None;
        while let Some(row) = rows.next()? {
            let sha: String = row.get(0)?;
            let path: String = row.get(1)?;
            if current_sha.as_deref() != Some(sha.as_str()) {
                sets.push(Vec::new());
                current_sha = Some(sha);
            }
            if let Some(files) = sets.last_mut() {
                files.push(path);
            }
        }
        Ok(sets)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::FileChangeRecord;
    use tempfile::tempdir;

    pub(crate) fn commit(sha: &str, timestamp: i64, changes: &[(&str, u64, u64)]) -> CommitRecord {
        CommitRecord {
            sha: sha.to_string(),
            timestamp,
            author: "Test User".to_string(),
            message: format!("commit {sha}"),
            changes: changes
                .iter()
                .map(|(path, added, deleted)| FileChangeRecord {
                    path: path.to_string(),
                    lines_added: *added,
                    lines_deleted: *deleted,
                })
                .collect(),
        }
    }

    /// Seed an in-memory store and seal it.
    pub(crate) fn sealed(commits: &[CommitRecord]) -> SealedStore {
        let mut store = HistoryStore::in_memory().unwrap();
        store.write_batch(commits).unwrap();
        store.seal()
    }

    #[test]
    fn test_empty_store_aggregates() -> anyhow::Result<()> {
        let store = HistoryStore::in_memory()?.seal();
        assert_eq!(store.commit_count()?, 0);
        assert_eq!(store.distinct_file_count()?, 0);
        assert_eq!(store.timestamp_range()?, None);
        assert!(store.commit_line_totals()?.is_empty());
        assert!(store.file_aggregates()?.is_empty());
        assert!(store.commit_file_sets()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_create_destroys_previous_store() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("history.db");

        let mut first = HistoryStore::create(&path)?;
        first.write_batch(&[commit("a1", 100, &[("a.txt", 1, 0)])])?;
        drop(first);

        let second = HistoryStore::create(&path)?.seal();
        assert_eq!(second.commit_count()?, 0);
        assert_eq!(second.path(), Some(path.as_path()));
        Ok(())
    }

    #[test]
    fn test_batches_preserve_rows() -> anyhow::Result<()> {
        let mut store = HistoryStore::in_memory()?;
        store.write_batch(&[
            commit("c1", 100, &[("a.rs", 10, 0), ("b.rs", 5, 0)]),
            commit("c2", 200, &[]),
        ])?;
        store.write_batch(&[commit("c3", 300, &[("a.rs", 2, 3)])])?;
        let store = store.seal();

        assert_eq!(store.commit_count()?, 3);
        assert_eq!(store.distinct_file_count()?, 2);
        assert_eq!(store.timestamp_range()?, Some((100, 300)));
        assert_eq!(store.commit_timestamps()?, vec![100, 200, 300]);

        let totals = store.commit_line_totals()?;
        assert_eq!(
            totals,
            vec![
                CommitLineTotals { timestamp: 100, net: 15, churn: 15 },
                CommitLineTotals { timestamp: 300, net: -1, churn: 5 },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_file_aggregates_and_sets() -> anyhow::Result<()> {
        let store = sealed(&[
            commit("c1", 100, &[("a.rs", 10, 0), ("b.rs", 5, 0)]),
            commit("c2", 200, &[("a.rs", 1, 1)]),
        ]);

        let files = store.file_aggregates()?;
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "a.rs");
        assert_eq!(files[0].commits, 2);
        assert_eq!(files[0].churn, 12);
        assert_eq!(files[0].last_modified, 200);
        assert_eq!(files[1].last_modified, 100);

        let sets = store.commit_file_sets()?;
        assert_eq!(
            sets,
            vec![
                vec!["a.rs".to_string(), "b.rs".to_string()],
                vec!["a.rs".to_string()],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_file_change_requires_commit() -> anyhow::Result<()> {
        let store = HistoryStore::in_memory()?;
        let result = store.conn.execute(
            "INSERT INTO file_changes (commit_sha, file_path, lines_added, lines_deleted)
             VALUES ('missing', 'x', 1, 0)",
            [],
        );
        assert!(result.is_err());
        Ok(())
    }
}
