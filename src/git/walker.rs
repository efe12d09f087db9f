//! Commit walker
//!
//! Walks the commit graph from `HEAD` in topological order (ties by commit
//! time, newest first) and yields one `CommitRecord` per retained commit.
//! Each record carries the non-binary file changes of the commit against its
//! first parent, with rename detection applied and zero context lines.
//!
//! The walker is a lazy, finite iterator. It stops for good after the first
//! error, so a corrupt object can never be followed by a partial tail.

use git2::{Diff, DiffFindOptions, DiffOptions, ErrorCode, Oid, Patch, Repository, Revwalk, Sort};
use std::collections::HashSet;
use tracing::debug;

use crate::error::{ArchaeologyError, Result};
use crate::models::{CommitRecord, FileChangeRecord};

pub struct CommitWalker<'repo> {
    repo: &'repo Repository,
    revwalk: Option<Revwalk<'repo>>,
    /// Keep every k-th commit of the walk (k > 1)
    sample: Option<usize>,
    walked: usize,
    skipped_binary: usize,
    finished: bool,
}

impl<'repo> CommitWalker<'repo> {
    /// Start a walk at the current branch tip.
    ///
    /// A repository whose `HEAD` is unborn yields an empty walk.
    pub fn new(repo: &'repo Repository, sample: Option<usize>) -> Result<Self> {
        let revwalk = match repo.head() {
            Ok(_) => {
                let mut revwalk = repo
                    .revwalk()
                    .map_err(|e| ArchaeologyError::corrupt("HEAD", e))?;
                revwalk
                    .set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
                    .map_err(|e| ArchaeologyError::corrupt("HEAD", e))?;
                revwalk
                    .push_head()
                    .map_err(|e| ArchaeologyError::corrupt("HEAD", e))?;
                Some(revwalk)
            }
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                debug!("HEAD is unborn, history is empty");
                None
            }
            Err(e) => return Err(ArchaeologyError::corrupt("HEAD", e)),
        };

        Ok(Self {
            repo,
            revwalk,
            sample: sample.filter(|&k| k > 1),
            walked: 0,
            skipped_binary: 0,
            finished: false,
        })
    }

    /// Commits visited so far, sampled-out ones included.
    pub fn walked(&self) -> usize {
        self.walked
    }

    /// Binary file changes dropped so far.
    pub fn skipped_binary(&self) -> usize {
        self.skipped_binary
    }

    fn is_sampled_out(&self, position: usize) -> bool {
        self.sample.is_some_and(|k| position % k != 0)
    }

    /// First commit reachable from `HEAD` whose object cannot be read.
    ///
    /// Parent ids come from the child commit, so a missing commit is named
    /// even though its own object is gone.
    fn find_unreadable_commit(&self) -> Option<Oid> {
        let head = self.repo.head().ok()?.target()?;
        let mut pending = vec![head];
        let mut seen = HashSet::new();
        while let Some(oid) = pending.pop() {
            if !seen.insert(oid) {
                continue;
            }
            match self.repo.find_commit(oid) {
                Ok(commit) => pending.extend(commit.parent_ids()),
                Err(_) => return Some(oid),
            }
        }
        None
    }

    fn extract(&mut self, oid: Oid) -> Result<CommitRecord> {
        let corrupt = |e| ArchaeologyError::corrupt(oid, e);

        let commit = self.repo.find_commit(oid).map_err(corrupt)?;
        let tree = commit.tree().map_err(corrupt)?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0).and_then(|p| p.tree()).map_err(corrupt)?)
        } else {
            // Root commit: diffing the empty tree against it reports its
            // content as additions.
            None
        };

        let mut diff_opts = DiffOptions::new();
        diff_opts.context_lines(0);
        let mut diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))
            .map_err(corrupt)?;

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts)).map_err(corrupt)?;

        let (changes, binary) = collect_changes(&diff).map_err(corrupt)?;
        self.skipped_binary += binary;

        let author = commit.author();
        Ok(CommitRecord {
            sha: oid.to_string(),
            timestamp: author.when().seconds(),
            author: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            message: String::from_utf8_lossy(commit.message_bytes())
                .trim()
                .to_string(),
            changes,
        })
    }
}

impl Iterator for CommitWalker<'_> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let oid = match self.revwalk.as_mut()?.next()? {
                Ok(oid) => oid,
                Err(e) => {
                    self.finished = true;
                    let id = self
                        .find_unreadable_commit()
                        .map(|oid| oid.to_string())
                        .unwrap_or_else(|| "HEAD".to_string());
                    return Some(Err(ArchaeologyError::corrupt(id, e)));
                }
            };

            let position = self.walked;
            self.walked += 1;
            if self.is_sampled_out(position) {
                continue;
            }

            let record = self.extract(oid);
            if record.is_err() {
                self.finished = true;
            }
            return Some(record);
        }
    }
}

/// Line stats for every non-binary delta. Returns the changes and the number
/// of binary deltas dropped.
fn collect_changes(diff: &Diff<'_>) -> std::result::Result<(Vec<FileChangeRecord>, usize), git2::Error> {
    let mut changes = Vec::new();
    let mut binary = 0;

    for idx in 0..diff.deltas().len() {
        let patch = Patch::from_diff(diff, idx)?;
        let Some(delta) = diff.get_delta(idx) else {
            continue;
        };

        let (added, deleted) = match &patch {
            Some(patch) if !patch.delta().flags().is_binary() => {
                let (_context, added, deleted) = patch.line_stats()?;
                (added, deleted)
            }
            // No patch is produced for binary content or for a delta
            // without content change, such as a pure rename.
            None if !delta.flags().is_binary() => (0, 0),
            _ => {
                binary += 1;
                continue;
            }
        };

        let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) else {
            continue;
        };

        changes.push(FileChangeRecord {
            path: path.to_string_lossy().into_owned(),
            lines_added: added as u64,
            lines_deleted: deleted as u64,
        });
    }

    Ok((changes, binary))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use git2::{Signature, Time};
    use std::path::Path;
    use tempfile::tempdir;

    /// Commit the given files (path, content or None to delete) on HEAD at `ts`.
    pub(crate) fn commit_files(
        repo: &Repository,
        ts: i64,
        message: &str,
        files: &[(&str, Option<&[u8]>)],
    ) -> anyhow::Result<Oid> {
        let workdir = repo.workdir().expect("non-bare test repo");
        let mut index = repo.index()?;
        for (path, content) in files {
            let full = workdir.join(path);
            match content {
                Some(bytes) => {
                    if let Some(parent) = full.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&full, bytes)?;
                    index.add_path(Path::new(path))?;
                }
                None => {
                    std::fs::remove_file(&full)?;
                    index.remove_path(Path::new(path))?;
                }
            }
        }
        index.write()?;
        let tree = repo.find_tree(index.write_tree()?)?;
        let sig = Signature::new("Test User", "test@example.com", &Time::new(ts, 0))?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        Ok(repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?)
    }

    fn lines(n: usize) -> Vec<u8> {
        (0..n).map(|i| format!("line {i}\n")).collect::<String>().into_bytes()
    }

    #[test]
    fn test_empty_repository_yields_nothing() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;
        let mut walker = CommitWalker::new(&repo, None)?;
        assert!(walker.next().is_none());
        assert_eq!(walker.walked(), 0);
        Ok(())
    }

    #[test]
    fn test_root_commit_reports_additions() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;
        commit_files(&repo, 1_700_000_000, "  Add a\n\n", &[("a.txt", Some(lines(10).as_slice()))])?;

        let records: Vec<_> = CommitWalker::new(&repo, None)?.collect::<Result<_>>()?;
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.timestamp, 1_700_000_000);
        assert_eq!(record.author, "Test User");
        assert_eq!(record.message, "Add a");
        assert_eq!(
            record.changes,
            vec![FileChangeRecord {
                path: "a.txt".to_string(),
                lines_added: 10,
                lines_deleted: 0,
            }]
        );
        Ok(())
    }

    #[test]
    fn test_deletions_against_first_parent() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;
        commit_files(&repo, 1_000, "add", &[("a.txt", Some(lines(10).as_slice()))])?;
        let trimmed: Vec<u8> = lines(10)
            .split_inclusive(|b| *b == b'\n')
            .take(6)
            .flatten()
            .copied()
            .collect();
        commit_files(&repo, 2_000, "trim", &[("a.txt", Some(trimmed.as_slice()))])?;

        let records: Vec<_> = CommitWalker::new(&repo, None)?.collect::<Result<_>>()?;
        assert_eq!(records.len(), 2);
        // Newest first
        assert_eq!(records[0].message, "trim");
        assert_eq!(records[0].changes[0].lines_added, 0);
        assert_eq!(records[0].changes[0].lines_deleted, 4);
        Ok(())
    }

    #[test]
    fn test_binary_changes_are_dropped() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;
        commit_files(
            &repo,
            1_000,
            "mixed",
            &[
                ("img.bin", Some(&[0u8, 159, 146, 150, 0, 1, 2, 3][..])),
                ("notes.md", Some(&b"hello\n"[..])),
            ],
        )?;

        let mut walker = CommitWalker::new(&repo, None)?;
        let record = walker.next().expect("one commit")?;
        assert_eq!(record.changes.len(), 1);
        assert_eq!(record.changes[0].path, "notes.md");
        assert_eq!(walker.skipped_binary(), 1);
        Ok(())
    }

    #[test]
    fn test_rename_is_not_delete_plus_add() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;
        commit_files(&repo, 1_000, "add", &[("old.txt", Some(lines(20).as_slice()))])?;
        commit_files(
            &repo,
            2_000,
            "move",
            &[("old.txt", None), ("new.txt", Some(lines(20).as_slice()))],
        )?;

        let records: Vec<_> = CommitWalker::new(&repo, None)?.collect::<Result<_>>()?;
        let moved = &records[0];
        assert_eq!(moved.changes.len(), 1);
        assert_eq!(moved.changes[0].path, "new.txt");
        assert_eq!(moved.changes[0].lines_added, 0);
        assert_eq!(moved.changes[0].lines_deleted, 0);
        Ok(())
    }

    #[test]
    fn test_sampling_counts_full_walk() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;
        let mut oids = Vec::new();
        for i in 0..10 {
            let content = format!("version {i}\n");
            oids.push(commit_files(
                &repo,
                1_000 + i * 60,
                &format!("c{i}"),
                &[("f.txt", Some(content.as_bytes()))],
            )?);
        }
        // Walk order is newest first on a linear history.
        oids.reverse();

        let mut walker = CommitWalker::new(&repo, Some(3))?;
        let records: Vec<_> = walker.by_ref().collect::<Result<_>>()?;
        assert_eq!(walker.walked(), 10);
        let shas: Vec<_> = records.iter().map(|r| r.sha.clone()).collect();
        let expected: Vec<_> = [0, 3, 6, 9].iter().map(|&i| oids[i].to_string()).collect();
        assert_eq!(shas, expected);
        Ok(())
    }

    #[test]
    fn test_stride_of_one_keeps_everything() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;
        for i in 0..4 {
            let content = format!("{i}\n");
            commit_files(&repo, 1_000 + i, "c", &[("f.txt", Some(content.as_bytes()))])?;
        }
        let records: Vec<_> = CommitWalker::new(&repo, Some(1))?.collect::<Result<_>>()?;
        assert_eq!(records.len(), 4);
        Ok(())
    }

    /// Delete the loose object file for `oid`.
    fn remove_loose_object(repo: &Repository, oid: Oid) -> anyhow::Result<()> {
        let hex = oid.to_string();
        let path = repo.path().join("objects").join(&hex[..2]).join(&hex[2..]);
        std::fs::remove_file(path)?;
        Ok(())
    }

    /// Three linear commits, each with different content of f.txt.
    fn three_commits(repo: &Repository) -> anyhow::Result<Vec<Oid>> {
        (0..3)
            .map(|i| {
                let content = format!("version {i}\n");
                commit_files(repo, 1_000 + i * 60, "c", &[("f.txt", Some(content.as_bytes()))])
            })
            .collect()
    }

    /// Drain the walker, checking it ends in exactly one error and stays done.
    fn walk_to_error(repo: &Repository) -> anyhow::Result<ArchaeologyError> {
        let mut walker = CommitWalker::new(repo, None)?;
        let items: Vec<_> = walker.by_ref().collect();
        assert!(walker.next().is_none());

        let errors: Vec<_> = items.into_iter().filter_map(|item| item.err()).collect();
        assert_eq!(errors.len(), 1);
        Ok(errors.into_iter().next().expect("one error"))
    }

    #[test]
    fn test_missing_tree_stops_the_walk() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let oids = three_commits(&Repository::init(dir.path())?)?;
        // Reopen so no object is served from the writer's cache.
        let repo = Repository::open(dir.path())?;
        let middle_tree = repo.find_commit(oids[1])?.tree_id();
        remove_loose_object(&repo, middle_tree)?;
        let repo = Repository::open(dir.path())?;

        let err = walk_to_error(&repo)?;
        assert!(matches!(err, ArchaeologyError::CorruptHistory { .. }));
        Ok(())
    }

    #[test]
    fn test_missing_commit_names_the_commit() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let oids = three_commits(&Repository::init(dir.path())?)?;
        remove_loose_object(&Repository::open(dir.path())?, oids[1])?;
        let repo = Repository::open(dir.path())?;

        match walk_to_error(&repo)? {
            ArchaeologyError::CorruptHistory { id, .. } => {
                assert!(id == oids[1].to_string() || id == oids[2].to_string(), "id {id}");
                assert_ne!(id, "HEAD");
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn test_find_unreadable_commit() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let oids = three_commits(&Repository::init(dir.path())?)?;
        let repo = Repository::open(dir.path())?;
        assert_eq!(CommitWalker::new(&repo, None)?.find_unreadable_commit(), None);

        remove_loose_object(&repo, oids[1])?;
        let repo = Repository::open(dir.path())?;
        let walker = CommitWalker::new(&repo, None)?;
        assert_eq!(walker.find_unreadable_commit(), Some(oids[1]));
        Ok(())
    }
}
