//! Local Git repository access via `git2`.

use std::path::Path;

use git2::{Delta, ErrorCode, Oid, Repository, Sort};
use tracing::{debug, info, instrument, warn};

use super::{CommitIter, CommitSource};
use crate::errors::GitError;
use crate::models::{ChangeKind, CommitInfo, FileChange};

/// Shortest abbreviated SHA accepted for a listed commit.
const MIN_ABBREV_LEN: usize = 4;

/// Read-only Git client wrapping a `git2::Repository`.
pub struct GitClient {
    repo: Repository,
}

impl GitClient {
    /// Open an existing Git repository at `repo_path`.
    pub fn open<P: AsRef<Path>>(repo_path: P) -> Result<Self, GitError> {
        let path = repo_path.as_ref();
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitError::RepositoryNotFound(path.display().to_string()),
            _ => GitError::OpenFailed {
                path: path.display().to_string(),
                detail: e.message().to_string(),
            },
        })?;
        Ok(Self { repo })
    }

    fn find_commit(&self, sha: &str) -> Result<git2::Commit<'_>, GitError> {
        let oid = Oid::from_str(sha).map_err(|_| GitError::InvalidCommitId(sha.to_string()))?;
        self.repo.find_commit(oid).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitError::CommitNotFound(sha.to_string()),
            _ => GitError::Git2Error(e),
        })
    }
}

fn commit_info(commit: &git2::Commit<'_>) -> CommitInfo {
    let author = commit.author();
    CommitInfo {
        sha: commit.id().to_string(),
        message: commit.message().unwrap_or("").to_string(),
        author_name: author.name().unwrap_or("").to_string(),
        author_email: author.email().unwrap_or("").to_string(),
        author_time: author.when().seconds(),
    }
}

fn change_kind(status: Delta) -> Option<ChangeKind> {
    match status {
        Delta::Added => Some(ChangeKind::Added),
        Delta::Modified => Some(ChangeKind::Modified),
        Delta::Deleted => Some(ChangeKind::Deleted),
        Delta::Typechange => Some(ChangeKind::TypeChanged),
        _ => None,
    }
}

fn is_commit_id(id: &str) -> bool {
    (MIN_ABBREV_LEN..=40).contains(&id.len()) && id.chars().all(|c| c.is_ascii_hexdigit())
}

impl CommitSource for GitClient {
    fn resolve_commit(&self, id: &str) -> Result<CommitInfo, GitError> {
        if !is_commit_id(id) {
            return Err(GitError::InvalidCommitId(id.to_string()));
        }
        let commit = self
            .repo
            .find_commit_by_prefix(id)
            .map_err(|e| match e.code() {
                ErrorCode::NotFound => GitError::CommitNotFound(id.to_string()),
                _ => GitError::Git2Error(e),
            })?;
        debug!(id, sha = %commit.id(), "resolved commit");
        Ok(commit_info(&commit))
    }

    fn history_from_head(&self) -> Result<CommitIter<'_>, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk
            .push_head()
            .map_err(|e| GitError::HeadUnresolved(e.message().to_string()))?;
        revwalk.set_sorting(Sort::TIME)?;

        let repo = &self.repo;
        Ok(Box::new(revwalk.map(move |oid_result| {
            let oid = oid_result?;
            let commit = repo.find_commit(oid)?;
            Ok(commit_info(&commit))
        })))
    }

    #[instrument(skip(self, commit), fields(sha = %commit.short_sha()))]
    fn changed_files(&self, commit: &CommitInfo) -> Result<Vec<FileChange>, GitError> {
        let diff_failed = |e: git2::Error| GitError::DiffFailed {
            sha: commit.sha.clone(),
            detail: e.message().to_string(),
        };

        let commit = self.find_commit(&commit.sha)?;
        let tree = commit.tree().map_err(diff_failed)?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0).and_then(|p| p.tree()).map_err(diff_failed)?)
        } else {
            None
        };

        // No rename detection: a move is a deletion of the old path plus an
        // addition of the new one, and both must be mirrored.
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .map_err(diff_failed)?;

        let mut changes = Vec::new();
        for delta in diff.deltas() {
            let Some(kind) = change_kind(delta.status()) else {
                continue;
            };
            let file = if kind == ChangeKind::Deleted {
                delta.old_file()
            } else {
                delta.new_file()
            };
            let Some(path) = file.path() else {
                continue;
            };
            let rel = path.to_string_lossy();
            if path.to_str().is_none() {
                warn!(path = %rel, "changed path is not valid UTF-8, recorded lossily");
            }
            changes.push(FileChange::new(rel, kind));
        }
        debug!(count = changes.len(), "collected changed files");
        Ok(changes)
    }
}
