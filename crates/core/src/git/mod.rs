//! Git repository access for commitsync.
//!
//! The selector and aggregator only talk to a [`CommitSource`]; the
//! production implementation is [`GitClient`], backed by `git2`.

pub mod client;

pub use client::GitClient;

use crate::errors::GitError;
use crate::models::{CommitInfo, FileChange};

/// Commits yielded by a history walk, newest first.
pub type CommitIter<'a> = Box<dyn Iterator<Item = Result<CommitInfo, GitError>> + 'a>;

/// Read-only view of a repository's commit history.
pub trait CommitSource {
    /// Resolve a full or abbreviated commit id.
    fn resolve_commit(&self, id: &str) -> Result<CommitInfo, GitError>;

    /// Walk every commit reachable from HEAD in the backend's native order.
    fn history_from_head(&self) -> Result<CommitIter<'_>, GitError>;

    /// List the paths a commit changed relative to its first parent.
    fn changed_files(&self, commit: &CommitInfo) -> Result<Vec<FileChange>, GitError>;
}
