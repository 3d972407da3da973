//! Change aggregator.
//!
//! Each candidate commit passes three gates in order:
//!
//! 1. author: the author name must equal the configured author exactly;
//! 2. merge: messages starting with `Merge branch` are skipped;
//! 3. extraction: the commit's changed paths are read from the backend.
//!
//! A commit that fails gate 1 or 2 leaves the sync set untouched. A failure in
//! gate 3 aborts the run.

use tracing::{debug, info, warn};

use crate::errors::SyncError;
use crate::git::CommitSource;
use crate::models::{CommitInfo, CommitOutcome, SkipReason, SyncSet};

/// Message prefix of commits produced by `git merge <branch>`.
pub const MERGE_PREFIX: &str = "Merge branch";

/// Applies the author and merge gates and collects changed paths.
#[derive(Debug, Clone)]
pub struct Aggregator {
    author: String,
}

impl Aggregator {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
        }
    }

    /// Evaluate the gates that need no repository access.
    pub fn check_gates(&self, commit: &CommitInfo) -> Option<SkipReason> {
        if commit.author_name != self.author {
            return Some(SkipReason::AuthorMismatch {
                author: commit.author_name.clone(),
            });
        }
        if commit.message.starts_with(MERGE_PREFIX) {
            return Some(SkipReason::MergeCommit);
        }
        None
    }

    /// Run `commit` through all gates and union its paths into `set`.
    pub fn aggregate<S: CommitSource + ?Sized>(
        &self,
        source: &S,
        commit: &CommitInfo,
        set: &mut SyncSet,
    ) -> Result<CommitOutcome, SyncError> {
        if let Some(reason) = self.check_gates(commit) {
            match &reason {
                SkipReason::MergeCommit => {
                    warn!(sha = %commit.short_sha(), summary = %commit.summary(), "skipping merge commit")
                }
                SkipReason::AuthorMismatch { author } => {
                    debug!(sha = %commit.short_sha(), author = %author, "skipping commit by other author")
                }
            }
            return Ok(CommitOutcome::Skipped(reason));
        }

        let changes = source
            .changed_files(commit)
            .map_err(|source| SyncError::ChangeSet {
                sha: commit.sha.clone(),
                source,
            })?;

        if !changes.is_empty() {
            info!("{}===>{}", commit.author_name, commit.summary());
        }

        let mut new_paths = 0;
        for change in &changes {
            if set.insert(change.path.as_str()) {
                new_paths += 1;
            }
            debug!(path = %change.path, kind = %change.kind, "queued for sync");
        }

        Ok(CommitOutcome::Included {
            changed: changes.len(),
            new_paths,
        })
    }
}
