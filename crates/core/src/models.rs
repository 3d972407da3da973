//! Domain model types used throughout commitsync.
//!
//! These types bridge the repository backend, the selector/aggregator, the
//! copier, and the CLI report output.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Selection policy
// ---------------------------------------------------------------------------

/// Which commits a run considers. Fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Exactly these commits, resolved in this order.
    ByCommitList { ids: Vec<String> },
    /// Every commit reachable from HEAD whose author time is `>= since`.
    ByCommitTime { since: DateTime<FixedOffset> },
}

impl std::fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ByCommitList { ids } => write!(f, "commit list ({} ids)", ids.len()),
            Self::ByCommitTime { since } => write!(f, "commits since {}", since.to_rfc3339()),
        }
    }
}

// ---------------------------------------------------------------------------
// Commits
// ---------------------------------------------------------------------------

/// Information about a single Git commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    /// Author time in seconds since the Unix epoch.
    pub author_time: i64,
}

impl CommitInfo {
    /// Author time as a UTC timestamp.
    pub fn authored_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.author_time, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Abbreviated SHA for display.
    pub fn short_sha(&self) -> &str {
        let end = self.sha.len().min(8);
        &self.sha[..end]
    }
}

/// Kind of change a commit made to a path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    TypeChanged,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
            Self::TypeChanged => write!(f, "type_changed"),
        }
    }
}

/// A path touched by a commit. A move shows up as a deletion and an addition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub kind: ChangeKind,
}

impl FileChange {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Sync set
// ---------------------------------------------------------------------------

/// Deduplicated relative paths that need mirroring, accumulated over one run.
///
/// Iterates in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncSet {
    paths: BTreeSet<String>,
}

impl SyncSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path. Returns `true` if it was not already present.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.paths.insert(path.into())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SyncSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation outcome
// ---------------------------------------------------------------------------

/// Why a selected commit contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Authored by someone other than the configured author.
    AuthorMismatch { author: String },
    /// Message starts with "Merge branch".
    MergeCommit,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthorMismatch { author } => write!(f, "authored by {}", author),
            Self::MergeCommit => write!(f, "merge commit"),
        }
    }
}

/// Result of running one commit through the aggregator gates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// Passed every gate; `changed` paths reported, `new_paths` of them were
    /// not yet in the sync set.
    Included { changed: usize, new_paths: usize },
    Skipped(SkipReason),
}

/// One line of the per-commit log kept in a [`SyncReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub author: String,
    pub authored_at: DateTime<Utc>,
    pub summary: String,
    #[serde(flatten)]
    pub outcome: CommitOutcome,
}

impl CommitRecord {
    pub fn new(commit: &CommitInfo, outcome: CommitOutcome) -> Self {
        Self {
            sha: commit.sha.clone(),
            author: commit.author_name.clone(),
            authored_at: commit.authored_at(),
            summary: commit.summary().to_string(),
            outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A path the copier could not mirror.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedCopy {
    pub path: String,
    pub error: String,
}

/// Per-path results of the copy phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyReport {
    pub copied: Vec<String>,
    /// Paths with no file in the source tree (e.g. deleted by a commit).
    pub missing: Vec<String>,
    pub failed: Vec<FailedCopy>,
    pub bytes_copied: u64,
}

impl CopyReport {
    /// `true` when every path was copied.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }
}

/// Statistics and details from a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub policy: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Commits produced by the selector.
    pub selected: usize,
    pub included: usize,
    pub skipped_author: usize,
    pub skipped_merge: usize,
    pub commits: Vec<CommitRecord>,
    pub sync_set: SyncSet,
    /// `None` when the copy phase was disabled.
    pub copy: Option<CopyReport>,
}

impl SyncReport {
    pub fn new(policy: &SyncPolicy) -> Self {
        Self {
            policy: policy.to_string(),
            started_at: Utc::now(),
            completed_at: None,
            selected: 0,
            included: 0,
            skipped_author: 0,
            skipped_merge: 0,
            commits: Vec::new(),
            sync_set: SyncSet::new(),
            copy: None,
        }
    }

    /// Tally one aggregated commit.
    pub fn record(&mut self, commit: &CommitInfo, outcome: CommitOutcome) {
        match &outcome {
            CommitOutcome::Included { .. } => self.included += 1,
            CommitOutcome::Skipped(SkipReason::AuthorMismatch { .. }) => self.skipped_author += 1,
            CommitOutcome::Skipped(SkipReason::MergeCommit) => self.skipped_merge += 1,
        }
        self.commits.push(CommitRecord::new(commit, outcome));
    }

    pub fn is_dry_run(&self) -> bool {
        self.copy.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(sha: &str, message: &str) -> CommitInfo {
        CommitInfo {
            sha: sha.into(),
            message: message.into(),
            author_name: "alice".into(),
            author_email: "alice@example.com".into(),
            author_time: 1_700_000_000,
        }
    }

    #[test]
    fn test_sync_set_deduplicates() {
        let mut set = SyncSet::new();
        assert!(set.insert("b.txt"));
        assert!(set.insert("a.txt"));
        assert!(!set.insert("b.txt"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_sync_set_serializes_as_array() {
        let set: SyncSet = ["z", "a"].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","z"]"#);
    }

    #[test]
    fn test_commit_info_helpers() {
        let c = commit("0123456789abcdef", "Fix parser\n\nLonger body");
        assert_eq!(c.summary(), "Fix parser");
        assert_eq!(c.short_sha(), "01234567");
        assert_eq!(c.authored_at().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_report_tallies_outcomes() {
        let policy = SyncPolicy::ByCommitList { ids: vec!["a".into()] };
        let mut report = SyncReport::new(&policy);
        report.record(
            &commit("a", "one"),
            CommitOutcome::Included {
                changed: 2,
                new_paths: 2,
            },
        );
        report.record(
            &commit("b", "Merge branch 'x'"),
            CommitOutcome::Skipped(SkipReason::MergeCommit),
        );
        report.record(
            &commit("c", "three"),
            CommitOutcome::Skipped(SkipReason::AuthorMismatch {
                author: "carol".into(),
            }),
        );
        assert_eq!(report.included, 1);
        assert_eq!(report.skipped_merge, 1);
        assert_eq!(report.skipped_author, 1);
        assert!(report.is_dry_run());
    }

    #[test]
    fn test_commit_record_json_shape() {
        let record = CommitRecord::new(
            &commit("abc", "msg"),
            CommitOutcome::Skipped(SkipReason::MergeCommit),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["reason"], "merge_commit");
    }
}
