//! Commit selector.

use tracing::{debug, info};

use crate::errors::SyncError;
use crate::git::CommitSource;
use crate::models::{CommitInfo, SyncPolicy};

/// Produce the candidate commits for `policy`.
///
/// With [`SyncPolicy::ByCommitList`] every id must resolve; the first one
/// that does not aborts selection. With [`SyncPolicy::ByCommitTime`] the whole
/// history reachable from HEAD is walked and commits authored at or after
/// `since` are kept, in walk order.
pub fn select<S: CommitSource + ?Sized>(
    source: &S,
    policy: &SyncPolicy,
) -> Result<Vec<CommitInfo>, SyncError> {
    let commits = match policy {
        SyncPolicy::ByCommitList { ids } => {
            let mut commits = Vec::with_capacity(ids.len());
            for id in ids {
                let commit =
                    source
                        .resolve_commit(id)
                        .map_err(|source| SyncError::UnresolvedCommit {
                            id: id.clone(),
                            source,
                        })?;
                commits.push(commit);
            }
            commits
        }
        SyncPolicy::ByCommitTime { since } => {
            let threshold = since.timestamp();
            let mut commits = Vec::new();
            let mut walked = 0usize;
            for commit in source.history_from_head().map_err(SyncError::HistoryWalk)? {
                let commit = commit.map_err(SyncError::HistoryWalk)?;
                walked += 1;
                if commit.author_time >= threshold {
                    commits.push(commit);
                }
            }
            debug!(walked, "history walk finished");
            commits
        }
    };

    info!(count = commits.len(), policy = %policy, "selected commits");
    Ok(commits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GitError;
    use crate::git::testing::MemorySource;
    use chrono::{TimeZone, Utc};

    fn since(ts: i64) -> SyncPolicy {
        SyncPolicy::ByCommitTime {
            since: Utc.timestamp_opt(ts, 0).unwrap().fixed_offset(),
        }
    }

    #[test]
    fn test_commit_list_keeps_configured_order() {
        let mut src = MemorySource::new();
        src.commit("aaaa1111", "alice", 10, "first", &["a.txt"]);
        src.commit("bbbb2222", "alice", 20, "second", &["b.txt"]);

        let policy = SyncPolicy::ByCommitList {
            ids: vec!["aaaa1111".into(), "bbbb2222".into()],
        };
        let commits = select(&src, &policy).unwrap();
        let shas: Vec<&str> = commits.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["aaaa1111", "bbbb2222"]);
    }

    #[test]
    fn test_unknown_listed_commit_is_fatal() {
        let mut src = MemorySource::new();
        src.commit("aaaa1111", "alice", 10, "first", &["a.txt"]);

        let policy = SyncPolicy::ByCommitList {
            ids: vec!["aaaa1111".into(), "ffff9999".into()],
        };
        let err = select(&src, &policy).unwrap_err();
        assert!(matches!(
            err,
            SyncError::UnresolvedCommit { ref id, source: GitError::CommitNotFound(_) } if id == "ffff9999"
        ));
    }

    #[test]
    fn test_since_boundary_is_inclusive() {
        let mut src = MemorySource::new();
        src.commit("c0", "alice", 999, "one second early", &["early.txt"]);
        src.commit("c1", "alice", 1_000, "exactly on time", &["on.txt"]);
        src.commit("c2", "alice", 1_500, "later", &["late.txt"]);

        let commits = select(&src, &since(1_000)).unwrap();
        let shas: Vec<&str> = commits.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["c2", "c1"]);
    }

    #[test]
    fn test_since_walks_past_older_commits() {
        let mut src = MemorySource::new();
        src.commit("old-but-late", "alice", 5_000, "rebased", &["x"]);
        src.commit("middle", "alice", 100, "ancient", &["y"]);
        src.commit("tip", "alice", 6_000, "tip", &["z"]);

        let commits = select(&src, &since(1_000)).unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[1].sha, "old-but-late");
    }

    #[test]
    fn test_walk_failure_is_fatal() {
        let mut src = MemorySource::new();
        src.broken_walk = true;
        assert!(matches!(
            select(&src, &since(0)),
            Err(SyncError::HistoryWalk(_))
        ));
    }
}
