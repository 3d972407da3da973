//! Error types for the commitsync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type. Everything here is fatal to a run; per-commit and per-path
//! skips are reported through [`crate::models::CommitOutcome`] and
//! [`crate::models::CopyReport`] instead.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Config(#[from] ConfigError),

}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from local Git (git2) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The repository path does not exist or is not a git repo.
    #[error("git repository not found at '{0}'")]
    RepositoryNotFound(String),

    /// The path exists but could not be opened as a repository.
    #[error("cannot open git repository at '{path}': {detail}")]
    OpenFailed { path: String, detail: String },

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// The commit identifier is not a valid (possibly abbreviated) hex SHA.
    #[error("invalid commit id '{0}'")]
    InvalidCommitId(String),

    /// The commit identifier is well-formed but names no commit.
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// HEAD could not be resolved (unborn branch, detached to nothing, ...).
    #[error("cannot resolve HEAD: {0}")]
    HeadUnresolved(String),

    /// The diff of a commit against its parent could not be computed.
    #[error("cannot compute changes of commit {sha}: {detail}")]
    DiffFailed { sha: String, detail: String },
}

// ---------------------------------------------------------------------------
// Sync errors
// ---------------------------------------------------------------------------

/// Errors that abort a sync run during selection or aggregation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The source repository could not be opened.
    #[error("cannot open source repository: {0}")]
    OpenFailed(#[source] GitError),

    /// An explicitly listed commit could not be resolved.
    #[error("cannot resolve listed commit '{id}': {source}")]
    UnresolvedCommit {
        id: String,
        #[source]
        source: GitError,
    },

    /// Walking history from HEAD failed.
    #[error("history walk failed: {0}")]
    HistoryWalk(#[source] GitError),

    /// The change set of a selected commit could not be computed.
    #[error("cannot read change set of commit {sha}: {source}")]
    ChangeSet {
        sha: String,
        #[source]
        source: GitError,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Copy errors
// ---------------------------------------------------------------------------

/// Failure to mirror a single path. Never aborts a run; the copier records
/// it in its report and moves on to the next path.
#[derive(Debug, Error)]
pub enum CopyError {
    /// The relative path is absolute or walks out of its root.
    #[error("path escapes the sync root: {0}")]
    UnsafePath(String),

    /// The file is absent from the source tree.
    #[error("source file missing: {0}")]
    SourceMissing(String),

    /// Removing, creating, or copying failed.
    #[error("copy I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
