//! commitsync core library.
//!
//! This crate selects commits from a Git working copy, aggregates the files
//! they touched into a deduplicated sync set, and mirrors those files into a
//! destination tree: configuration, error types, the repository backend, the
//! selector and aggregator, the copier, and the run orchestrator.

pub mod config;
pub mod copier;
pub mod errors;
pub mod git;
pub mod models;
pub mod sync;
pub mod sync_engine;

// Re-exports for convenience.
pub use config::SyncConfig;
pub use copier::Copier;
pub use git::{CommitSource, GitClient};
pub use models::{SyncPolicy, SyncReport, SyncSet};
pub use sync_engine::SyncEngine;
