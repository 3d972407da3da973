//! Run orchestrator.
//!
//! The [`SyncEngine`] drives one run end to end:
//!
//! 1. Open the source repository.
//! 2. Select candidate commits according to the configured policy.
//! 3. Aggregate each candidate into a fresh [`SyncSet`].
//! 4. If copying is enabled, mirror the set into the destination tree.
//!
//! Steps 1-3 abort the run on any error. Step 4 never does.

use chrono::Utc;
use tracing::{info, instrument};

use crate::config::SyncConfig;
use crate::copier::Copier;
use crate::errors::{CoreError, SyncError};
use crate::git::{CommitSource, GitClient};
use crate::models::{SyncReport, SyncSet};
use crate::sync::{selector, Aggregator};

/// Executes a configured run.
pub struct SyncEngine {
    config: SyncConfig,
    copy_enabled: bool,
}

impl SyncEngine {
    /// Create an engine for a validated configuration.
    pub fn new(config: SyncConfig) -> Self {
        let copy_enabled = config.copy.enabled;
        Self {
            config,
            copy_enabled,
        }
    }

    /// Disable the copy phase regardless of `copy.enabled`.
    pub fn dry_run(mut self) -> Self {
        self.copy_enabled = false;
        self
    }

    pub fn copy_enabled(&self) -> bool {
        self.copy_enabled
    }

    /// Open the configured repository and run against it.
    pub fn run(&self) -> Result<SyncReport, CoreError> {
        let client = GitClient::open(&self.config.paths.source).map_err(SyncError::OpenFailed)?;
        self.run_with_source(&client)
    }

    /// Run against an already opened commit source.
    #[instrument(skip_all, fields(author = %self.config.selection.author))]
    pub fn run_with_source<S: CommitSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<SyncReport, CoreError> {
        let policy = self.config.policy()?;
        let mut report = SyncReport::new(&policy);
        info!(policy = %policy, copy = self.copy_enabled, "starting sync run");

        let commits = selector::select(source, &policy)?;
        report.selected = commits.len();

        let aggregator = Aggregator::new(self.config.selection.author.as_str());
        let mut sync_set = SyncSet::new();
        for commit in &commits {
            let outcome = aggregator.aggregate(source, commit, &mut sync_set)?;
            report.record(commit, outcome);
        }
        info!(
            included = report.included,
            skipped_author = report.skipped_author,
            skipped_merge = report.skipped_merge,
            paths = sync_set.len(),
            "aggregation finished"
        );

        if self.copy_enabled {
            let copier = Copier::new(&self.config.paths.source, &self.config.paths.destination);
            report.copy = Some(copier.copy_all(&sync_set));
        } else {
            info!("copy disabled, destination left untouched");
        }

        report.sync_set = sync_set;
        report.completed_at = Some(Utc::now());
        Ok(report)
    }
}
