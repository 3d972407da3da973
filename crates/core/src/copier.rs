//! Mirrors the files in a [`SyncSet`] from the source tree to the destination.
//!
//! The copier always takes the *current* working-tree file, never a
//! historical blob. Every path is handled independently: a missing source or
//! an I/O error is logged and recorded in the [`CopyReport`], and the copier
//! moves on to the next path.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, error, info};

use crate::errors::CopyError;
use crate::models::{CopyReport, FailedCopy, SyncSet};

/// Overwrite-copies relative paths from `source_root` into `dest_root`.
#[derive(Debug, Clone)]
pub struct Copier {
    source_root: PathBuf,
    dest_root: PathBuf,
}

impl Copier {
    pub fn new(source_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            dest_root: dest_root.into(),
        }
    }

    /// Copy every path in `set`. Never fails as a whole.
    pub fn copy_all(&self, set: &SyncSet) -> CopyReport {
        info!(
            count = set.len(),
            src = %self.source_root.display(),
            dst = %self.dest_root.display(),
            "copying files"
        );

        let mut report = CopyReport::default();
        for path in set.iter() {
            match self.copy_one(path) {
                Ok(size) => {
                    debug!(path, size, "copied file");
                    report.bytes_copied += size;
                    report.copied.push(path.to_string());
                }
                Err(CopyError::SourceMissing(src)) => {
                    error!(path, src = %src, "source file missing, skipping");
                    report.missing.push(path.to_string());
                }
                Err(e) => {
                    error!(path, error = %e, "copy failed, skipping");
                    report.failed.push(FailedCopy {
                        path: path.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            copied = report.copied.len(),
            missing = report.missing.len(),
            failed = report.failed.len(),
            bytes = report.bytes_copied,
            "copy finished"
        );
        report
    }

    /// Copy a single relative path, returning the number of bytes written.
    pub fn copy_one(&self, rel_path: &str) -> Result<u64, CopyError> {
        let rel = safe_relative(rel_path)?;
        let src = self.source_root.join(rel);
        let dst = self.dest_root.join(rel);

        if !src.is_file() {
            return Err(CopyError::SourceMissing(src.display().to_string()));
        }

        let io_err = |source: std::io::Error| CopyError::Io {
            path: rel_path.to_string(),
            source,
        };

        match std::fs::remove_file(&dst) {
            Ok(()) => debug!(path = %dst.display(), "removed existing destination file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(e)),
        }

        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        std::fs::copy(&src, &dst).map_err(io_err)
    }
}

/// Reject absolute paths and `..` so nothing is written outside the root.
fn safe_relative(rel_path: &str) -> Result<&Path, CopyError> {
    let path = Path::new(rel_path);
    let ok = !rel_path.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if ok {
        Ok(path)
    } else {
        Err(CopyError::UnsafePath(rel_path.to_string()))
    }
}
