//! Configuration for a commitsync run.
//!
//! The configuration is loaded from a TOML file before the core runs. A
//! malformed or incomplete file is rejected here, so the selector and
//! aggregator only ever see a validated [`SyncConfig`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;
use crate::models::SyncPolicy;

/// Log levels accepted by `[logging] level`.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Complete configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Source repository and destination tree.
    pub paths: PathsConfig,

    /// Which commits are in scope.
    pub selection: SelectionConfig,

    /// Copy-phase switch.
    #[serde(default)]
    pub copy: CopyConfig,

    /// Log verbosity.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Source and destination roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the Git working copy. Also the root files are copied from.
    pub source: PathBuf,

    /// Root of the tree files are copied into.
    pub destination: PathBuf,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// How candidate commits are chosen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Exactly the commits listed in `commits`, in order.
    CommitList,
    /// Every commit reachable from HEAD authored at or after `since`.
    CommitTime,
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommitList => write!(f, "commit_list"),
            Self::CommitTime => write!(f, "commit_time"),
        }
    }
}

/// Commit selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub mode: SelectionMode,

    /// Only commits by this exact author name are synced.
    pub author: String,

    /// Commit ids, used when `mode = "commit_list"`.
    #[serde(default)]
    pub commits: Vec<String>,

    /// Lower bound on the author timestamp, used when `mode = "commit_time"`.
    /// RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` (local time).
    #[serde(default)]
    pub since: Option<String>,
}

// ---------------------------------------------------------------------------
// Copy
// ---------------------------------------------------------------------------

/// Copy-phase settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyConfig {
    /// When false the run stops after aggregation (dry run).
    #[serde(default)]
    pub enabled: bool,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl SyncConfig {
    /// Load a [`SyncConfig`] from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: SyncConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Read only `[logging] level` from a config file, without logging.
    ///
    /// Used before the tracing subscriber exists. Returns `None` when the
    /// file is missing, unreadable or malformed; full loading reports those.
    pub fn peek_log_level<P: AsRef<Path>>(path: P) -> Option<String> {
        #[derive(Deserialize)]
        struct LevelOnly {
            logging: Option<LoggingConfig>,
        }

        let contents = std::fs::read_to_string(path).ok()?;
        let parsed: LevelOnly = toml::from_str(&contents).ok()?;
        parsed.logging.map(|l| l.level)
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.source.as_os_str().is_empty() {
            return Err(invalid("paths.source", "source path must not be empty"));
        }
        if self.paths.destination.as_os_str().is_empty() {
            return Err(invalid(
                "paths.destination",
                "destination path must not be empty",
            ));
        }
        if self.selection.author.is_empty() {
            return Err(invalid("selection.author", "author must not be empty"));
        }

        match self.selection.mode {
            SelectionMode::CommitList => {
                if self.selection.commits.is_empty() {
                    return Err(invalid(
                        "selection.commits",
                        "commit_list mode needs at least one commit id",
                    ));
                }
                if let Some(pos) = self.selection.commits.iter().position(|c| c.trim().is_empty())
                {
                    return Err(invalid(
                        "selection.commits",
                        &format!("entry {} is empty", pos),
                    ));
                }
            }
            SelectionMode::CommitTime => {
                let raw = self.selection.since.as_deref().ok_or_else(|| {
                    invalid("selection.since", "commit_time mode needs a 'since' timestamp")
                })?;
                if parse_since(raw).is_none() {
                    return Err(invalid(
                        "selection.since",
                        &format!(
                            "cannot parse '{}' (expected RFC 3339, 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD')",
                            raw
                        ),
                    ));
                }
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(
                "logging.level",
                &format!("expected one of {}", LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the selection policy for this run.
    pub fn policy(&self) -> Result<SyncPolicy, ConfigError> {
        match self.selection.mode {
            SelectionMode::CommitList => Ok(SyncPolicy::ByCommitList {
                ids: self
                    .selection
                    .commits
                    .iter()
                    .map(|c| c.trim().to_string())
                    .collect(),
            }),
            SelectionMode::CommitTime => {
                let raw = self.selection.since.as_deref().unwrap_or_default();
                let since = parse_since(raw).ok_or_else(|| {
                    invalid("selection.since", &format!("cannot parse '{}'", raw))
                })?;
                Ok(SyncPolicy::ByCommitTime { since })
            }
        }
    }

    /// Generate a default TOML config template string.
    pub fn default_template() -> &'static str {
        r#"# commitsync configuration

[paths]
# Git working copy to read commits and files from.
source = "/path/to/working-copy"
# Tree that receives the copied files.
destination = "/path/to/destination"

[selection]
# "commit_list" syncs exactly the commits below;
# "commit_time" syncs every commit from HEAD authored at or after `since`.
mode = "commit_list"
author = "Your Name"
commits = ["0123abc"]
# since = "2024-01-01 00:00:00"

[copy]
# Leave false for a dry run that only reports which files would be copied.
enabled = false

[logging]
level = "info"
"#
    }
}

fn invalid(field: &str, detail: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        detail: detail.into(),
    }
}

/// Parse a `since` timestamp.
///
/// Accepts RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DD` that is
/// interpreted in the local time zone. Returns `None` for anything else,
/// including local times that fall into a DST gap.
pub fn parse_since(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml() -> &'static str {
        r#"
[paths]
source = "/srv/private"
destination = "/srv/dist"

[selection]
mode = "commit_list"
author = "alice"
commits = ["a1b2c3d", " 9f8e7d6 "]

[copy]
enabled = true

[logging]
level = "debug"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: SyncConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.paths.source, PathBuf::from("/srv/private"));
        assert_eq!(config.selection.mode, SelectionMode::CommitList);
        assert_eq!(config.selection.author, "alice");
        assert_eq!(config.selection.commits.len(), 2);
        assert!(config.copy.enabled);
        assert_eq!(config.logging.level, "debug");
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults() {
        let minimal = r#"
[paths]
source = "src"
destination = "dst"
[selection]
mode = "commit_time"
author = "bob"
since = "2024-03-01"
"#;
        let config: SyncConfig = toml::from_str(minimal).unwrap();
        assert!(!config.copy.enabled);
        assert_eq!(config.logging.level, "info");
        assert!(config.selection.commits.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(&path, sample_toml()).unwrap();

        let config = SyncConfig::load_and_validate(&path).expect("load failed");
        assert_eq!(config.paths.destination, PathBuf::from("/srv/dist"));
    }

    #[test]
    fn test_peek_log_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(&path, sample_toml()).unwrap();
        assert_eq!(SyncConfig::peek_log_level(&path).as_deref(), Some("debug"));

        std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();
        assert_eq!(SyncConfig::peek_log_level(&path).as_deref(), Some("warn"));

        std::fs::write(&path, "[paths]\nsource = \"s\"\n").unwrap();
        assert_eq!(SyncConfig::peek_log_level(&path), None);

        assert_eq!(SyncConfig::peek_log_level(dir.path().join("absent.toml")), None);
    }

    #[test]
    fn test_file_not_found() {
        let result = SyncConfig::load_from_file("/nonexistent/sync.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(&path, "[paths]\nsource = 12\n").unwrap();
        assert!(matches!(
            SyncConfig::load_from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_unknown_mode_is_parse_error() {
        let bad = r#"
[paths]
source = "a"
destination = "b"
[selection]
mode = "by_magic"
author = "x"
"#;
        assert!(toml::from_str::<SyncConfig>(bad).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_author() {
        let mut config: SyncConfig = toml::from_str(sample_toml()).unwrap();
        config.selection.author = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "selection.author"
        ));
    }

    #[test]
    fn test_validate_rejects_empty_commit_list() {
        let mut config: SyncConfig = toml::from_str(sample_toml()).unwrap();
        config.selection.commits.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "selection.commits"
        ));
    }

    #[test]
    fn test_validate_rejects_missing_since() {
        let mut config: SyncConfig = toml::from_str(sample_toml()).unwrap();
        config.selection.mode = SelectionMode::CommitTime;
        config.selection.since = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "selection.since"
        ));

        config.selection.since = Some("last tuesday".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config: SyncConfig = toml::from_str(sample_toml()).unwrap();
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policy_commit_list_trims_ids() {
        let config: SyncConfig = toml::from_str(sample_toml()).unwrap();
        match config.policy().unwrap() {
            SyncPolicy::ByCommitList { ids } => {
                assert_eq!(ids, vec!["a1b2c3d".to_string(), "9f8e7d6".to_string()]);
            }
            other => panic!("unexpected policy: {:?}", other),
        }
    }

    #[test]
    fn test_policy_commit_time() {
        let mut config: SyncConfig = toml::from_str(sample_toml()).unwrap();
        config.selection.mode = SelectionMode::CommitTime;
        config.selection.since = Some("2024-05-01T08:00:00+08:00".into());
        match config.policy().unwrap() {
            SyncPolicy::ByCommitTime { since } => {
                assert_eq!(since.timestamp(), 1_714_521_600);
            }
            other => panic!("unexpected policy: {:?}", other),
        }
    }

    #[test]
    fn test_parse_since_formats() {
        assert!(parse_since("2024-05-01T00:00:00Z").is_some());
        assert!(parse_since("2024-05-01 12:30:00").is_some());
        assert!(parse_since("2024-05-01").is_some());
        assert!(parse_since("05/01/2024").is_none());

        let day = parse_since("2024-05-01").unwrap();
        let noon = parse_since("2024-05-01 12:00:00").unwrap();
        assert_eq!(noon.timestamp() - day.timestamp(), 12 * 3600);
    }

    #[test]
    fn test_default_template_is_valid() {
        let config: SyncConfig = toml::from_str(SyncConfig::default_template())
            .expect("default template should be valid TOML");
        config.validate().unwrap();
    }
}
