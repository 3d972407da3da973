//! commitsync command-line tool.
//!
//! Selects commits from a Git working copy, collects the files they touched,
//! and mirrors those files into a destination tree. Also generates and
//! validates configuration files.

mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use commitsync_core::config::{SelectionMode, SyncConfig};
use commitsync_core::models::{CommitOutcome, SyncReport};
use commitsync_core::SyncEngine;

/// File name looked up next to the executable when `--config` is omitted.
const DEFAULT_CONFIG_NAME: &str = "sync.toml";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// commitsync command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "commitsync",
    version,
    about = "Mirror the files touched by selected Git commits into another tree"
)]
struct Cli {
    /// Path to the TOML configuration file [default: sync.toml next to the executable].
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Select commits, aggregate changed files, and copy them.
    Run {
        /// Skip the copy phase even if the config enables it.
        #[arg(long)]
        dry_run: bool,

        /// Print the run report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List selected commits and whether each one is synced.
    Log,

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_NAME)]
        output: String,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());

    let config_level = SyncConfig::peek_log_level(&config_path);
    let level = init_tracing(cli.verbose, config_level.as_deref());
    debug!(fallback = level, config = %config_path.display(), "logging initialized");

    match run(cli, &config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::error(&format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config_path: &Path) -> Result<()> {
    match cli.command {
        Commands::Init { output, force } => cmd_init(&expand_tilde(&output), force),
        Commands::Validate => cmd_validate(config_path),
        Commands::Run { dry_run, json } => cmd_run(config_path, dry_run, json),
        Commands::Log => cmd_log(config_path),
    }
}

/// Install the stderr subscriber. Returns the level used when `RUST_LOG` is unset.
fn init_tracing(verbose: bool, config_level: Option<&str>) -> &str {
    let fallback = fallback_level(verbose, config_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    fallback
}

fn fallback_level(verbose: bool, config_level: Option<&str>) -> &str {
    if verbose {
        "debug"
    } else {
        config_level.unwrap_or("info")
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn resolve_config_path(arg: Option<&str>) -> PathBuf {
    if let Some(path) = arg {
        return expand_tilde(path);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_CONFIG_NAME)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_NAME))
}

fn load_config(path: &Path) -> Result<SyncConfig> {
    SyncConfig::load_and_validate(path)
        .with_context(|| format!("failed to load configuration {}", path.display()))
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "file already exists: {}. Use --force to overwrite it.",
            output.display()
        );
    }

    std::fs::write(output, SyncConfig::default_template())
        .with_context(|| format!("failed to write config file {}", output.display()))?;

    println!(
        "{}",
        style::success(&format!(
            "Default configuration written to {}",
            output.display()
        ))
    );
    println!();
    println!("Next steps:");
    println!("  1. Set [paths] source and destination");
    println!("  2. Choose a [selection] mode and set the author");
    println!(
        "  3. Preview with: commitsync --config {} log",
        output.display()
    );
    println!("  4. Set [copy] enabled = true and run: commitsync run");
    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let config =
        SyncConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  {}", style::success("TOML structure is valid"));

    match config.validate() {
        Ok(()) => println!("  {}", style::success("All required fields are valid")),
        Err(e) => {
            println!("  {}", style::error(&format!("Validation error: {}", e)));
            anyhow::bail!("configuration validation failed");
        }
    }

    if !config.paths.source.join(".git").exists() {
        println!(
            "  {}",
            style::warn(&format!(
                "{} does not look like a git working copy",
                config.paths.source.display()
            ))
        );
    }

    println!();
    println!("Configuration summary:");
    println!("  Source        : {}", config.paths.source.display());
    println!("  Destination   : {}", config.paths.destination.display());
    println!("  Mode          : {}", config.selection.mode);
    println!("  Author        : {}", config.selection.author);
    match config.selection.mode {
        SelectionMode::CommitList => {
            println!("  Commits       : {}", config.selection.commits.len())
        }
        SelectionMode::CommitTime => println!(
            "  Since         : {}",
            config.selection.since.as_deref().unwrap_or("")
        ),
    }
    println!(
        "  Copy          : {}",
        if config.copy.enabled {
            "enabled"
        } else {
            "disabled (dry run)"
        }
    );
    Ok(())
}

fn cmd_run(config_path: &Path, dry_run: bool, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    info!(config = %config_path.display(), dry_run, "starting run");
    let mut engine = SyncEngine::new(config);
    if dry_run {
        engine = engine.dry_run();
    }

    let report = engine.run().context("sync run aborted")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        print_report(&report);
    }
    Ok(())
}

fn cmd_log(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let report = SyncEngine::new(config)
        .dry_run()
        .run()
        .context("commit selection failed")?;

    println!("{}", style::header(&format!("Commits ({})", report.policy)));
    println!();
    for record in &report.commits {
        let status = match &record.outcome {
            CommitOutcome::Included { changed, .. } => {
                style::success(&format!("{} file(s)", changed))
            }
            CommitOutcome::Skipped(reason) => style::dim(&format!("skipped: {}", reason)),
        };
        println!(
            "  {} {} {} {}",
            style::sha(&record.sha),
            record.authored_at.format("%Y-%m-%d %H:%M"),
            record.summary,
            status
        );
    }
    println!();
    println!("{} file(s) would be synced", report.sync_set.len());
    Ok(())
}

fn print_report(report: &SyncReport) {
    println!("{}", style::header("Sync run"));
    println!("  Policy        : {}", report.policy);
    println!(
        "  Commits       : {} selected, {} synced, {} other author, {} merge",
        report.selected, report.included, report.skipped_author, report.skipped_merge
    );
    println!("  Files         : {}", report.sync_set.len());

    match &report.copy {
        None => {
            println!();
            println!("{}", style::dim("Copy disabled; files that would be copied:"));
            for path in report.sync_set.iter() {
                println!("  {}", path);
            }
        }
        Some(copy) => {
            println!(
                "  Copied        : {} ({} bytes)",
                copy.copied.len(),
                copy.bytes_copied
            );
            for path in &copy.missing {
                println!("  {}", style::warn(&format!("missing in source: {}", path)));
            }
            for failed in &copy.failed {
                println!(
                    "  {}",
                    style::error(&format!("{}: {}", failed.path, failed.error))
                );
            }
        }
    }

    if let Some(done) = report.completed_at {
        let elapsed = done - report.started_at;
        println!();
        println!(
            "{}",
            style::success(&format!(
                "Completed in {} ms",
                elapsed.num_milliseconds()
            ))
        );
    }
}
