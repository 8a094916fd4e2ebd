//! Diagnostic log: a file under the XDG state dir, or stderr when that is unavailable.
//!
//! Every user notice is mirrored here (see [`crate::feedback::emit`]), so the
//! log is the durable record of what the user was told.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,pagedrop=debug,pagedrop_core=debug";

/// Where log lines end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `~/.local/state/pagedrop/pagedrop.log`, with the directory created.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pagedrop")?;
    let log_dir = xdg_dirs.get_state_home().join("pagedrop");
    fs::create_dir_all(&log_dir).with_context(|| format!("create {}", log_dir.display()))?;
    Ok(log_dir.join("pagedrop.log"))
}

/// Installs the global subscriber writing to [`log_file_path`].
/// Returns Err when the file cannot be opened so the caller can fall back to stderr.
pub fn init_logging() -> Result<PathBuf> {
    let path = log_file_path()?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))?;

    tracing::info!("pagedrop logging initialized at {}", path.display());
    Ok(path)
}

/// Stderr-only logging. Never fails; a subscriber that is already installed is kept.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

/// File logging with stderr fallback. Hosts call this once at startup.
pub fn init() -> LogTarget {
    match init_logging() {
        Ok(path) => LogTarget::File(path),
        Err(err) => {
            init_logging_stderr();
            tracing::warn!("log file unavailable, logging to stderr: {:#}", err);
            LogTarget::Stderr
        }
    }
}
