//! File logging via `tracing`.
//!
//! The terminal belongs to the UI, so records go to a file. `RUST_LOG`
//! overrides the configured level.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LoggingSettings, default_log_path};

/// Where log records for `settings` are written.
pub fn log_path(settings: &LoggingSettings) -> Option<PathBuf> {
    settings.file.clone().or_else(default_log_path)
}

fn filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init(settings: &LoggingSettings) -> Result<(), Box<dyn std::error::Error>> {
    let path = log_path(settings).ok_or("no location for the log file")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(settings))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| e as Box<dyn std::error::Error>)?;

    tracing::info!(path = %path.display(), "logging started");
    Ok(())
}
