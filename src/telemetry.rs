//! Tracing setup shared by both binaries.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "edit_stream_monitor=info,warn";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn json_requested() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Compact (or json, with `LOG_FORMAT=json`) logs on stderr.
pub fn init_stderr() {
    let registry = tracing_subscriber::registry().with(filter());
    if json_requested() {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

/// Logs appended to `path`, for processes that own the terminal.
pub fn init_file(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let registry = tracing_subscriber::registry().with(filter());
    if json_requested() {
        registry
            .with(fmt::layer().json().with_ansi(false).with_writer(Mutex::new(file)))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_ansi(false).with_writer(Mutex::new(file)))
            .init();
    }
    Ok(())
}
