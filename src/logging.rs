use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing into a daily log file under `log_dir`.
///
/// The terminal belongs to the UI, so nothing is written to stdout/stderr.
/// Default level: INFO (DEBUG for this crate), override via RUST_LOG.
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(log_dir, "sidechat.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sidechat=debug"));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(dir = %log_dir.display(), "Tracing initialized");
    Ok(guard)
}
