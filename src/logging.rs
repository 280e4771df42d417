//! Tracing configuration and log routing.
//!
//! The server logs to stdout using a compact formatter. When `PLANWRIGHT_LOG_FILE` is set, logs
//! are additionally appended to that path through a non-blocking writer.
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_ENV: &str = "PLANWRIGHT_LOG_FILE";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and optional file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Keeps the non-blocking writer guard alive for the process lifetime.
/// - Safe to call repeatedly; only the first call installs a subscriber.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    let result = if let Some(writer) = configure_file_writer() {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).try_init()
    } else {
        registry.try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Build a non-blocking writer for file logging when a log path is configured.
fn configure_file_writer() -> Option<NonBlocking> {
    let path = std::env::var(LOG_FILE_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())?;
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            Some(non_blocking)
        }
        Err(err) => {
            eprintln!("Failed to open log file {path}: {err}");
            None
        }
    }
}
