//! Logging setup with dual output (stdout + a log file in the app data directory)

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_NAME: &str = "blog_reader.log";

/// Directory the log file is written to, falling back to the working
/// directory when the platform has no data directory.
pub fn log_dir() -> PathBuf {
    dirs_next::data_local_dir()
        .map(|dir| dir.join("blog_reader"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Initialize logging to stdout and the log file.
///
/// Both outputs use the level from the RUST_LOG environment variable and
/// default to "info". Keep the returned guard alive for the program lifetime
/// or buffered file output is lost.
pub fn init_logging() -> Result<WorkerGuard> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stdout_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(stdout_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_is_app_specific() {
        let dir = log_dir();
        assert!(dir.ends_with("blog_reader") || dir == PathBuf::from("."));
    }
}
