//! Logging configuration using the tracing ecosystem.
//!
//! The demo owns the terminal, so log output goes to a daily-rotated file
//! instead of stderr. Engine internals log under the `combokit::engine`
//! target: state transitions at `debug`, key and debounce decisions at
//! `trace`, recoverable problems at `warn`.

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log level if RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "combokit=info,warn";

/// Filter used when verbose logging is requested on the command line.
const VERBOSE_LOG_FILTER: &str = "combokit=trace,info";

/// File name prefix for rotated log files.
const LOG_FILE_PREFIX: &str = "combokit.log";

/// Logging options chosen on the command line.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Override for the log directory.
    pub dir: Option<PathBuf>,
    /// Log every engine decision.
    pub verbose: bool,
}

/// Initialize the logging system.
///
/// `RUST_LOG` wins over `verbose`. Without a directory override, logs go to
/// the platform local data directory:
/// - Linux: `~/.local/share/combokit/logs/`
/// - macOS: `~/Library/Application Support/combokit/logs/`
/// - Windows: `C:\Users\<User>\AppData\Local\combokit\logs\`
///
/// # Errors
///
/// Returns an error if the log directory cannot be determined or created,
/// or if a global subscriber is already installed.
pub fn init(options: &LogOptions) -> anyhow::Result<PathBuf> {
    let log_dir = match &options.dir {
        Some(dir) => dir.clone(),
        None => default_log_directory()?,
    };
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(options.verbose)));

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Combokit starting up");
    tracing::debug!(log_dir = %log_dir.display(), "Log directory");

    Ok(log_dir)
}

/// Log application shutdown.
pub fn shutdown(log_dir: &Path) {
    tracing::info!(log_dir = %log_dir.display(), "Combokit shutting down");
}

fn filter_directive(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    }
}

fn default_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("combokit").join("logs"))
}
