//! Logging and tracing configuration
//!
//! The runner logs step progress to stdout. An optional log file receives
//! the same events without ANSI colors, written through a non-blocking
//! appender whose guard must outlive the run.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "reqchain=info,warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize tracing for the CLI (stdout logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_cli() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing to stdout plus a log file
///
/// Returns the appender guard; dropping it flushes and closes the file.
/// Falls back to stdout-only logging if the file's directory is unusable.
pub fn init_with_file(log_file: &Path) -> Option<WorkerGuard> {
    let dir = log_file.parent().filter(|d| !d.as_os_str().is_empty());
    let file_name = match log_file.file_name() {
        Some(name) => name.to_owned(),
        None => {
            eprintln!("Warning: invalid log file path {}", log_file.display());
            init_cli();
            return None;
        }
    };

    let dir = dir.unwrap_or_else(|| Path::new("."));
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        init_cli();
        return None;
    }

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Some(guard)
}
