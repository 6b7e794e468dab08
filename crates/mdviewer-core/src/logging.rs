//! File logging for the markdown viewer
//!
//! Stdout carries headless NDJSON, so diagnostics only ever go to a daily
//! rotated file. The filter comes from `MDVIEWER_LOG` (same syntax as
//! `RUST_LOG`), e.g. `MDVIEWER_LOG=mdviewer_app=debug`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "MDVIEWER_LOG";

/// Base name of the rotated log files
pub const LOG_FILE_PREFIX: &str = "mdviewer.log";

const DEFAULT_FILTER: &str = "mdviewer=info,mdviewer_app=info,warn";

/// Install the global subscriber writing to `log_dir`.
///
/// Writes happen on a background thread; keep the returned guard alive until
/// exit or buffered lines are lost.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter_from_env())
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new("%H:%M:%S%.3f".to_string())),
        )
        .init();

    tracing::info!("Logging to {}", log_dir.join(LOG_FILE_PREFIX).display());
    Ok(guard)
}

fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
