//! File-based logging.
//!
//! The TUI owns the terminal, so `tracing` output goes to a daily rolling
//! file under the state directory instead of stderr.

use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Settings;

const LOG_FILE_PREFIX: &str = "encore";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured filter. The returned guard flushes
/// buffered lines when dropped and must live as long as the program. `None`
/// means logging is off because no log directory could be used.
pub fn init(settings: &Settings) -> Option<WorkerGuard> {
    let log_dir = settings.log_dir()?;
    if fs::create_dir_all(&log_dir).is_err() {
        return None;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("encore=info,warn"));

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true);

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        return None;
    }

    tracing::info!(dir = %log_dir.display(), "logging initialized");
    Some(guard)
}
