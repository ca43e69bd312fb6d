//! Logging bootstrap driven by `ECSS_LOG_LEVEL`/`ECSS_LOG_FOLDER` (spec §6).
//!
//! stdout always receives logs; when `LOG_FOLDER` is set, a daily-rolling
//! file appender receives them too. Matches the teacher's
//! `tracing_subscriber::fmt()` + `EnvFilter` bootstrap, widened to cover
//! the dual-sink case.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Holds the background flush thread for the file appender, if any. Drop
/// this only at process exit — dropping it early stops file logging
/// silently.
pub struct LoggingGuard(#[allow(dead_code)] Option<tracing_appender::non_blocking::WorkerGuard>);

/// Initialize the global `tracing` subscriber. Returns a guard that must
/// be held for the process lifetime when file logging is enabled.
pub fn init(config: &LogConfig) -> LoggingGuard {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    match &config.folder {
        Some(folder) => {
            let appender = tracing_appender::rolling::daily(folder, "ecss-scheduler.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking);

            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();

            LoggingGuard(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stdout_layer).init();
            LoggingGuard(None)
        }
    }
}
