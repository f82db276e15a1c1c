use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Keeps the non-blocking file appender's worker thread alive. Drop this
/// only at process exit — dropping it early silently stops log flushes.
pub struct LoggingGuard {
    _file_guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Install the global tracing subscriber: compact output on stdout plus a
/// JSON-lines event log at `<log_dir>/app.log`.
///
/// `RUST_LOG` overrides the default `info` filter when set.
pub fn init_logging(log_dir: impl AsRef<Path>) -> LoggingGuard {
    let file_appender = tracing_appender::rolling::never(log_dir.as_ref(), "app.log");
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().json().with_writer(non_blocking))
        .init();

    LoggingGuard {
        _file_guard: file_guard,
    }
}
