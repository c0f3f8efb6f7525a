use crate::error::ConfigError;
use crate::settings::LoggingSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber: human-readable output on stderr plus an
/// append-only log file under `settings.dir`.
///
/// `RUST_LOG` wins over `settings.level` when it is set. The returned guard
/// must be held until exit, otherwise buffered file lines are dropped.
pub fn init_tracing(settings: &LoggingSettings) -> Result<WorkerGuard, ConfigError> {
    std::fs::create_dir_all(&settings.dir)?;

    let file_appender = tracing_appender::rolling::never(&settings.dir, &settings.file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_timer(LocalTime::rfc_3339()),
        )
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    Ok(guard)
}
