//! Subscriber setup for the simulator binary.

use std::fs;

use anyhow::Result;
use runtime::RuntimeConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_FILE: &str = "encounter-sim.log";

/// Logs to stderr, plus a log file when the config asks for one.
///
/// The returned guard flushes the file writer on drop; keep it alive until
/// the process exits.
pub fn setup_logging(config: &RuntimeConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(log_dir) = config.resolved_log_dir() else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    };

    fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::info!("Log file: {}", log_dir.join(LOG_FILE).display());
    Ok(Some(guard))
}
