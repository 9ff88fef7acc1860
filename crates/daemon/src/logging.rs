//! Subscriber setup: console in pretty or JSON form, plus an optional daily log file

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

pub const LOG_FORMAT_ENV: &str = "FACEBATCH_LOG_FORMAT";
pub const LOG_DIR_ENV: &str = "FACEBATCH_LOG_DIR";
const DEFAULT_FILTER: &str = "facebatch=info";
const LOG_FILE_PREFIX: &str = "facebatchd.log";

/// Keeps the file writer flushing; hold it until the process exits
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init(json: bool, log_dir: Option<&Path>) -> anyhow::Result<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().pretty().boxed()
    });

    let file_guard = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(fmt::layer().json().with_writer(writer).with_ansi(false).boxed());
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry().with(layers).with(env_filter).init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
