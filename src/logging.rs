//! Tracing setup for the binaries: `RUST_LOG` filter, text or JSON lines,
//! written through a non-blocking daily log file in the data directory.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, LogFormat};

/// Keep the returned guard alive for the whole process or buffered lines are lost.
pub fn init(config: &Config, file_prefix: &str) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.data_dir)?;
    let appender = tracing_appender::rolling::daily(config.data_dir.join("logs"), file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init()?,
        LogFormat::Text => registry
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .try_init()?,
    }
    Ok(guard)
}
