//! Tracing setup for the `shiptrack` binary.
//!
//! Logs go to stderr so stdout stays clean for rendered output. When
//! `SHIPTRACK_LOG_DIR` is set, a daily-rolling plain-text copy is written
//! there as well; the returned guard must live until exit or buffered lines
//! are lost.

use std::env;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEBUG_ENV: &str = "SHIPTRACK_DEBUG_LOG";
const LOG_DIR_ENV: &str = "SHIPTRACK_LOG_DIR";
const LOG_FILE_PREFIX: &str = "shiptrack.log";

pub fn init() -> Option<WorkerGuard> {
    let registry = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(std::io::stderr));

    match log_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_timer(UtcTime::rfc_3339())
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

fn filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

fn log_dir() -> Option<PathBuf> {
    env::var_os(LOG_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
