//! Logging setup: rolling files plus a console layer, JSON in production.

pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::CONFIG;

pub const LOG_DIR: &str = "logs";

/// Filter used when `RUST_LOG` is not set.
fn default_filter(log_level: &str) -> String {
    format!("linkmy_backend={log_level},tower_http=debug,axum=info")
}

/// Install the global subscriber. The returned guards flush the background
/// writers and must live as long as the process.
pub fn init() -> Vec<WorkerGuard> {
    let is_production = CONFIG.is_production();

    if let Err(e) = std::fs::create_dir_all(LOG_DIR) {
        eprintln!("Could not create log directory {LOG_DIR}: {e}");
    }

    let (file_writer, file_guard) = non_blocking(rolling::daily(LOG_DIR, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(LOG_DIR, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| if is_production { "info" } else { "debug" }.to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&log_level)));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if is_production {
        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    } else {
        let error_layer = fmt::layer()
            .with_writer(error_writer)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    }

    tracing::info!("Logging initialized for {} environment", CONFIG.environment);

    vec![file_guard, error_guard, console_guard]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_targets_crate() {
        let filter = default_filter("warn");
        assert!(filter.starts_with("linkmy_backend=warn"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }
}
