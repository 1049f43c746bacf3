//! Logging Setup
//!
//! Installs a `tracing` subscriber with two layers: a JSON file layer rolling
//! daily in the configured log directory, and a pretty stdout layer.
//! `RUST_LOG` overrides the configured level. Records emitted through the
//! `log` facade are bridged into `tracing`.

use std::fs;
use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::IngestConfig;

const LOG_FILE: &str = "compendium-ingest.log";

/// Initialize logging. Keep the returned guard alive for the life of the
/// process; dropping it stops the file writer.
pub fn init(config: &IngestConfig) -> WorkerGuard {
    let log_dir = config.log_dir();
    if config.logging.json_file && !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    // Rolling - Daily
    let (non_blocking, guard) = if config.logging.json_file {
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, LOG_FILE))
    } else {
        tracing_appender::non_blocking(io::sink())
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    // File Layer: JSON format for easy parsing/ingestion
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter.clone());

    // Stdout Layer: Pretty human-readable format with colors
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .pretty()
        .with_filter(env_filter);

    if let Err(e) = tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
    {
        eprintln!("Failed to initialize tracing subscriber: {}", e);
    }

    // Redirect standard `log` macros to `tracing`
    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!("LogTracer already installed: {}", e);
    }

    if config.logging.json_file {
        log::info!(
            "Logging initialized. Writing to: {:?} (daily rolling)",
            log_dir.join(LOG_FILE)
        );
    }

    guard
}
