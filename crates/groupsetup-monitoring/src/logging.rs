//! Structured logging using tracing.
//!
//! JSON output is meant for log aggregation, pretty output for local runs.

use anyhow::Context;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::MonitoringConfig;

/// Filter from `RUST_LOG`, falling back to the configured directive
pub fn build_filter(config: &MonitoringConfig) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .with_context(|| format!("Invalid log filter: {}", config.log_filter)),
    }
}

/// Initialize structured logging as the global default
pub fn init_logging(config: &MonitoringConfig) -> anyhow::Result<()> {
    let env_filter = build_filter(config)?;

    let json_layer = config.enable_json_logging.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });
    let pretty_layer = (!config.enable_json_logging).then(|| {
        fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;

    info!(
        service_name = %config.service_name,
        log_format = if config.enable_json_logging { "json" } else { "pretty" },
        "Logging initialized"
    );

    Ok(())
}

/// Log the outcome of a fallible operation without consuming it
pub trait LogExt<T, E> {
    /// Log an error together with the failed operation
    fn log_failure(self, operation: &str) -> Result<T, E>;

    /// Log a successful operation at debug level
    fn log_done(self, operation: &str) -> Result<T, E>;
}

impl<T, E: std::fmt::Display> LogExt<T, E> for Result<T, E> {
    fn log_failure(self, operation: &str) -> Result<T, E> {
        if let Err(e) = &self {
            error!(operation, error = %e, "Operation failed");
        }
        self
    }

    fn log_done(self, operation: &str) -> Result<T, E> {
        if self.is_ok() {
            debug!(operation, "Operation completed");
        }
        self
    }
}

/// Test writer subscriber; safe to call from every test
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_target(false)
        .with_test_writer()
        .try_init();
}
