//! Logging setup for Group Setup binaries and test suites.

use groupsetup_core::LoggingSettings;
use serde::{Deserialize, Serialize};

pub mod logging;

pub use logging::{build_filter, init_logging, init_test_tracing, LogExt};

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup log line
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info,groupsetup=debug")
    pub log_filter: String,
    /// Emit JSON lines instead of pretty output
    pub enable_json_logging: bool,
}

impl MonitoringConfig {
    /// Build from the engine's logging settings
    pub fn from_settings(service_name: &str, settings: &LoggingSettings) -> Self {
        Self {
            service_name: service_name.to_string(),
            log_filter: settings.filter.clone(),
            enable_json_logging: settings.json,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self::from_settings("groupsetup", &LoggingSettings::default())
    }
}
