//! Engine configuration
//!
//! Loaded from an optional TOML file and `GROUPSETUP__*` environment
//! variables; every field has a default so an empty source is valid.

use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "GROUPSETUP";

/// User-facing notification texts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeMessages {
    /// Explicit save succeeded
    pub save_success: String,
    /// Save request failed
    pub save_failed: String,
    /// Complete request failed
    pub complete_failed: String,
    /// Skip request failed
    pub skip_failed: String,
    /// Workflow load failed
    pub load_failed: String,
    /// Submit request failed
    pub submit_failed: String,
    /// Workflow submitted
    pub submit_success: String,
    /// Handoff request failed
    pub handoff_failed: String,
    /// Fallback when a step reports no specific validation errors
    pub generic_validation: String,
}

impl Default for NoticeMessages {
    fn default() -> Self {
        Self {
            save_success: "Progress saved".to_string(),
            save_failed: "Failed to save".to_string(),
            complete_failed: "Failed to complete step".to_string(),
            skip_failed: "Failed to skip step".to_string(),
            load_failed: "Failed to load workflow".to_string(),
            submit_failed: "Failed to submit workflow".to_string(),
            submit_success: "All steps completed!".to_string(),
            handoff_failed: "Failed to notify the employer".to_string(),
            generic_validation: "Please complete all required fields before continuing."
                .to_string(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Workflow definition the engine drives
    #[serde(default = "default_definition_id")]
    pub workflow_definition_id: String,

    /// Length of the master application countdown
    #[serde(default = "default_countdown_seconds")]
    pub master_app_countdown_seconds: u32,

    /// Countdown tick interval in milliseconds
    #[serde(default = "default_countdown_tick_ms")]
    pub countdown_tick_ms: u64,

    /// Notification texts
    #[serde(default)]
    pub messages: NoticeMessages,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Log output settings, consumed by whatever initializes the subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of pretty output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info,groupsetup=debug".to_string(),
            json: false,
        }
    }
}

fn default_definition_id() -> String {
    crate::domain::workflow_definition::GROUP_SETUP_DEFINITION_ID.to_string()
}

fn default_countdown_seconds() -> u32 {
    90
}

fn default_countdown_tick_ms() -> u64 {
    1000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workflow_definition_id: default_definition_id(),
            master_app_countdown_seconds: default_countdown_seconds(),
            countdown_tick_ms: default_countdown_tick_ms(),
            messages: NoticeMessages::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(path: Option<&str>) -> Result<Self, CoreError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!(path, "Loading engine configuration file");
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.workflow_definition_id.trim().is_empty() {
            return Err(CoreError::ConfigurationError(
                "workflow_definition_id must not be empty".to_string(),
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(CoreError::ConfigurationError(
                "logging.filter must not be empty".to_string(),
            ));
        }
        if self.countdown_tick_ms == 0 {
            return Err(CoreError::ConfigurationError(
                "countdown_tick_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Countdown tick interval
    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }
}
