use thiserror::Error;

/// Core error type for the Group Setup engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Workflow instance not found
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    /// Workflow definition not found
    #[error("Workflow definition not found: {0}")]
    WorkflowDefinitionNotFound(String),

    /// Step instance not found
    #[error("Step not found: {0}")]
    StepNotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A status transition the lifecycle does not allow
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// A persistence collaborator rejected the request or was unreachable
    #[error("Persistence error during {operation}: {message}")]
    Persistence {
        /// The collaborator operation that failed, e.g. `save_step_data`
        operation: String,
        /// Collaborator supplied message
        message: String,
        /// User-facing remediation text, shown verbatim when present
        recovery_hint: Option<String>,
    },

    /// Step module could not be resolved
    #[error("Module resolution error: {0}")]
    ModuleResolution(String),

    /// Acting role is not permitted on the step
    #[error("Role restricted: {0}")]
    RoleRestricted(String),

    /// Workflow has already been submitted
    #[error("Workflow already submitted: {0}")]
    WorkflowSubmitted(String),

    /// Document service error
    #[error("Document error: {0}")]
    DocumentError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Build a persistence error for the given collaborator operation
    pub fn persistence(operation: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Persistence {
            operation: operation.into(),
            message: message.into(),
            recovery_hint: None,
        }
    }

    /// Attach a recovery hint. Only persistence errors carry one; other variants are returned unchanged.
    pub fn with_recovery_hint(self, hint: impl Into<String>) -> Self {
        match self {
            CoreError::Persistence {
                operation, message, ..
            } => CoreError::Persistence {
                operation,
                message,
                recovery_hint: Some(hint.into()),
            },
            other => other,
        }
    }

    /// The recovery hint, if the collaborator supplied one
    pub fn recovery_hint(&self) -> Option<&str> {
        match self {
            CoreError::Persistence {
                recovery_hint: Some(hint),
                ..
            } if !hint.trim().is_empty() => Some(hint.as_str()),
            _ => None,
        }
    }

    /// Message to show the user: the recovery hint when present, else `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        self.recovery_hint()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::ConfigurationError(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}
