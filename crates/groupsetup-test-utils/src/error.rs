use groupsetup_core::CoreError;
use thiserror::Error;

/// Errors raised by the test harness
#[derive(Debug, Error)]
pub enum TestError {
    /// An engine call produced an outcome the harness cannot continue from
    #[error("Unexpected outcome at {step}: {outcome}")]
    UnexpectedOutcome { step: String, outcome: String },

    /// No step module is active
    #[error("No active step")]
    NoActiveStep,

    /// No sample payload exists for the step
    #[error("No sample data for step: {0}")]
    NoSampleData(String),

    /// Engine error
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TestError {
    pub(crate) fn unexpected(step: &str, outcome: impl std::fmt::Debug) -> Self {
        TestError::UnexpectedOutcome {
            step: step.to_string(),
            outcome: format!("{:?}", outcome),
        }
    }
}
