//! Built-in step modules
//!
//! Each module owns a typed payload. Saved payloads are loaded wholesale and
//! an empty payload resets the module to its defaults.

use groupsetup_core::{CoreError, StepPayload};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub mod authorization;
pub mod billing_setup;
pub mod commission_ack;
pub mod company_info;
pub mod finalize;
pub mod group_structure;
pub mod licensing;
pub mod master_app;
pub mod renewal_period;
pub mod risk_assessment;

/// Yes/no answer as the forms submit it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    /// Affirmative
    Yes,
    /// Negative
    #[default]
    No,
}

impl YesNo {
    /// True for `Yes`
    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }
}

/// Deserialize a saved payload, or fall back to defaults when there is none
pub(crate) fn load_typed<T>(step: &str, payload: &StepPayload) -> Result<T, CoreError>
where
    T: DeserializeOwned + Default,
{
    if payload.is_empty() {
        return Ok(T::default());
    }
    payload.to::<T>().map_err(|e| {
        CoreError::SerializationError(format!("Invalid {} payload: {}", step, e))
    })
}

/// Serialize module state. Plain data structs always serialize, so a failure
/// degrades to an empty payload.
pub(crate) fn to_payload<T: Serialize>(step: &str, data: &T) -> StepPayload {
    match StepPayload::from(data) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(step, error = %e, "Failed to serialize step data");
            StepPayload::empty()
        }
    }
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde(default)]
        name: String,
        #[serde(default)]
        answer: YesNo,
    }

    #[test]
    fn test_load_typed_defaults_on_empty() {
        let sample: Sample = load_typed("sample", &StepPayload::empty()).unwrap();
        assert_eq!(sample, Sample::default());

        let sample: Sample = load_typed("sample", &StepPayload::new(json!(null))).unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_load_typed_reports_step() {
        let err = load_typed::<Sample>("sample", &StepPayload::new(json!({"name": 5}))).unwrap_err();
        match err {
            CoreError::SerializationError(msg) => assert!(msg.starts_with("Invalid sample payload")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_yes_no_wire_format() {
        let sample: Sample =
            load_typed("sample", &StepPayload::new(json!({"answer": "yes"}))).unwrap();
        assert!(sample.answer.is_yes());
        assert_eq!(to_payload("sample", &sample).as_value()["answer"], json!("yes"));
    }
}
