//! Authorization: employer acknowledgements and the final signature
//!
//! Errors are prefixed with the section they belong to. Inline errors stay
//! hidden until the forms are touched, which the orchestrator does before
//! reporting a failed completion.

use super::{is_blank, load_typed, to_payload, YesNo};
use groupsetup_core::{CoreError, DocumentGate, StepModule, StepPayload};
use serde::{Deserialize, Serialize};

const STEP: &str = "authorization";

/// Gate key of the privacy notice document
pub const PRIVACY_NOTICE: &str = "privacy_notice";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentDelivery {
    Electronic,
    Paper,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlineAccess {
    pub broker_online_access: Option<YesNo>,
    pub document_delivery: Option<DocumentDelivery>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyNotice {
    pub privacy_notice_acknowledged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hipaa {
    pub phi_access: Option<YesNo>,
    pub claims_access_option: Option<String>,
    pub hipaa_terms_accepted: bool,
    pub esign_first_name: String,
    pub esign_last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalSignature {
    pub accepted_by: String,
    pub title: String,
    pub terms_accepted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationData {
    pub online_access: OnlineAccess,
    pub privacy_notice: PrivacyNotice,
    pub hipaa: Hipaa,
    pub final_signature: FinalSignature,
    pub documents_opened: DocumentGate,
}

#[derive(Debug, Default)]
pub struct AuthorizationStep {
    data: AuthorizationData,
    touched: bool,
}

impl AuthorizationStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn online_access_mut(&mut self) -> &mut OnlineAccess {
        &mut self.data.online_access
    }

    pub fn hipaa_mut(&mut self) -> &mut Hipaa {
        &mut self.data.hipaa
    }

    pub fn final_signature_mut(&mut self) -> &mut FinalSignature {
        &mut self.data.final_signature
    }

    pub fn open_privacy_notice(&mut self) {
        self.data.documents_opened.open(PRIVACY_NOTICE);
    }

    /// Acknowledge the privacy notice; it must have been opened first
    pub fn acknowledge_privacy_notice(&mut self) -> Result<(), CoreError> {
        self.data.documents_opened.require_open(PRIVACY_NOTICE)?;
        self.data.privacy_notice.privacy_notice_acknowledged = true;
        Ok(())
    }

    /// Errors shown inline next to the forms
    pub fn visible_errors(&self) -> Vec<String> {
        if self.touched {
            self.validation_errors()
        } else {
            Vec::new()
        }
    }
}

impl StepModule for AuthorizationStep {
    fn get_data(&self) -> StepPayload {
        to_payload(STEP, &self.data)
    }

    fn load(&mut self, payload: &StepPayload) -> Result<(), CoreError> {
        self.data = load_typed(STEP, payload)?;
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    fn validation_errors(&self) -> Vec<String> {
        let d = &self.data;
        let mut errors = Vec::new();

        if d.online_access.broker_online_access.is_none() {
            errors.push("Online Access: broker online access selection is required.".to_string());
        }
        if d.online_access.document_delivery.is_none() {
            errors.push("Online Access: document delivery preference is required.".to_string());
        }

        if !d.privacy_notice.privacy_notice_acknowledged {
            errors.push("Privacy Notice: acknowledgement is required.".to_string());
        }

        match d.hipaa.phi_access {
            None => errors.push("HIPAA: PHI access selection is required.".to_string()),
            Some(YesNo::Yes)
                if d.hipaa
                    .claims_access_option
                    .as_deref()
                    .map_or(true, is_blank) =>
            {
                errors.push("HIPAA: claims access option selection is required.".to_string())
            }
            Some(_) => {}
        }
        if !d.hipaa.hipaa_terms_accepted {
            errors.push("HIPAA: terms acceptance is required.".to_string());
        }
        if is_blank(&d.hipaa.esign_first_name) {
            errors.push("HIPAA: first name is required.".to_string());
        }
        if is_blank(&d.hipaa.esign_last_name) {
            errors.push("HIPAA: last name is required.".to_string());
        }

        if is_blank(&d.final_signature.accepted_by) {
            errors.push("Final Signature: signer name is required.".to_string());
        }
        if is_blank(&d.final_signature.title) {
            errors.push("Final Signature: title is required.".to_string());
        }
        if !d.final_signature.terms_accepted {
            errors.push("Final Signature: terms must be accepted.".to_string());
        }

        errors
    }

    fn mark_forms_as_touched(&mut self) {
        self.touched = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn complete(step: &mut AuthorizationStep) {
        *step.online_access_mut() = OnlineAccess {
            broker_online_access: Some(YesNo::Yes),
            document_delivery: Some(DocumentDelivery::Electronic),
        };
        step.open_privacy_notice();
        step.acknowledge_privacy_notice().unwrap();
        *step.hipaa_mut() = Hipaa {
            phi_access: Some(YesNo::No),
            claims_access_option: None,
            hipaa_terms_accepted: true,
            esign_first_name: "Jane".to_string(),
            esign_last_name: "Employer".to_string(),
        };
        *step.final_signature_mut() = FinalSignature {
            accepted_by: "Jane Employer".to_string(),
            title: "CFO".to_string(),
            terms_accepted: true,
        };
    }

    #[test]
    fn test_errors_are_sectioned() {
        let step = AuthorizationStep::new();
        let errors = step.validation_errors();
        assert_eq!(errors.len(), 10);
        for prefix in ["Online Access:", "Privacy Notice:", "HIPAA:", "Final Signature:"] {
            assert!(errors.iter().any(|e| e.starts_with(prefix)), "missing {prefix}");
        }
    }

    #[test]
    fn test_privacy_notice_gated_on_opening() {
        let mut step = AuthorizationStep::new();
        assert!(step.acknowledge_privacy_notice().is_err());
        step.open_privacy_notice();
        step.acknowledge_privacy_notice().unwrap();
        assert!(!step
            .validation_errors()
            .iter()
            .any(|e| e.starts_with("Privacy Notice:")));
    }

    #[test]
    fn test_phi_access_needs_claims_option() {
        let mut step = AuthorizationStep::new();
        complete(&mut step);
        assert!(step.is_valid());

        step.hipaa_mut().phi_access = Some(YesNo::Yes);
        assert_eq!(
            step.validation_errors(),
            vec!["HIPAA: claims access option selection is required.".to_string()]
        );
    }

    #[test]
    fn test_inline_errors_hidden_until_touched() {
        let mut step = AuthorizationStep::new();
        assert!(step.visible_errors().is_empty());
        step.mark_forms_as_touched();
        assert_eq!(step.visible_errors(), step.validation_errors());
    }

    #[test]
    fn test_round_trip_keeps_gate() {
        let mut step = AuthorizationStep::new();
        complete(&mut step);
        let payload = step.get_data();
        assert_eq!(
            payload.get_path(&["documents_opened", "privacy_notice"]),
            Some(&json!(true))
        );

        let mut restored = AuthorizationStep::new();
        restored.load(&payload).unwrap();
        assert!(restored.is_valid());
    }
}
