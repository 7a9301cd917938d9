//! Master Application: employer signature and submission confirmation
//!
//! The step is complete once the signed application has been submitted. The
//! confirmation shown afterwards is assembled from the other steps' data.

use super::{is_blank, load_typed, to_payload};
use groupsetup_core::{CoreError, StepContext, StepModule, StepPayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const STEP: &str = "master_app";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterAppSignature {
    pub accepted_by: String,
    pub title: String,
    pub city: String,
    pub state: String,
    pub date: String,
    pub terms_accepted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterAppConfirmation {
    pub group_number: Option<String>,
    pub effective_date: Option<String>,
    pub classes: Vec<String>,
    pub departments: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterAppData {
    pub signature: Option<MasterAppSignature>,
    pub confirmation: Option<MasterAppConfirmation>,
    pub submitted: bool,
}

#[derive(Debug, Default)]
pub struct MasterAppStep {
    data: MasterAppData,
}

fn names(context: &StepContext, list: &str) -> Vec<String> {
    context
        .data("group_structure")
        .and_then(|d| d.get_path(&[list]))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .filter(|name| !is_blank(name))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl MasterAppStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the signature. Submission itself goes through the orchestrator.
    pub fn sign(&mut self, signature: MasterAppSignature) -> Result<(), CoreError> {
        if is_blank(&signature.accepted_by) {
            return Err(CoreError::ValidationError("Signer name is required".to_string()));
        }
        if !signature.terms_accepted {
            return Err(CoreError::ValidationError(
                "The application terms must be accepted".to_string(),
            ));
        }
        self.data.signature = Some(signature);
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        self.data.signature.is_some()
    }

    pub fn is_submitted(&self) -> bool {
        self.data.submitted
    }

    pub fn confirmation(&self) -> Option<&MasterAppConfirmation> {
        self.data.confirmation.as_ref()
    }

    /// Record the group number issued on submission
    pub fn set_group_number(&mut self, group_number: &str) {
        self.data
            .confirmation
            .get_or_insert_with(MasterAppConfirmation::default)
            .group_number = Some(group_number.to_string());
    }
}

impl StepModule for MasterAppStep {
    fn get_data(&self) -> StepPayload {
        to_payload(STEP, &self.data)
    }

    fn load(&mut self, payload: &StepPayload) -> Result<(), CoreError> {
        let confirmation = self.data.confirmation.take();
        self.data = load_typed(STEP, payload)?;
        if self.data.confirmation.is_none() {
            self.data.confirmation = confirmation;
        }
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.data.submitted
    }

    fn validation_errors(&self) -> Vec<String> {
        match (&self.data.signature, self.data.submitted) {
            (_, true) => Vec::new(),
            (None, false) => vec!["Please sign the application before submitting.".to_string()],
            (Some(_), false) => vec!["The signed application has not been submitted.".to_string()],
        }
    }

    fn attach_context(&mut self, context: &StepContext) {
        let group_number = self
            .data
            .confirmation
            .as_ref()
            .and_then(|c| c.group_number.clone());
        self.data.confirmation = Some(MasterAppConfirmation {
            group_number,
            effective_date: context
                .data("company_info")
                .and_then(|d| d.get_path(&["basic", "effective_date"]))
                .and_then(Value::as_str)
                .map(str::to_string),
            classes: names(context, "classes"),
            departments: names(context, "departments"),
        });
    }
}
