//! Finalize: review of everything entered so far

use groupsetup_core::{
    CoreError, EditRequestSender, StepContext, StepKey, StepModule, StepPayload, StepStatus,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// A reviewed step
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSection {
    pub step_id: StepKey,
    pub status: StepStatus,
    pub has_data: bool,
}

#[derive(Debug, Default)]
pub struct FinalizeStep {
    sections: Vec<ReviewSection>,
    commission_signed: bool,
    edit_requests: Option<EditRequestSender>,
}

impl FinalizeStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps under review, in key order, excluding this one
    pub fn sections(&self) -> &[ReviewSection] {
        &self.sections
    }

    /// Ask to jump back to a step. Returns false when nobody is listening.
    pub fn request_edit(&self, step_id: &str) -> bool {
        let Some(sender) = &self.edit_requests else {
            warn!(step_id, "Edit requested before the review was attached");
            return false;
        };
        debug!(step_id, "Requesting edit");
        sender.send(StepKey::from(step_id)).is_ok()
    }
}

fn commission_signed(context: &StepContext) -> bool {
    if context.status("commission_ack") != Some(StepStatus::Completed) {
        return false;
    }
    let Some(data) = context.data("commission_ack") else {
        return false;
    };
    let signed = data
        .get_path(&["terms", "e_signature"])
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let accepted_by = data
        .get_path(&["terms", "accepted_by"])
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    signed && accepted_by
}

impl StepModule for FinalizeStep {
    fn get_data(&self) -> StepPayload {
        StepPayload::new(json!({ "reviewed": true }))
    }

    fn load(&mut self, _payload: &StepPayload) -> Result<(), CoreError> {
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.commission_signed
    }

    fn validation_errors(&self) -> Vec<String> {
        if self.commission_signed {
            Vec::new()
        } else {
            vec!["Commission Agreement must be completed and signed before finalizing.".to_string()]
        }
    }

    fn attach_context(&mut self, context: &StepContext) {
        self.commission_signed = commission_signed(context);
        self.sections = context
            .iter()
            .filter(|(key, _)| key.0 != "finalize")
            .map(|(key, (status, data))| ReviewSection {
                step_id: key.clone(),
                status: *status,
                has_data: !data.is_empty(),
            })
            .collect();
    }

    fn attach_edit_requests(&mut self, sender: EditRequestSender) {
        self.edit_requests = Some(sender);
    }
}
