//! The contract every step module satisfies
//!
//! The orchestrator treats each step as a data extractor, a validator and an
//! error reporter; it never looks inside the payload.

use crate::domain::workflow_instance::{StepKey, StepStatus, WorkflowInstance};
use crate::{CoreError, StepPayload};
use std::collections::BTreeMap;
use tokio::sync::mpsc;

/// Channel a step uses to ask the orchestrator to navigate elsewhere
pub type EditRequestSender = mpsc::UnboundedSender<StepKey>;

/// Read-only view of the other steps, handed to a module when it is activated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepContext {
    entries: BTreeMap<StepKey, (StepStatus, StepPayload)>,
}

impl StepContext {
    /// Snapshot the status and data of every step of a workflow
    pub fn from_workflow(workflow: &WorkflowInstance) -> Self {
        let entries = workflow
            .steps
            .iter()
            .map(|s| (s.step_id.clone(), (s.status, s.data.clone())))
            .collect();
        Self { entries }
    }

    /// Add or replace one entry
    pub fn with_step(mut self, key: &str, status: StepStatus, data: StepPayload) -> Self {
        self.entries.insert(StepKey::from(key), (status, data));
        self
    }

    /// Data of another step, if present
    pub fn data(&self, key: &str) -> Option<&StepPayload> {
        self.entries.get(&StepKey::from(key)).map(|(_, data)| data)
    }

    /// Status of another step, if present
    pub fn status(&self, key: &str) -> Option<StepStatus> {
        self.entries.get(&StepKey::from(key)).map(|(status, _)| *status)
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&StepKey, &(StepStatus, StepPayload))> {
        self.entries.iter()
    }
}

/// A step module
pub trait StepModule: Send + Sync {
    /// Serialize the current editable state. Never fails; no data yields an empty object.
    fn get_data(&self) -> StepPayload;

    /// Feed a previously saved payload back into the editable state
    fn load(&mut self, payload: &StepPayload) -> Result<(), CoreError>;

    /// Cheap, side-effect free validity check
    fn is_valid(&self) -> bool;

    /// Section-prefixed reasons the step is invalid. Empty means the
    /// orchestrator falls back to a generic message.
    fn validation_errors(&self) -> Vec<String> {
        Vec::new()
    }

    /// Reveal deferred inline validation
    fn mark_forms_as_touched(&mut self) {}

    /// Receive the other steps' data on activation
    fn attach_context(&mut self, _context: &StepContext) {}

    /// Subscribe the orchestrator to edit-step requests. Modules that never emit one ignore it.
    fn attach_edit_requests(&mut self, _sender: EditRequestSender) {}
}
