//! Collaborator traits for the Group Setup engine
//!
//! The engine talks to persistence only through these traits. External
//! crates implement them to provide an actual backend; errors are reported
//! as [`CoreError::Persistence`] and may carry a recovery hint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::document::{Document, DocumentContent, DocumentId, DocumentUpload};
use super::workflow_instance::{EntityId, StepKey, WorkflowInstance, WorkflowInstanceId};
use crate::{CoreError, EntityRecord, HandoffReceipt, StepPayload};

/// How a group setup is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupMode {
    /// Guided step-by-step navigation
    Online,
    /// Paper packet upload
    Offline,
}

/// Response of a step completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteStepResponse {
    /// The completed step
    pub step_id: StepKey,
    /// Server designated next step; `None` means the last step was completed
    #[serde(default)]
    pub next_step_id: Option<StepKey>,
}

/// Payload handed to collaborators after a successful submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    /// The submitted workflow
    pub workflow_instance_id: WorkflowInstanceId,
    /// The enrolling entity
    pub entity_id: EntityId,
    /// Assigned group number
    pub group_number: String,
    /// Coverage effective date, when captured
    #[serde(default)]
    pub effective_date: Option<String>,
    /// Class names from the group structure
    #[serde(default)]
    pub classes: Vec<String>,
    /// Department names from the group structure
    #[serde(default)]
    pub departments: Vec<String>,
    /// Final data of every step, keyed by step id
    #[serde(default)]
    pub step_data: BTreeMap<String, serde_json::Value>,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
}

/// Persistence collaborator for workflow instances
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Load the active workflow for an entity
    async fn load_workflow(&self, entity_id: &EntityId) -> Result<WorkflowInstance, CoreError>;

    /// Load the entity record
    async fn load_entity(&self, entity_id: &EntityId) -> Result<EntityRecord, CoreError>;

    /// Create and start the workflow for an entity
    async fn start_setup(
        &self,
        entity_id: &EntityId,
        mode: SetupMode,
    ) -> Result<WorkflowInstance, CoreError>;

    /// Replace a step's data
    async fn save_step_data(
        &self,
        entity_id: &EntityId,
        step_id: &StepKey,
        payload: StepPayload,
    ) -> Result<(), CoreError>;

    /// Mark a step completed
    async fn complete_step(
        &self,
        entity_id: &EntityId,
        step_id: &StepKey,
    ) -> Result<CompleteStepResponse, CoreError>;

    /// Mark a step skipped
    async fn skip_step(&self, entity_id: &EntityId, step_id: &StepKey) -> Result<(), CoreError>;

    /// Submit the workflow downstream
    async fn submit_workflow(&self, entity_id: &EntityId) -> Result<SubmissionPayload, CoreError>;

    /// Notify the employer that steps await their action
    async fn request_handoff(&self, entity_id: &EntityId) -> Result<HandoffReceipt, CoreError>;

    /// Mark the offline packet as submitted
    async fn submit_offline_packet(
        &self,
        entity_id: &EntityId,
    ) -> Result<WorkflowInstance, CoreError>;
}

/// Key/value document service
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// List the documents of an entity
    async fn list_documents(&self, entity_id: &EntityId) -> Result<Vec<Document>, CoreError>;

    /// Store a document
    async fn upload(
        &self,
        entity_id: &EntityId,
        upload: DocumentUpload,
    ) -> Result<Document, CoreError>;

    /// Delete a document
    async fn delete(&self, entity_id: &EntityId, document_id: &DocumentId)
        -> Result<(), CoreError>;

    /// Fetch a document with its content
    async fn download(
        &self,
        entity_id: &EntityId,
        document_id: &DocumentId,
    ) -> Result<DocumentContent, CoreError>;
}
