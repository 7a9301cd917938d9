//!
//! Group Setup Core - workflow orchestration engine for group enrollment
//!
//! This crate defines the domain model of a group setup workflow, the step
//! module contract, the progression and locking rules, and the orchestrator
//! that drives navigation, completion and submission against pluggable
//! persistence collaborators.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - workflow models, step contract and rules
pub mod domain;

/// Application services - store, registry, orchestrator and pipeline
pub mod application;

/// Core types shared by every crate
pub mod types;

/// Error types
pub mod error;

/// Engine configuration
pub mod config;

/// Test doubles for step modules and notifications
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export key types
pub use config::{EngineConfig, LoggingSettings, NoticeMessages};
pub use error::CoreError;
pub use types::{EntityRecord, EntityStatus, HandoffReceipt, Role, StepPayload};

pub use domain::document::{Document, DocumentContent, DocumentId, DocumentType, DocumentUpload};
pub use domain::document_gate::DocumentGate;
pub use domain::progression::{compute_progress, Ownership, StepProgress};
pub use domain::repository::{
    CompleteStepResponse, DocumentRepository, SetupMode, SubmissionPayload, WorkflowRepository,
};
pub use domain::step::{EditRequestSender, StepContext, StepModule};
pub use domain::workflow_definition::{StepDefinition, WorkflowDefinition};
pub use domain::workflow_instance::{
    EntityId, StepInstance, StepInstanceId, StepKey, StepStatus, WorkflowDefinitionId,
    WorkflowInstance, WorkflowInstanceId, WorkflowStatus,
};

pub use application::offline_packet::{OfflinePacketTracker, PacketOverview, PacketStatus};
pub use application::orchestrator::{
    CompleteOutcome, HandoffOutcome, LoadOutcome, MasterAppOutcome, NavigateOutcome, Notifier,
    Orchestrator, OrchestratorState, Refusal, SaveOutcome, SkipOutcome, TracingNotifier,
};
pub use application::prerequisites::{Blocker, PrerequisiteBanner, PrerequisiteRule, PrerequisiteSet};
pub use application::step_registry::{ModuleResolution, StepRegistry};
pub use application::submission::{Countdown, PhaseFailure, PipelinePhase, SubmissionPipeline};
pub use application::workflow_store::{Snapshot, WorkflowStore};

#[cfg(test)]
pub(crate) mod mocks {
    use crate::domain::document::{Document, DocumentContent, DocumentId, DocumentUpload};
    use crate::domain::repository::{
        CompleteStepResponse, DocumentRepository, SetupMode, SubmissionPayload,
        WorkflowRepository,
    };
    use crate::domain::workflow_instance::{EntityId, StepKey, WorkflowInstance};
    use crate::{CoreError, EntityRecord, HandoffReceipt, StepPayload};
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        pub Repo {}

        #[async_trait]
        impl WorkflowRepository for Repo {
            async fn load_workflow(&self, entity_id: &EntityId) -> Result<WorkflowInstance, CoreError>;
            async fn load_entity(&self, entity_id: &EntityId) -> Result<EntityRecord, CoreError>;
            async fn start_setup(&self, entity_id: &EntityId, mode: SetupMode) -> Result<WorkflowInstance, CoreError>;
            async fn save_step_data(&self, entity_id: &EntityId, step_id: &StepKey, payload: StepPayload) -> Result<(), CoreError>;
            async fn complete_step(&self, entity_id: &EntityId, step_id: &StepKey) -> Result<CompleteStepResponse, CoreError>;
            async fn skip_step(&self, entity_id: &EntityId, step_id: &StepKey) -> Result<(), CoreError>;
            async fn submit_workflow(&self, entity_id: &EntityId) -> Result<SubmissionPayload, CoreError>;
            async fn request_handoff(&self, entity_id: &EntityId) -> Result<HandoffReceipt, CoreError>;
            async fn submit_offline_packet(&self, entity_id: &EntityId) -> Result<WorkflowInstance, CoreError>;
        }
    }

    mock! {
        pub Docs {}

        #[async_trait]
        impl DocumentRepository for Docs {
            async fn list_documents(&self, entity_id: &EntityId) -> Result<Vec<Document>, CoreError>;
            async fn upload(&self, entity_id: &EntityId, upload: DocumentUpload) -> Result<Document, CoreError>;
            async fn delete(&self, entity_id: &EntityId, document_id: &DocumentId) -> Result<(), CoreError>;
            async fn download(&self, entity_id: &EntityId, document_id: &DocumentId) -> Result<DocumentContent, CoreError>;
        }
    }
}
