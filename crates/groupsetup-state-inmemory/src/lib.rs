//! In-memory backend for the Group Setup engine
//!
//! This crate provides in-memory implementations of the collaborator
//! interfaces defined in groupsetup-core. It applies the server-side step
//! semantics (save, complete, skip, submit, handoff) to stored workflow
//! instances and is primarily useful for development, testing and demos.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use dashmap::DashMap;
use tracing::debug;

pub mod repositories;
pub use repositories::{
    FailureTable, InMemoryDocumentRepository, InMemoryWorkflowRepository, RecordedEvent,
};

use groupsetup_core::{
    domain::repository::{DocumentRepository, WorkflowRepository},
    domain::workflow_definition::WorkflowDefinition,
    domain::workflow_instance::WorkflowInstance,
    CoreError, EntityRecord, HandoffReceipt,
};

/// Provider for in-memory repositories
pub struct InMemoryStateStoreProvider {
    // Step sequence new workflows are created from
    definition: Arc<WorkflowDefinition>,

    // Shared storage for workflow instances, keyed by entity id
    workflows: Arc<RwLock<HashMap<String, WorkflowInstance>>>,

    // Shared storage for entity records
    entities: Arc<RwLock<HashMap<String, EntityRecord>>>,

    // Employer contacts used for handoff
    contacts: Arc<RwLock<HashMap<String, HandoffReceipt>>>,

    // Domain event log
    events: Arc<RwLock<Vec<RecordedEvent>>>,

    // One-shot injected failures
    failures: FailureTable,

    // Document storage, shared by every repository handed out
    documents: Arc<InMemoryDocumentRepository>,
}

impl InMemoryStateStoreProvider {
    /// Create a provider for the built-in group setup definition
    pub fn new() -> Self {
        Self::with_definition(WorkflowDefinition::group_setup())
    }

    /// Create a provider for a custom definition
    pub fn with_definition(definition: WorkflowDefinition) -> Self {
        let failures: FailureTable = Arc::new(DashMap::new());
        Self {
            definition: Arc::new(definition),
            workflows: Arc::new(RwLock::new(HashMap::new())),
            entities: Arc::new(RwLock::new(HashMap::new())),
            contacts: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(Vec::new())),
            documents: Arc::new(InMemoryDocumentRepository::new(failures.clone())),
            failures,
        }
    }

    /// Create repositories sharing this provider's storage
    pub fn create_repositories(&self) -> (Arc<dyn WorkflowRepository>, Arc<dyn DocumentRepository>) {
        let workflow_repo = Arc::new(InMemoryWorkflowRepository::new(
            self.definition.clone(),
            self.workflows.clone(),
            self.entities.clone(),
            self.contacts.clone(),
            self.events.clone(),
            self.failures.clone(),
        ));
        (workflow_repo, self.documents.clone())
    }

    /// Register an entity and, optionally, its employer contact
    pub async fn register_entity(&self, entity: EntityRecord, contact: Option<HandoffReceipt>) {
        debug!(entity_id = %entity.id, "Registering entity");
        if let Some(contact) = contact {
            self.contacts.write().await.insert(entity.id.clone(), contact);
        }
        self.entities.write().await.insert(entity.id.clone(), entity);
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: &str, error: CoreError) {
        self.failures.insert(operation.to_string(), error);
    }

    /// Stored workflow of an entity
    pub async fn workflow(&self, entity_id: &str) -> Option<WorkflowInstance> {
        self.workflows.read().await.get(entity_id).cloned()
    }

    /// Stored entity record
    pub async fn entity(&self, entity_id: &str) -> Option<EntityRecord> {
        self.entities.read().await.get(entity_id).cloned()
    }

    /// Recorded domain events, oldest first
    pub async fn events(&self) -> Vec<RecordedEvent> {
        self.events.read().await.clone()
    }
}

impl Default for InMemoryStateStoreProvider {
    fn default() -> Self {
        Self::new()
    }
}
