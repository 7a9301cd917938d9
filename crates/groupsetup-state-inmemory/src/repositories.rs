use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use groupsetup_core::{
    CoreError,
    domain::events::{DomainEvent, HandoffRequested},
    domain::document::{Document, DocumentContent, DocumentId, DocumentUpload},
    domain::repository::{
        CompleteStepResponse, DocumentRepository, SetupMode, SubmissionPayload,
        WorkflowRepository,
    },
    domain::workflow_definition::WorkflowDefinition,
    domain::workflow_instance::{EntityId, StepKey, WorkflowInstance, WorkflowInstanceId},
    EntityRecord, EntityStatus, HandoffReceipt, StepPayload,
};

/// A domain event as kept in the event log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Event type, e.g. `workflow.step_completed`
    pub event_type: String,
    /// Workflow the event belongs to
    pub workflow_instance_id: WorkflowInstanceId,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

impl RecordedEvent {
    fn from_event(event: &dyn DomainEvent) -> Self {
        Self {
            event_type: event.event_type().to_string(),
            workflow_instance_id: event.workflow_instance_id().clone(),
            timestamp: event.timestamp(),
        }
    }
}

/// One-shot failures keyed by operation name
pub type FailureTable = Arc<DashMap<String, CoreError>>;

/// Turn a domain rejection into a collaborator error. Lifecycle and
/// validation messages are safe to show, so they become the recovery hint.
fn rejected(operation: &str, err: CoreError) -> CoreError {
    match err {
        CoreError::Persistence { .. } => err,
        CoreError::InvalidStateTransition(message) | CoreError::ValidationError(message) => {
            CoreError::persistence(operation, message.clone()).with_recovery_hint(message)
        }
        other => CoreError::persistence(operation, other.to_string()),
    }
}

fn take_failure(failures: &FailureTable, operation: &str) -> Result<(), CoreError> {
    match failures.remove(operation) {
        Some((_, err)) => {
            warn!(operation, error = %err, "Injected failure");
            Err(err)
        }
        None => Ok(()),
    }
}

/// In-memory implementation of the WorkflowRepository
pub struct InMemoryWorkflowRepository {
    definition: Arc<WorkflowDefinition>,
    workflows: Arc<RwLock<HashMap<String, WorkflowInstance>>>,
    entities: Arc<RwLock<HashMap<String, EntityRecord>>>,
    contacts: Arc<RwLock<HashMap<String, HandoffReceipt>>>,
    events: Arc<RwLock<Vec<RecordedEvent>>>,
    failures: FailureTable,
    group_numbers: AtomicU64,
}

impl InMemoryWorkflowRepository {
    /// Create a new in-memory workflow repository
    pub fn new(
        definition: Arc<WorkflowDefinition>,
        workflows: Arc<RwLock<HashMap<String, WorkflowInstance>>>,
        entities: Arc<RwLock<HashMap<String, EntityRecord>>>,
        contacts: Arc<RwLock<HashMap<String, HandoffReceipt>>>,
        events: Arc<RwLock<Vec<RecordedEvent>>>,
        failures: FailureTable,
    ) -> Self {
        Self {
            definition,
            workflows,
            entities,
            contacts,
            events,
            failures,
            group_numbers: AtomicU64::new(100_000),
        }
    }

    async fn record(&self, workflow: &mut WorkflowInstance) {
        let drained = workflow.take_events();
        if drained.is_empty() {
            return;
        }
        let mut events = self.events.write().await;
        for event in drained {
            debug!(event_type = event.event_type(), "Domain event");
            events.push(RecordedEvent::from_event(event.as_ref()));
        }
    }

    /// Apply a mutation to the stored workflow of an entity
    async fn mutate<T>(
        &self,
        operation: &str,
        entity_id: &EntityId,
        f: impl FnOnce(&mut WorkflowInstance) -> Result<T, CoreError>,
    ) -> Result<(T, WorkflowInstance), CoreError> {
        take_failure(&self.failures, operation)?;

        let mut workflows = self.workflows.write().await;
        let workflow = workflows.get_mut(&entity_id.0).ok_or_else(|| {
            CoreError::persistence(operation, format!("Workflow not found for entity {}", entity_id))
        })?;
        let value = f(workflow).map_err(|e| rejected(operation, e))?;
        let mut snapshot = workflow.clone();
        snapshot.events = workflow.take_events();
        drop(workflows);

        self.record(&mut snapshot).await;
        Ok((value, snapshot))
    }

    async fn set_entity_status(&self, entity_id: &EntityId, status: EntityStatus, offline: Option<bool>) {
        let mut entities = self.entities.write().await;
        if let Some(entity) = entities.get_mut(&entity_id.0) {
            entity.status = status;
            if offline.is_some() {
                entity.is_offline = offline;
            }
        }
    }

    fn build_submission(&self, workflow: &WorkflowInstance) -> SubmissionPayload {
        let number = self.group_numbers.fetch_add(1, Ordering::SeqCst) + 1;
        let data = |key: &str| workflow.step(&StepKey::from(key)).map(|s| s.data.clone());

        let effective_date = data("company_info")
            .and_then(|d| d.get_path(&["basic", "effective_date"]).cloned())
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty());

        let names = |section: &str, default: &str| -> Vec<String> {
            let names: Vec<String> = data("group_structure")
                .and_then(|d| d.get_path(&[section]).cloned())
                .and_then(|v| v.as_array().cloned())
                .unwrap_or_default()
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .filter(|name| !name.trim().is_empty())
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                vec![default.to_string()]
            } else {
                names
            }
        };

        SubmissionPayload {
            workflow_instance_id: workflow.id.clone(),
            entity_id: workflow.entity_id.clone(),
            group_number: format!("GRP-{:06}", number),
            effective_date,
            classes: names("classes", "Default Class"),
            departments: names("departments", "Default Department"),
            step_data: workflow
                .sorted_steps()
                .into_iter()
                .map(|s| (s.step_id.0.clone(), s.data.as_value().clone()))
                .collect(),
            submitted_at: workflow.completed_at.unwrap_or_else(Utc::now),
        }
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn load_workflow(&self, entity_id: &EntityId) -> Result<WorkflowInstance, CoreError> {
        take_failure(&self.failures, "load_workflow")?;
        let workflows = self.workflows.read().await;
        workflows.get(&entity_id.0).cloned().ok_or_else(|| {
            CoreError::persistence(
                "load_workflow",
                format!("Workflow not found for entity {}", entity_id),
            )
        })
    }

    async fn load_entity(&self, entity_id: &EntityId) -> Result<EntityRecord, CoreError> {
        take_failure(&self.failures, "load_entity")?;
        let entities = self.entities.read().await;
        entities.get(&entity_id.0).cloned().ok_or_else(|| {
            CoreError::persistence("load_entity", format!("Entity not found: {}", entity_id))
        })
    }

    async fn start_setup(
        &self,
        entity_id: &EntityId,
        mode: SetupMode,
    ) -> Result<WorkflowInstance, CoreError> {
        take_failure(&self.failures, "start_setup")?;

        let mut workflow = {
            let mut workflows = self.workflows.write().await;
            if workflows.contains_key(&entity_id.0) {
                return Err(CoreError::persistence(
                    "start_setup",
                    format!("Group setup already started for entity {}", entity_id),
                )
                .with_recovery_hint("Group setup has already been started for this group"));
            }

            let mut workflow = self
                .definition
                .instantiate(entity_id.clone())
                .map_err(|e| rejected("start_setup", e))?;
            let started = match mode {
                SetupMode::Online => workflow.start_online(),
                SetupMode::Offline => workflow.start_offline(),
            };
            started.map_err(|e| rejected("start_setup", e))?;

            let mut stored = workflow.clone();
            stored.events = Vec::new();
            workflows.insert(entity_id.0.clone(), stored);
            workflow
        };

        self.record(&mut workflow).await;
        self.set_entity_status(
            entity_id,
            EntityStatus::ApplicationInProgress,
            Some(mode == SetupMode::Offline),
        )
        .await;
        info!(entity_id = %entity_id, ?mode, "Group setup started");
        Ok(workflow)
    }

    async fn save_step_data(
        &self,
        entity_id: &EntityId,
        step_id: &StepKey,
        payload: StepPayload,
    ) -> Result<(), CoreError> {
        self.mutate("save_step_data", entity_id, |wf| wf.save_step_data(step_id, payload))
            .await?;
        debug!(entity_id = %entity_id, step_id = %step_id, "Step data saved");
        Ok(())
    }

    async fn complete_step(
        &self,
        entity_id: &EntityId,
        step_id: &StepKey,
    ) -> Result<CompleteStepResponse, CoreError> {
        let (next_step_id, _) = self
            .mutate("complete_step", entity_id, |wf| wf.complete_step(step_id))
            .await?;
        debug!(entity_id = %entity_id, step_id = %step_id, next = ?next_step_id, "Step completed");
        Ok(CompleteStepResponse {
            step_id: step_id.clone(),
            next_step_id,
        })
    }

    async fn skip_step(&self, entity_id: &EntityId, step_id: &StepKey) -> Result<(), CoreError> {
        self.mutate("skip_step", entity_id, |wf| wf.skip_step(step_id))
            .await?;
        debug!(entity_id = %entity_id, step_id = %step_id, "Step skipped");
        Ok(())
    }

    async fn submit_workflow(&self, entity_id: &EntityId) -> Result<SubmissionPayload, CoreError> {
        let ((), workflow) = self
            .mutate("submit_workflow", entity_id, |wf| wf.submit())
            .await?;
        self.set_entity_status(entity_id, EntityStatus::Active, None).await;

        let payload = self.build_submission(&workflow);
        info!(entity_id = %entity_id, group_number = %payload.group_number, "Workflow submitted");
        Ok(payload)
    }

    async fn request_handoff(&self, entity_id: &EntityId) -> Result<HandoffReceipt, CoreError> {
        take_failure(&self.failures, "request_handoff")?;

        let receipt = {
            let contacts = self.contacts.read().await;
            contacts.get(&entity_id.0).cloned().ok_or_else(|| {
                CoreError::persistence("request_handoff", format!("No employer contact for {}", entity_id))
                    .with_recovery_hint("No employer contact is on file for this group")
            })?
        };

        let workflow_instance_id = {
            let workflows = self.workflows.read().await;
            workflows.get(&entity_id.0).map(|wf| wf.id.clone()).ok_or_else(|| {
                CoreError::persistence(
                    "request_handoff",
                    format!("Workflow not found for entity {}", entity_id),
                )
            })?
        };

        let event = HandoffRequested {
            workflow_instance_id,
            employer_email: receipt.employer_email.clone(),
            timestamp: Utc::now(),
        };
        self.events.write().await.push(RecordedEvent::from_event(&event));
        info!(entity_id = %entity_id, employer_email = %receipt.employer_email, "Handoff requested");
        Ok(receipt)
    }

    async fn submit_offline_packet(&self, entity_id: &EntityId) -> Result<WorkflowInstance, CoreError> {
        let ((), workflow) = self
            .mutate("submit_offline_packet", entity_id, |wf| wf.submit_offline_packet())
            .await?;
        Ok(workflow)
    }
}

struct StoredDocument {
    document: Document,
    content: Vec<u8>,
}

/// In-memory implementation of the DocumentRepository
pub struct InMemoryDocumentRepository {
    documents: Arc<RwLock<HashMap<String, Vec<StoredDocument>>>>,
    failures: FailureTable,
}

impl InMemoryDocumentRepository {
    /// Create a new in-memory document repository
    pub fn new(failures: FailureTable) -> Self {
        Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
            failures,
        }
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn list_documents(&self, entity_id: &EntityId) -> Result<Vec<Document>, CoreError> {
        take_failure(&self.failures, "list_documents")?;
        let documents = self.documents.read().await;
        Ok(documents
            .get(&entity_id.0)
            .map(|docs| docs.iter().map(|d| d.document.clone()).collect())
            .unwrap_or_default())
    }

    async fn upload(
        &self,
        entity_id: &EntityId,
        upload: DocumentUpload,
    ) -> Result<Document, CoreError> {
        take_failure(&self.failures, "upload")?;

        if upload.file_name.trim().is_empty() {
            return Err(CoreError::DocumentError("File name is required".to_string()));
        }
        if upload.content.is_empty() {
            return Err(CoreError::DocumentError(format!("{} is empty", upload.file_name)));
        }

        let id = DocumentId(Uuid::new_v4().to_string());
        let document = Document {
            storage_path: format!("{}/{}/{}", entity_id, id, upload.file_name),
            id,
            entity_id: entity_id.clone(),
            file_name: upload.file_name,
            file_description: upload.file_description,
            file_type: upload.file_type,
            uploaded_by: upload.uploaded_by,
            uploaded_at: Utc::now(),
        };

        let mut documents = self.documents.write().await;
        documents.entry(entity_id.0.clone()).or_default().push(StoredDocument {
            document: document.clone(),
            content: upload.content,
        });
        debug!(entity_id = %entity_id, document_id = %document.id, "Document stored");
        Ok(document)
    }

    async fn delete(&self, entity_id: &EntityId, document_id: &DocumentId) -> Result<(), CoreError> {
        take_failure(&self.failures, "delete")?;

        let mut documents = self.documents.write().await;
        let docs = documents.entry(entity_id.0.clone()).or_default();
        let before = docs.len();
        docs.retain(|d| &d.document.id != document_id);
        if docs.len() == before {
            return Err(CoreError::DocumentError(format!("Document not found: {}", document_id)));
        }
        Ok(())
    }

    async fn download(
        &self,
        entity_id: &EntityId,
        document_id: &DocumentId,
    ) -> Result<DocumentContent, CoreError> {
        take_failure(&self.failures, "download")?;

        let documents = self.documents.read().await;
        documents
            .get(&entity_id.0)
            .and_then(|docs| docs.iter().find(|d| &d.document.id == document_id))
            .map(|d| DocumentContent {
                document: d.document.clone(),
                content: d.content.clone(),
            })
            .ok_or_else(|| CoreError::DocumentError(format!("Document not found: {}", document_id)))
    }
}
