//! Offline intake packet
//!
//! Groups that choose the paper route upload a packet of documents instead
//! of walking the online steps. The packet is complete once every required
//! document type has at least one upload.

use crate::domain::document::{Document, DocumentId, DocumentType, DocumentUpload};
use crate::domain::repository::{DocumentRepository, WorkflowRepository};
use crate::domain::workflow_instance::{EntityId, WorkflowInstance, WorkflowStatus};
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Document types the packet must contain
pub const REQUIRED_DOCUMENTS: [DocumentType; 2] =
    [DocumentType::MasterApp, DocumentType::DataGatheringTool];

/// Document types the packet lists
pub const PACKET_DOCUMENTS: [DocumentType; 5] = [
    DocumentType::MasterApp,
    DocumentType::DataGatheringTool,
    DocumentType::CensusTemplate,
    DocumentType::CommissionAck,
    DocumentType::EnrollmentForm,
];

/// Packet lifecycle, derived from the workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PacketStatus {
    /// Documents are being uploaded
    Collecting,
    /// Submitted for review
    Submitted,
    /// Under review
    InReview,
}

impl PacketStatus {
    /// Map a workflow status onto the packet lifecycle
    pub fn from_workflow(status: WorkflowStatus) -> Self {
        match status {
            WorkflowStatus::OfflineSubmitted => PacketStatus::Submitted,
            WorkflowStatus::OfflineInReview => PacketStatus::InReview,
            _ => PacketStatus::Collecting,
        }
    }
}

/// One line of the packet checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketEntry {
    /// Document type
    pub file_type: DocumentType,
    /// Display label
    pub label: String,
    /// Must be uploaded before submission
    pub required: bool,
    /// At least one upload exists
    pub uploaded: bool,
    /// Most recent upload of this type
    pub document_id: Option<DocumentId>,
}

/// Checklist view of an offline packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketOverview {
    /// Lifecycle status
    pub status: PacketStatus,
    /// One entry per packet document type
    pub entries: Vec<PacketEntry>,
    /// Labels of required types without an upload
    pub missing_required: Vec<String>,
}

impl PacketOverview {
    /// Build the checklist from the uploaded documents
    pub fn build(status: PacketStatus, documents: &[Document]) -> Self {
        let entries: Vec<PacketEntry> = PACKET_DOCUMENTS
            .iter()
            .map(|file_type| {
                let latest = documents
                    .iter()
                    .filter(|d| d.file_type == *file_type)
                    .max_by_key(|d| d.uploaded_at);
                PacketEntry {
                    file_type: *file_type,
                    label: file_type.label().to_string(),
                    required: REQUIRED_DOCUMENTS.contains(file_type),
                    uploaded: latest.is_some(),
                    document_id: latest.map(|d| d.id.clone()),
                }
            })
            .collect();

        let missing_required = entries
            .iter()
            .filter(|e| e.required && !e.uploaded)
            .map(|e| e.label.clone())
            .collect();

        Self {
            status,
            entries,
            missing_required,
        }
    }

    /// Every required document is uploaded
    pub fn is_complete(&self) -> bool {
        self.missing_required.is_empty()
    }

    /// The packet has left the collecting phase
    pub fn is_submitted(&self) -> bool {
        self.status != PacketStatus::Collecting
    }
}

/// Tracks and submits the offline packet of an entity
#[derive(Clone)]
pub struct OfflinePacketTracker {
    workflows: Arc<dyn WorkflowRepository>,
    documents: Arc<dyn DocumentRepository>,
}

impl std::fmt::Debug for OfflinePacketTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflinePacketTracker").finish_non_exhaustive()
    }
}

impl OfflinePacketTracker {
    /// Create a tracker
    pub fn new(workflows: Arc<dyn WorkflowRepository>, documents: Arc<dyn DocumentRepository>) -> Self {
        Self {
            workflows,
            documents,
        }
    }

    async fn offline_workflow(&self, entity_id: &EntityId) -> Result<WorkflowInstance, CoreError> {
        let workflow = self.workflows.load_workflow(entity_id).await?;
        if !workflow.is_offline_track() {
            return Err(CoreError::InvalidStateTransition(format!(
                "Entity {} is not on the offline track",
                entity_id
            )));
        }
        Ok(workflow)
    }

    /// Current checklist
    pub async fn overview(&self, entity_id: &EntityId) -> Result<PacketOverview, CoreError> {
        let workflow = self.offline_workflow(entity_id).await?;
        let documents = self.documents.list_documents(entity_id).await?;
        Ok(PacketOverview::build(
            PacketStatus::from_workflow(workflow.status),
            &documents,
        ))
    }

    async fn require_collecting(&self, entity_id: &EntityId) -> Result<(), CoreError> {
        let workflow = self.offline_workflow(entity_id).await?;
        if PacketStatus::from_workflow(workflow.status) != PacketStatus::Collecting {
            return Err(CoreError::InvalidStateTransition(
                "The offline packet has already been submitted".to_string(),
            ));
        }
        Ok(())
    }

    /// Add a document while collecting
    pub async fn upload(&self, entity_id: &EntityId, upload: DocumentUpload) -> Result<Document, CoreError> {
        self.require_collecting(entity_id).await?;
        debug!(entity_id = %entity_id, file_type = ?upload.file_type, "Uploading packet document");
        self.documents.upload(entity_id, upload).await
    }

    /// Remove a document while collecting
    pub async fn remove(&self, entity_id: &EntityId, document_id: &DocumentId) -> Result<(), CoreError> {
        self.require_collecting(entity_id).await?;
        self.documents.delete(entity_id, document_id).await
    }

    /// Submit the packet; every required document must be uploaded
    pub async fn submit(&self, entity_id: &EntityId) -> Result<WorkflowInstance, CoreError> {
        let overview = self.overview(entity_id).await?;
        if overview.is_submitted() {
            return Err(CoreError::InvalidStateTransition(
                "The offline packet has already been submitted".to_string(),
            ));
        }
        if !overview.is_complete() {
            warn!(entity_id = %entity_id, missing = ?overview.missing_required, "Offline packet incomplete");
            return Err(CoreError::ValidationError(format!(
                "Cannot submit: missing required documents: {}",
                overview.missing_required.join(", ")
            )));
        }

        let workflow = self.workflows.submit_offline_packet(entity_id).await?;
        info!(entity_id = %entity_id, "Offline packet submitted");
        Ok(workflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow_definition::WorkflowDefinition;
    use crate::mocks::{MockDocs, MockRepo};
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn document(id: &str, file_type: DocumentType, age_minutes: i64) -> Document {
        Document {
            id: DocumentId(id.to_string()),
            entity_id: EntityId::from("c1"),
            file_name: format!("{}.pdf", id),
            file_description: None,
            file_type,
            storage_path: format!("c1/{}", id),
            uploaded_by: None,
            uploaded_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn offline_workflow(status: WorkflowStatus) -> WorkflowInstance {
        let mut wf = WorkflowDefinition::group_setup()
            .instantiate(EntityId::from("c1"))
            .unwrap();
        wf.start_offline().unwrap();
        wf.status = status;
        wf
    }

    #[test]
    fn test_overview_lists_every_packet_type() {
        let docs = vec![
            document("old", DocumentType::MasterApp, 10),
            document("new", DocumentType::MasterApp, 1),
            document("census", DocumentType::CensusTemplate, 5),
        ];
        let overview = PacketOverview::build(PacketStatus::Collecting, &docs);

        assert_eq!(overview.entries.len(), 5);
        let master = &overview.entries[0];
        assert_eq!(master.label, "Master Application");
        assert!(master.required && master.uploaded);
        assert_eq!(master.document_id, Some(DocumentId("new".to_string())));
        assert_eq!(overview.missing_required, vec!["Data Gathering Tool".to_string()]);
        assert!(!overview.is_complete());
        assert!(!overview.is_submitted());
    }

    #[test]
    fn test_status_follows_workflow() {
        assert_eq!(PacketStatus::from_workflow(WorkflowStatus::Offline), PacketStatus::Collecting);
        assert_eq!(PacketStatus::from_workflow(WorkflowStatus::OfflineSubmitted), PacketStatus::Submitted);
        assert_eq!(PacketStatus::from_workflow(WorkflowStatus::OfflineInReview), PacketStatus::InReview);
    }

    #[tokio::test]
    async fn test_incomplete_packet_cannot_be_submitted() {
        let mut repo = MockRepo::new();
        repo.expect_load_workflow()
            .returning(|_| Ok(offline_workflow(WorkflowStatus::Offline)));
        repo.expect_submit_offline_packet().never();
        let mut docs = MockDocs::new();
        docs.expect_list_documents().returning(|_| Ok(vec![]));

        let tracker = OfflinePacketTracker::new(Arc::new(repo), Arc::new(docs));
        let err = tracker.submit(&EntityId::from("c1")).await.unwrap_err();

        assert_eq!(
            err,
            CoreError::ValidationError(
                "Cannot submit: missing required documents: Master Application, Data Gathering Tool"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_complete_packet_is_submitted() {
        let mut repo = MockRepo::new();
        repo.expect_load_workflow()
            .returning(|_| Ok(offline_workflow(WorkflowStatus::Offline)));
        repo.expect_submit_offline_packet()
            .times(1)
            .returning(|_| Ok(offline_workflow(WorkflowStatus::OfflineSubmitted)));
        let mut docs = MockDocs::new();
        docs.expect_list_documents().returning(|_| {
            Ok(vec![
                document("m", DocumentType::MasterApp, 1),
                document("d", DocumentType::DataGatheringTool, 1),
            ])
        });

        let tracker = OfflinePacketTracker::new(Arc::new(repo), Arc::new(docs));
        let wf = tracker.submit(&EntityId::from("c1")).await.unwrap();
        assert_eq!(wf.status, WorkflowStatus::OfflineSubmitted);
    }

    #[tokio::test]
    async fn test_uploads_refused_after_submission() {
        let mut repo = MockRepo::new();
        repo.expect_load_workflow()
            .returning(|_| Ok(offline_workflow(WorkflowStatus::OfflineSubmitted)));
        let mut docs = MockDocs::new();
        docs.expect_upload().never();

        let tracker = OfflinePacketTracker::new(Arc::new(repo), Arc::new(docs));
        let upload = DocumentUpload::new("census.xlsx", DocumentType::CensusTemplate, vec![1, 2, 3]);
        assert!(matches!(
            tracker.upload(&EntityId::from("c1"), upload).await,
            Err(CoreError::InvalidStateTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_online_workflow_has_no_packet() {
        let mut repo = MockRepo::new();
        repo.expect_load_workflow().returning(|_| {
            let mut wf = WorkflowDefinition::group_setup()
                .instantiate(EntityId::from("c1"))
                .unwrap();
            wf.start_online().unwrap();
            Ok(wf)
        });
        let tracker = OfflinePacketTracker::new(Arc::new(repo), Arc::new(MockDocs::new()));
        assert!(tracker.overview(&EntityId::from("c1")).await.is_err());
    }
}
