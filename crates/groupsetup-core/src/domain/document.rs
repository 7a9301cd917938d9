use crate::domain::workflow_instance::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value object: Document ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of document attached to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// Signed master application
    MasterApp,
    /// Completed data gathering tool
    DataGatheringTool,
    /// Employee census
    CensusTemplate,
    /// Signed commission acknowledgement
    CommissionAck,
    /// Enrollment form
    EnrollmentForm,
    /// Anything else
    Supplemental,
}

impl DocumentType {
    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::MasterApp => "Master Application",
            DocumentType::DataGatheringTool => "Data Gathering Tool",
            DocumentType::CensusTemplate => "Census Template",
            DocumentType::CommissionAck => "Commission Acknowledgement",
            DocumentType::EnrollmentForm => "Enrollment Form",
            DocumentType::Supplemental => "Supplemental",
        }
    }
}

/// Metadata of a stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier
    pub id: DocumentId,
    /// Owning entity
    pub entity_id: EntityId,
    /// Original file name
    pub file_name: String,
    /// Optional free text description
    #[serde(default)]
    pub file_description: Option<String>,
    /// Document kind
    pub file_type: DocumentType,
    /// Storage location, opaque to the engine
    pub storage_path: String,
    /// Uploading user
    #[serde(default)]
    pub uploaded_by: Option<String>,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
}

/// Upload request
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpload {
    /// Original file name
    pub file_name: String,
    /// Optional free text description
    pub file_description: Option<String>,
    /// Document kind
    pub file_type: DocumentType,
    /// Raw bytes
    pub content: Vec<u8>,
    /// Uploading user
    pub uploaded_by: Option<String>,
}

impl DocumentUpload {
    /// Create an upload request
    pub fn new(file_name: impl Into<String>, file_type: DocumentType, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            file_description: None,
            file_type,
            content,
            uploaded_by: None,
        }
    }
}

/// Downloaded document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContent {
    /// Document metadata
    pub document: Document,
    /// Raw bytes
    pub content: Vec<u8>,
}
