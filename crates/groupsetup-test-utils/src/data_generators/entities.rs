//! Generators for entities and employer contacts.

use groupsetup_core::{EntityRecord, EntityStatus, HandoffReceipt};

/// Creates an entity that has not started group setup.
pub fn create_entity(entity_id: &str) -> EntityRecord {
    EntityRecord {
        id: entity_id.to_string(),
        client_name: "Acme Widgets".to_string(),
        unique_id: format!("U-{}", entity_id),
        eligible_employees: Some(25),
        status: EntityStatus::ApplicationNotStarted,
        is_offline: None,
    }
}

/// Creates the employer contact that receives handoff notifications.
pub fn create_employer_contact() -> HandoffReceipt {
    HandoffReceipt {
        employer_name: "Jane Employer".to_string(),
        employer_email: "jane@acme.test".to_string(),
    }
}
