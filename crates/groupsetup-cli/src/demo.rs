//! Scripted answers for the demo enrollment

use groupsetup_core::{EntityRecord, EntityStatus, HandoffReceipt, StepPayload};
use serde_json::json;

/// The enrolling group
pub fn entity(entity_id: &str) -> EntityRecord {
    EntityRecord {
        id: entity_id.to_string(),
        client_name: "Acme Widgets".to_string(),
        unique_id: format!("DEMO-{}", entity_id),
        eligible_employees: Some(25),
        status: EntityStatus::ApplicationNotStarted,
        is_offline: None,
    }
}

/// Employer contact notified on handoff
pub fn employer_contact() -> HandoffReceipt {
    HandoffReceipt {
        employer_name: "Jane Employer".to_string(),
        employer_email: "jane@acme.test".to_string(),
    }
}

/// Answers that complete a standard step; the master application is signed
/// but left for the orchestrator to submit
pub fn step_payload(step_key: &str) -> Option<StepPayload> {
    let value = match step_key {
        "licensing" => json!({
            "writing_producers": [{
                "producer_id": "p-1",
                "name": "Pat Broker",
                "licensing_status": "active",
                "compensable_code": "C-100",
                "commission_split": 100.0
            }],
            "total_distribution": 100.0
        }),
        "company_info" => json!({
            "basic": {
                "company_name": "Acme Widgets",
                "federal_tax_id": "12-3456789",
                "effective_date": "2027-01-01",
                "eligible_employees": 25
            },
            "contributions": [
                {"product": "Dental", "employer_percent": 50.0},
                {"product": "Vision", "employer_percent": 25.0}
            ]
        }),
        "risk_assessment" => json!({
            "pregnant": {"any_pregnant": "no"},
            "health": {"has_health_risks": "no"},
            "disabled": {"has_disabled": "no"},
            "signature": {"declaration": true, "accepted_by": "Jane Employer"}
        }),
        "group_structure" => json!({
            "classes": [
                {"class_id": "cls-1", "name": "Salaried", "full_time_hours": 30},
                {"class_id": "cls-2", "name": "Hourly", "full_time_hours": 30}
            ],
            "locations": [{"id": "loc-1", "name": "HQ", "city": "Springfield", "state": "IL", "zip": "62701"}],
            "departments": [{"id": "dep-1", "name": "Operations", "code": "OPS"}],
            "contacts": [{
                "id": "con-1", "first_name": "Jane", "last_name": "Employer",
                "email": "jane@acme.test", "roles": ["primary"]
            }]
        }),
        "billing_setup" => json!({
            "billing": {"receive_billing_by_mail": "no", "wants_initial_premium": "no"}
        }),
        "commission_ack" => json!({
            "info": {"company_name": "Acme Widgets", "effective_date": "2027-01-01"},
            "payee": {"payee_name": "Pat Broker", "payee_broker_code": "B-100"},
            "commission_rates": [
                {"product": "Dental", "commission_split_pct": 70.0},
                {"product": "Vision", "commission_split_pct": 30.0}
            ],
            "terms": {
                "disclosure_agreement": true,
                "e_signature": true,
                "accepted_by": "Pat Broker",
                "acknowledged_at": "2026-10-18T09:00:00+00:00"
            },
            "documents_opened": {"commission_schedule": true}
        }),
        "renewal_period" => json!({"renewal_month": 1, "renewal_notification_period": "90"}),
        "authorization" => json!({
            "online_access": {"broker_online_access": "yes", "document_delivery": "electronic"},
            "privacy_notice": {"privacy_notice_acknowledged": true},
            "hipaa": {
                "phi_access": "no",
                "hipaa_terms_accepted": true,
                "esign_first_name": "Jane",
                "esign_last_name": "Employer"
            },
            "final_signature": {"accepted_by": "Jane Employer", "title": "CFO", "terms_accepted": true},
            "documents_opened": {"privacy_notice": true}
        }),
        "finalize" => json!({"reviewed": true}),
        "master_app" => json!({
            "signature": {
                "accepted_by": "Jane Employer",
                "title": "CFO",
                "city": "Springfield",
                "state": "IL",
                "date": "2026-10-18",
                "terms_accepted": true
            },
            "submitted": false
        }),
        _ => return None,
    };
    Some(StepPayload::new(value))
}
