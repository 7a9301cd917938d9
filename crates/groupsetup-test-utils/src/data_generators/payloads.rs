//! Generators for step payloads.

use groupsetup_core::StepPayload;
use serde_json::{json, Value};

/// Creates a payload that completes the given standard step.
///
/// The master application payload is signed but not yet submitted; it
/// becomes valid once submitted through the orchestrator.
pub fn create_complete_payload(step_key: &str) -> Option<StepPayload> {
    let value = match step_key {
        "licensing" => licensing(100.0),
        "company_info" => json!({
            "basic": {
                "company_name": "Acme Widgets",
                "federal_tax_id": "12-3456789",
                "effective_date": "2027-01-01",
                "eligible_employees": 25
            },
            "contributions": [{"product": "Dental", "employer_percent": 50.0}]
        }),
        "risk_assessment" => json!({
            "pregnant": {"any_pregnant": "no"},
            "health": {"has_health_risks": "no"},
            "disabled": {"has_disabled": "no"},
            "signature": {"declaration": true, "accepted_by": "Jane Employer"}
        }),
        "commission_ack" => json!({
            "info": {"company_name": "Acme Widgets", "effective_date": "2027-01-01"},
            "payee": {"payee_name": "Pat Broker", "payee_broker_code": "B-100"},
            "commission_rates": [{"product": "Dental", "commission_split_pct": 100.0}],
            "terms": {
                "disclosure_agreement": true,
                "e_signature": true,
                "accepted_by": "Pat Broker",
                "acknowledged_at": "2026-10-18T09:00:00+00:00"
            },
            "documents_opened": {"commission_schedule": true}
        }),
        "renewal_period" => json!({"renewal_month": 1, "renewal_notification_period": "60"}),
        "group_structure" => json!({
            "classes": [{"class_id": "cls-1", "name": "Salaried", "full_time_hours": 30}],
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
            "signature": master_app_signature(),
            "submitted": false
        }),
        _ => return None,
    };
    Some(StepPayload::new(value))
}

/// Creates a licensing payload with one verified producer holding `split` percent.
pub fn licensing(split: f64) -> Value {
    json!({
        "writing_producers": [{
            "producer_id": "p-1",
            "name": "Pat Broker",
            "licensing_status": "active",
            "compensable_code": "C-100",
            "commission_split": split
        }],
        "total_distribution": split
    })
}

/// Creates a licensing payload whose only producer is not yet active.
pub fn unverified_licensing() -> Value {
    json!({
        "writing_producers": [{
            "producer_id": "p-1",
            "name": "Pat Broker",
            "licensing_status": "pending",
            "compensable_code": null,
            "commission_split": 100.0
        }],
        "total_distribution": 100.0
    })
}

/// Creates a master application signature.
pub fn master_app_signature() -> Value {
    json!({
        "accepted_by": "Jane Employer",
        "title": "CFO",
        "city": "Springfield",
        "state": "IL",
        "date": "2026-10-18",
        "terms_accepted": true
    })
}
