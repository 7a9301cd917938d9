//! Commission Agreement acknowledgement
//!
//! Producer-only step. The agreement is prefilled from Company Information and
//! may only be acknowledged once the commission schedule has been opened and
//! licensing has verified.

use super::{is_blank, load_typed, to_payload};
use groupsetup_core::application::prerequisites::licensing_block_reasons;
use groupsetup_core::{CoreError, DocumentGate, StepContext, StepModule, StepPayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const STEP: &str = "commission_ack";

/// Gate key of the commission schedule document
pub const COMMISSION_SCHEDULE: &str = "commission_schedule";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgreementInfo {
    pub company_name: String,
    pub effective_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payee {
    pub payee_name: String,
    pub payee_broker_code: String,
    pub payee_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommissionRate {
    pub product: String,
    pub commission_split_pct: f64,
}

/// Acknowledgement terms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Terms {
    pub disclosure_agreement: bool,
    pub e_signature: bool,
    pub accepted_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<String>,
}

impl Terms {
    pub fn is_complete(&self) -> bool {
        self.disclosure_agreement && self.e_signature && !is_blank(&self.accepted_by)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommissionAckData {
    pub info: AgreementInfo,
    pub payee: Payee,
    pub commission_rates: Vec<CommissionRate>,
    pub terms: Terms,
    pub documents_opened: DocumentGate,
}

#[derive(Debug, Default)]
pub struct CommissionAckStep {
    data: CommissionAckData,
    licensing_reasons: Vec<String>,
}

impl CommissionAckStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the commission schedule was opened
    pub fn open_schedule(&mut self) {
        self.data.documents_opened.open(COMMISSION_SCHEDULE);
    }

    pub fn can_acknowledge(&self) -> bool {
        self.data.documents_opened.can_acknowledge(COMMISSION_SCHEDULE)
    }

    pub fn payee_mut(&mut self) -> &mut Payee {
        &mut self.data.payee
    }

    pub fn add_rate(&mut self, product: &str, commission_split_pct: f64) {
        self.data.commission_rates.push(CommissionRate {
            product: product.to_string(),
            commission_split_pct,
        });
    }

    /// Accept the disclosure and e-sign. The first complete acknowledgement is stamped.
    pub fn acknowledge(&mut self, accepted_by: &str) -> Result<(), CoreError> {
        self.data.documents_opened.require_open(COMMISSION_SCHEDULE)?;
        if is_blank(accepted_by) {
            return Err(CoreError::ValidationError(
                "Enter your name to sign the agreement".to_string(),
            ));
        }

        let terms = &mut self.data.terms;
        terms.disclosure_agreement = true;
        terms.e_signature = true;
        terms.accepted_by = accepted_by.trim().to_string();
        if terms.acknowledged_at.is_none() {
            terms.acknowledged_at = Some(chrono::Utc::now().to_rfc3339());
        }
        debug!(accepted_by = %terms.accepted_by, "Commission agreement acknowledged");
        Ok(())
    }

    pub fn terms(&self) -> &Terms {
        &self.data.terms
    }

    pub fn info(&self) -> &AgreementInfo {
        &self.data.info
    }

    /// Reasons licensing blocks the agreement, as of the last activation
    pub fn licensing_reasons(&self) -> &[String] {
        &self.licensing_reasons
    }

    /// Reasons the agreement itself is incomplete
    pub fn agreement_reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        if is_blank(&self.data.info.effective_date) {
            reasons.push("Effective date must be set in Company Information step.".to_string());
        }
        if self.data.commission_rates.is_empty() {
            reasons.push("At least one commission rate row is required.".to_string());
        } else {
            let total: f64 = self
                .data
                .commission_rates
                .iter()
                .map(|r| r.commission_split_pct)
                .sum();
            if (total - 100.0).abs() > f64::EPSILON {
                reasons.push(format!(
                    "Commission split percentages total {}% (must equal 100%).",
                    total
                ));
            }
        }
        if is_blank(&self.data.payee.payee_name) {
            reasons.push("Payee name is required.".to_string());
        }
        reasons
    }
}

impl StepModule for CommissionAckStep {
    fn get_data(&self) -> StepPayload {
        to_payload(STEP, &self.data)
    }

    fn load(&mut self, payload: &StepPayload) -> Result<(), CoreError> {
        self.data = load_typed(STEP, payload)?;
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    fn validation_errors(&self) -> Vec<String> {
        let mut errors: Vec<String> = self
            .licensing_reasons
            .iter()
            .map(|r| format!("Licensing: {}", r))
            .collect();
        errors.extend(
            self.agreement_reasons()
                .into_iter()
                .map(|r| format!("Agreement: {}", r)),
        );
        if !self.data.terms.is_complete() {
            errors.push("Terms: the disclosure must be accepted and e-signed.".to_string());
        }
        errors
    }

    fn attach_context(&mut self, context: &StepContext) {
        self.licensing_reasons =
            licensing_block_reasons(context.data("licensing").map(StepPayload::as_value));

        let basic = context
            .data("company_info")
            .and_then(|d| d.get_path(&["basic"]));
        let field = |key: &str| {
            basic
                .and_then(|b| b.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        if let Some(name) = field("company_name") {
            self.data.info.company_name = name;
        }
        if let Some(date) = field("effective_date") {
            self.data.info.effective_date = date;
        }
    }
}
