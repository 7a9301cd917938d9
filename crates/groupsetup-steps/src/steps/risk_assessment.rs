//! Risk Assessment: pregnancy, health risk and disability questionnaire

use super::{is_blank, load_typed, new_id, to_payload, YesNo};
use groupsetup_core::{CoreError, StepContext, StepModule, StepPayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const STEP: &str = "risk_assessment";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PregnancyAnswers {
    pub any_pregnant: YesNo,
    pub pregnant_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthAnswers {
    pub has_health_risks: YesNo,
    pub selected_risks: Vec<String>,
    pub other_risk_details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisabilityAnswers {
    pub has_disabled: YesNo,
    pub disabled_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisabledEmployee {
    pub id: String,
    pub name: String,
    pub date_of_disability: String,
    pub nature_of_claim: String,
}

/// Eligibility declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Declaration {
    pub declaration: bool,
    pub accepted_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAssessmentData {
    pub pregnant: PregnancyAnswers,
    pub health: HealthAnswers,
    pub disabled: DisabilityAnswers,
    pub disabled_employees: Vec<DisabledEmployee>,
    pub signature: Declaration,
}

#[derive(Debug, Default)]
pub struct RiskAssessmentStep {
    data: RiskAssessmentData,
    eligible_employees: Option<u64>,
}

impl RiskAssessmentStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_mut(&mut self) -> &mut RiskAssessmentData {
        &mut self.data
    }

    pub fn add_disabled_employee(&mut self, name: &str, date_of_disability: &str, nature_of_claim: &str) {
        self.data.disabled_employees.push(DisabledEmployee {
            id: new_id(),
            name: name.to_string(),
            date_of_disability: date_of_disability.to_string(),
            nature_of_claim: nature_of_claim.to_string(),
        });
    }

    pub fn sign(&mut self, accepted_by: &str) {
        self.data.signature = Declaration {
            declaration: true,
            accepted_by: accepted_by.to_string(),
        };
    }

    /// Eligible employee count carried over from Company Information
    pub fn eligible_employees(&self) -> Option<u64> {
        self.eligible_employees
    }

    fn count_error(&self, label: &str, count: Option<u32>) -> Option<String> {
        match (count, self.eligible_employees) {
            (None, _) | (Some(0), _) => Some(format!("Please enter the number of {}.", label)),
            (Some(n), Some(max)) if u64::from(n) > max => Some(format!(
                "The number of {} cannot exceed {} eligible employees.",
                label, max
            )),
            _ => None,
        }
    }
}

impl StepModule for RiskAssessmentStep {
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
        let d = &self.data;
        let mut errors = Vec::new();

        if d.pregnant.any_pregnant.is_yes() {
            errors.extend(self.count_error("pregnant employees", d.pregnant.pregnant_count));
        }
        if d.health.has_health_risks.is_yes() {
            if d.health.selected_risks.is_empty() {
                errors.push("Please select at least one health risk.".to_string());
            }
            if d.health.selected_risks.iter().any(|r| r == "other")
                && is_blank(&d.health.other_risk_details)
            {
                errors.push("Please describe the other health risk.".to_string());
            }
        }
        if d.disabled.has_disabled.is_yes() {
            errors.extend(self.count_error("disabled employees", d.disabled.disabled_count));
            let declared = d.disabled.disabled_count.unwrap_or(0) as usize;
            if declared > 0 && d.disabled_employees.len() != declared {
                errors.push(format!(
                    "Disabled employee details entered ({}) do not match the number declared ({}).",
                    d.disabled_employees.len(),
                    declared
                ));
            }
        }
        if !d.signature.declaration || is_blank(&d.signature.accepted_by) {
            errors.push("Please accept the declaration and enter your name.".to_string());
        }

        errors
    }

    fn attach_context(&mut self, context: &StepContext) {
        self.eligible_employees = context
            .data("company_info")
            .and_then(|d| d.get_path(&["basic", "eligible_employees"]))
            .and_then(Value::as_u64);
    }
}
