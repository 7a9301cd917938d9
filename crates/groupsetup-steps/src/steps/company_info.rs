//! Company Information: identity, effective date and eligibility

use super::{is_blank, load_typed, to_payload};
use groupsetup_core::{CoreError, StepModule, StepPayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const STEP: &str = "company_info";

/// Basic company details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicInfo {
    pub company_name: String,
    pub federal_tax_id: String,
    pub effective_date: String,
    pub eligible_employees: Option<u32>,
}

/// Employer contribution toward one product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contribution {
    pub product: String,
    pub employer_percent: f64,
}

/// Saved company information payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfoData {
    pub basic: BasicInfo,
    pub contributions: Vec<Contribution>,
    pub erisa: serde_json::Map<String, Value>,
}

/// `XX-XXXXXXX`
pub fn is_federal_tax_id(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[2] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || b.is_ascii_digit())
}

#[derive(Debug, Default)]
pub struct CompanyInfoStep {
    data: CompanyInfoData,
}

impl CompanyInfoStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn basic(&self) -> &BasicInfo {
        &self.data.basic
    }

    pub fn basic_mut(&mut self) -> &mut BasicInfo {
        &mut self.data.basic
    }

    pub fn add_contribution(&mut self, product: &str, employer_percent: f64) {
        self.data.contributions.push(Contribution {
            product: product.to_string(),
            employer_percent,
        });
    }
}

impl StepModule for CompanyInfoStep {
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
        let basic = &self.data.basic;
        let mut errors = Vec::new();

        if is_blank(&basic.company_name) {
            errors.push("Company name is required.".to_string());
        }
        if is_blank(&basic.effective_date) {
            errors.push("Effective date is required.".to_string());
        }
        if !is_federal_tax_id(basic.federal_tax_id.trim()) {
            errors.push("Federal Tax ID is required (format: XX-XXXXXXX).".to_string());
        }
        if basic.eligible_employees.unwrap_or(0) == 0 {
            errors.push("Number of eligible employees must be greater than zero.".to_string());
        }
        for c in &self.data.contributions {
            if !(0.0..=100.0).contains(&c.employer_percent) {
                errors.push(format!(
                    "Contribution for {} must be between 0% and 100%.",
                    c.product
                ));
            }
        }

        errors
    }
}
