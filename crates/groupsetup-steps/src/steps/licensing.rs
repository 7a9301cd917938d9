//! Licensing/Appointment: writing producers and their commission splits

use super::{load_typed, new_id, to_payload};
use groupsetup_core::application::prerequisites::licensing_block_reasons;
use groupsetup_core::{CoreError, StepModule, StepPayload};
use serde::{Deserialize, Serialize};

const STEP: &str = "licensing";

/// Licensing status reported by the appointment lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicensingStatus {
    /// Licensed and appointed
    Active,
    /// Lookup has not run yet
    #[default]
    Pending,
    /// Licence lapsed or appointment terminated
    Inactive,
}

/// A producer writing the business
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WritingProducer {
    pub producer_id: String,
    pub name: String,
    #[serde(default)]
    pub licensing_status: LicensingStatus,
    #[serde(default)]
    pub compensable_code: Option<String>,
    #[serde(default)]
    pub commission_split: f64,
}

/// Saved licensing payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LicensingData {
    #[serde(default)]
    pub writing_producers: Vec<WritingProducer>,
    #[serde(default)]
    pub total_distribution: f64,
}

/// Licensing step module
#[derive(Debug, Default)]
pub struct LicensingStep {
    data: LicensingData,
}

impl LicensingStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a producer with a pending status and return its id
    pub fn add_producer(&mut self, name: &str, commission_split: f64) -> String {
        let producer_id = new_id();
        self.data.writing_producers.push(WritingProducer {
            producer_id: producer_id.clone(),
            name: name.to_string(),
            commission_split,
            ..Default::default()
        });
        self.recompute_total();
        producer_id
    }

    pub fn remove_producer(&mut self, producer_id: &str) {
        self.data
            .writing_producers
            .retain(|p| p.producer_id != producer_id);
        self.recompute_total();
    }

    /// Record the result of a licensing status lookup
    pub fn verify_status(&mut self, producer_id: &str, status: LicensingStatus) -> Result<(), CoreError> {
        self.producer_mut(producer_id)?.licensing_status = status;
        Ok(())
    }

    /// Record the compensable code a producer is paid under
    pub fn verify_code(&mut self, producer_id: &str, code: &str) -> Result<(), CoreError> {
        if code.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Compensable code cannot be empty".to_string(),
            ));
        }
        self.producer_mut(producer_id)?.compensable_code = Some(code.trim().to_string());
        Ok(())
    }

    pub fn producers(&self) -> &[WritingProducer] {
        &self.data.writing_producers
    }

    pub fn total_distribution(&self) -> f64 {
        self.data.total_distribution
    }

    fn producer_mut(&mut self, producer_id: &str) -> Result<&mut WritingProducer, CoreError> {
        self.data
            .writing_producers
            .iter_mut()
            .find(|p| p.producer_id == producer_id)
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown producer: {}", producer_id)))
    }

    fn recompute_total(&mut self) {
        self.data.total_distribution = self
            .data
            .writing_producers
            .iter()
            .map(|p| p.commission_split)
            .sum();
    }
}

impl StepModule for LicensingStep {
    fn get_data(&self) -> StepPayload {
        to_payload(STEP, &self.data)
    }

    fn load(&mut self, payload: &StepPayload) -> Result<(), CoreError> {
        self.data = load_typed(STEP, payload)?;
        self.recompute_total();
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    fn validation_errors(&self) -> Vec<String> {
        licensing_block_reasons(Some(self.get_data().as_value()))
    }
}
