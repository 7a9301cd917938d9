//! Renewal Period

use super::{load_typed, to_payload};
use groupsetup_core::{CoreError, StepModule, StepPayload};
use serde::{Deserialize, Serialize};

const STEP: &str = "renewal_period";

/// Days of notice before renewal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationPeriod {
    #[default]
    #[serde(rename = "60")]
    SixtyDays,
    #[serde(rename = "90")]
    NinetyDays,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenewalPeriodData {
    pub renewal_month: Option<u8>,
    pub renewal_notification_period: NotificationPeriod,
}

#[derive(Debug, Default)]
pub struct RenewalPeriodStep {
    data: RenewalPeriodData,
}

impl RenewalPeriodStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_month(&mut self, month: u8) {
        self.data.renewal_month = Some(month);
    }

    pub fn set_notification_period(&mut self, period: NotificationPeriod) {
        self.data.renewal_notification_period = period;
    }
}

impl StepModule for RenewalPeriodStep {
    fn get_data(&self) -> StepPayload {
        to_payload(STEP, &self.data)
    }

    fn load(&mut self, payload: &StepPayload) -> Result<(), CoreError> {
        self.data = load_typed(STEP, payload)?;
        Ok(())
    }

    fn is_valid(&self) -> bool {
        matches!(self.data.renewal_month, Some(1..=12))
    }

    fn validation_errors(&self) -> Vec<String> {
        match self.data.renewal_month {
            None => vec!["Please select a renewal month.".to_string()],
            Some(1..=12) => Vec::new(),
            Some(m) => vec![format!("Renewal month {} is not a calendar month.", m)],
        }
    }
}
