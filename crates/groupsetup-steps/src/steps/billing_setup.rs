//! Billing Setup: bill delivery and the optional initial premium payment

use super::{load_typed, to_payload, YesNo};
use groupsetup_core::{CoreError, StepModule, StepPayload};
use serde::{Deserialize, Serialize};

const STEP: &str = "billing_setup";

/// How the initial premium is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    /// Electronic debit, needs a payment method on file
    Ach,
    /// Mailed check
    Check,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethod {
    BankingAccount {
        bank_name: String,
        account_number_last_four: String,
    },
    CreditDebitCard {
        card_brand: String,
        card_last_four: String,
    },
}

impl PaymentMethod {
    /// Masked one-line description
    pub fn summary(&self) -> String {
        match self {
            PaymentMethod::BankingAccount {
                bank_name,
                account_number_last_four,
            } => format!("{} - ****{}", bank_name, account_number_last_four),
            PaymentMethod::CreditDebitCard {
                card_brand,
                card_last_four,
            } => format!("{} ending in {}", card_brand, card_last_four),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Billing {
    pub bill_type: String,
    pub receive_billing_by_mail: YesNo,
    pub wants_initial_premium: YesNo,
    pub initial_premium_amount: Option<f64>,
    pub payment_channel: Option<PaymentChannel>,
    pub payment_method: Option<PaymentMethod>,
}

impl Default for Billing {
    fn default() -> Self {
        Self {
            bill_type: "List Bill".to_string(),
            receive_billing_by_mail: YesNo::No,
            wants_initial_premium: YesNo::No,
            initial_premium_amount: None,
            payment_channel: None,
            payment_method: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSetupData {
    pub billing: Billing,
}

#[derive(Debug, Default)]
pub struct BillingSetupStep {
    data: BillingSetupData,
}

impl BillingSetupStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an initial premium payment
    pub fn request_initial_premium(&mut self, amount: f64, channel: PaymentChannel) {
        let billing = &mut self.data.billing;
        billing.wants_initial_premium = YesNo::Yes;
        billing.initial_premium_amount = Some(amount);
        billing.payment_channel = Some(channel);
    }

    /// Drop the initial premium along with its amount, channel and method
    pub fn decline_initial_premium(&mut self) {
        let billing = &mut self.data.billing;
        billing.wants_initial_premium = YesNo::No;
        billing.initial_premium_amount = None;
        billing.payment_channel = None;
        billing.payment_method = None;
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.data.billing.payment_method = Some(method);
    }

    pub fn set_billing_by_mail(&mut self, by_mail: YesNo) {
        self.data.billing.receive_billing_by_mail = by_mail;
    }

    pub fn payment_summary(&self) -> String {
        self.data
            .billing
            .payment_method
            .as_ref()
            .map(PaymentMethod::summary)
            .unwrap_or_else(|| "-".to_string())
    }
}

impl StepModule for BillingSetupStep {
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
        let billing = &self.data.billing;
        if !billing.wants_initial_premium.is_yes() {
            return Vec::new();
        }

        let mut errors = Vec::new();
        if !billing.initial_premium_amount.is_some_and(|a| a >= 0.01) {
            errors.push("Initial premium amount must be at least $0.01.".to_string());
        }
        match billing.payment_channel {
            None => errors.push("Please choose how the initial premium is paid.".to_string()),
            Some(PaymentChannel::Ach) if billing.payment_method.is_none() => {
                errors.push("A payment method is required for ACH payments.".to_string())
            }
            Some(_) => {}
        }
        errors
    }
}
