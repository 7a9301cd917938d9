//!
//! Standard library of step modules for the Group Setup workflow
//!

use groupsetup_core::{CoreError, StepModule, StepRegistry};

pub mod steps;

pub use steps::authorization::AuthorizationStep;
pub use steps::billing_setup::BillingSetupStep;
pub use steps::commission_ack::CommissionAckStep;
pub use steps::company_info::CompanyInfoStep;
pub use steps::finalize::FinalizeStep;
pub use steps::group_structure::GroupStructureStep;
pub use steps::licensing::LicensingStep;
pub use steps::master_app::MasterAppStep;
pub use steps::renewal_period::RenewalPeriodStep;
pub use steps::risk_assessment::RiskAssessmentStep;
pub use steps::YesNo;

/// Step keys with a built-in module, in workflow order
pub const STANDARD_STEPS: [&str; 10] = [
    "licensing",
    "company_info",
    "risk_assessment",
    "commission_ack",
    "renewal_period",
    "group_structure",
    "billing_setup",
    "authorization",
    "finalize",
    "master_app",
];

/// Module constructors keyed by step
pub mod factory {
    use super::*;

    /// Creates a step module based on the step key.
    pub fn create_step(step_key: &str) -> Result<Box<dyn StepModule>, CoreError> {
        match step_key {
            "licensing" => Ok(Box::new(LicensingStep::new())),
            "company_info" => Ok(Box::new(CompanyInfoStep::new())),
            "risk_assessment" => Ok(Box::new(RiskAssessmentStep::new())),
            "commission_ack" => Ok(Box::new(CommissionAckStep::new())),
            "renewal_period" => Ok(Box::new(RenewalPeriodStep::new())),
            "group_structure" => Ok(Box::new(GroupStructureStep::new())),
            "billing_setup" => Ok(Box::new(BillingSetupStep::new())),
            "authorization" => Ok(Box::new(AuthorizationStep::new())),
            "finalize" => Ok(Box::new(FinalizeStep::new())),
            "master_app" => Ok(Box::new(MasterAppStep::new())),
            _ => Err(CoreError::ModuleResolution(format!("Unknown step type: {}", step_key)))
        }
    }
}

/// A registry with every standard step registered
pub fn standard_registry() -> StepRegistry {
    let mut registry = StepRegistry::new();
    for key in STANDARD_STEPS {
        registry.register(key, move || async move { factory::create_step(key) });
    }
    tracing::debug!(steps = STANDARD_STEPS.len(), "Standard step registry built");
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::create_step;
    use groupsetup_core::{StepKey, WorkflowDefinition};

    #[test]
    fn test_create_step() {
        for key in STANDARD_STEPS {
            let module = create_step(key).unwrap();
            assert!(module.get_data().as_value().is_object(), "{key}");
        }

        // Unknown steps should return an error
        assert!(matches!(
            create_step("Unknown"),
            Err(CoreError::ModuleResolution(_))
        ));
    }

    #[test]
    fn test_registry_covers_definition() {
        let registry = standard_registry();
        for step in WorkflowDefinition::group_setup().steps {
            assert!(registry.contains(&step.step_id), "{}", step.step_id);
        }
        assert!(!registry.contains(&StepKey::from("nope")));
    }

    #[tokio::test]
    async fn test_registry_resolves_modules() {
        let registry = standard_registry();
        let resolution = registry.resolve(&StepKey::from("finalize")).await;
        assert!(resolution.is_loaded());
    }
}
