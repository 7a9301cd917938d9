use crate::domain::workflow_instance::{
    EntityId, StepInstance, StepKey, WorkflowDefinitionId, WorkflowInstance, WorkflowInstanceId,
};
use crate::{CoreError, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Identifier of the built-in group setup definition
pub const GROUP_SETUP_DEFINITION_ID: &str = "group_setup";

/// Static step sequence for one workflow type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// ID of the definition
    pub id: WorkflowDefinitionId,

    /// Human-readable name
    pub name: String,

    /// The definition version
    pub version: u32,

    /// The steps, in any order; `order` decides the sequence
    pub steps: Vec<StepDefinition>,
}

/// Static metadata for one stage of the workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Stable step key
    pub step_id: StepKey,

    /// Canonical order
    pub order: u32,

    /// Display name used in navigation and lock reasons
    pub name: String,

    /// Roles permitted to act on the step; empty means unrestricted
    #[serde(default)]
    pub allowed_roles: Vec<Role>,

    /// Mandatory steps block their successors until done
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl StepDefinition {
    /// Create a required step definition
    pub fn new(step_id: &str, order: u32, name: &str, allowed_roles: Vec<Role>) -> Self {
        Self {
            step_id: StepKey::from(step_id),
            order,
            name: name.to_string(),
            allowed_roles,
            required: true,
        }
    }

    /// Mark the step optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

impl WorkflowDefinition {
    /// Validate the definition
    pub fn validate(&self) -> Result<(), CoreError> {
        // Check for empty steps
        if self.steps.is_empty() {
            return Err(CoreError::ValidationError(
                "Workflow definition must have at least one step".to_string(),
            ));
        }

        // Check for key and order uniqueness
        let mut keys = HashSet::new();
        let mut orders = HashSet::new();
        for step in &self.steps {
            if !keys.insert(&step.step_id) {
                return Err(CoreError::ValidationError(format!(
                    "Duplicate step ID: {}",
                    step.step_id
                )));
            }
            if !orders.insert(step.order) {
                return Err(CoreError::ValidationError(format!(
                    "Duplicate step order {} at step {}",
                    step.order, step.step_id
                )));
            }
        }

        Ok(())
    }

    /// Look up a step definition
    pub fn step(&self, key: &StepKey) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| &s.step_id == key)
    }

    /// Display name for a step, falling back to the key
    pub fn display_name(&self, key: &StepKey) -> String {
        self.step(key)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| key.0.clone())
    }

    /// Whether a step is mandatory; unknown steps are treated as required
    pub fn is_required(&self, key: &StepKey) -> bool {
        self.step(key).map(|s| s.required).unwrap_or(true)
    }

    /// Create a workflow instance with one pending step per definition
    pub fn instantiate(&self, entity_id: EntityId) -> Result<WorkflowInstance, CoreError> {
        self.validate()?;

        let instance_id = WorkflowInstanceId(Uuid::new_v4().to_string());
        let mut defs: Vec<&StepDefinition> = self.steps.iter().collect();
        defs.sort_by_key(|d| d.order);

        let steps = defs
            .into_iter()
            .map(|d| {
                StepInstance::new(
                    instance_id.clone(),
                    d.step_id.clone(),
                    d.order,
                    d.allowed_roles.clone(),
                )
            })
            .collect();

        Ok(WorkflowInstance::new(
            instance_id,
            entity_id,
            self.id.clone(),
            steps,
        ))
    }

    /// Copy `allowed_roles` from the definition onto each step instance
    pub fn enrich(&self, workflow: &mut WorkflowInstance) {
        for step in workflow.steps.iter_mut() {
            if let Some(def) = self.step(&step.step_id) {
                step.allowed_roles = def.allowed_roles.clone();
            }
        }
    }

    /// The built-in ten step group setup sequence
    pub fn group_setup() -> Self {
        use Role::{Broker, Employer, Ga, Tpa};

        let producer = || vec![Broker, Ga, Tpa];
        let shared = || vec![Broker, Ga, Tpa, Employer];

        Self {
            id: WorkflowDefinitionId(GROUP_SETUP_DEFINITION_ID.to_string()),
            name: "Group Setup".to_string(),
            version: 1,
            steps: vec![
                StepDefinition::new("licensing", 1, "Licensing/Appointment", producer()),
                StepDefinition::new("company_info", 2, "Company Information", shared()),
                StepDefinition::new("risk_assessment", 3, "Risk Assessment", shared()),
                StepDefinition::new("commission_ack", 4, "Commission Agreement", producer()),
                StepDefinition::new("renewal_period", 5, "Renewal Period", shared()),
                StepDefinition::new("group_structure", 6, "Group Structure", shared()),
                StepDefinition::new("billing_setup", 7, "Billing Setup", shared()),
                StepDefinition::new("authorization", 8, "Authorization", vec![Employer]),
                StepDefinition::new("finalize", 9, "Finalize", shared()),
                StepDefinition::new("master_app", 10, "Master Application", vec![Employer]),
            ],
        }
    }
}
