//! Progression and locking rules
//!
//! For an ordered step list this computes which steps are locked, which one
//! is next, and why a step is locked. Only required steps block their
//! successors, and only the nearest blocking predecessor is reported.

use crate::domain::workflow_definition::WorkflowDefinition;
use crate::domain::workflow_instance::{StepInstance, StepKey, StepStatus};
use crate::Role;
use serde::{Deserialize, Serialize};

/// Who a step belongs to, for navigation display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ownership {
    /// Only the employer may act
    Employer,
    /// Only producer roles may act
    Broker,
    /// Employer and producers share the step
    Shared,
}

impl Ownership {
    /// Derive ownership from the allowed roles; `None` for an unrestricted step
    pub fn from_roles(roles: &[Role]) -> Option<Self> {
        if roles.is_empty() {
            return None;
        }
        let employer = roles.contains(&Role::Employer);
        let others = roles.iter().any(|r| *r != Role::Employer);
        Some(match (employer, others) {
            (true, false) => Ownership::Employer,
            (false, _) => Ownership::Broker,
            (true, true) => Ownership::Shared,
        })
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Ownership::Employer => "Employer",
            Ownership::Broker => "Broker",
            Ownership::Shared => "Shared",
        }
    }
}

/// Computed navigation state of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepProgress {
    /// Step key
    pub step_id: StepKey,
    /// Display name from the definition
    pub display_name: String,
    /// Current status
    pub status: StepStatus,
    /// Completed, skipped or not applicable
    pub done: bool,
    /// Pending behind an unfinished required predecessor
    pub locked: bool,
    /// Display name of the nearest blocking predecessor
    pub lock_reason: Option<String>,
    /// Not done and not locked
    pub actionable: bool,
    /// The first actionable step
    pub is_next_step: bool,
    /// The acting role may not act on this step
    pub role_restricted: bool,
    /// Ownership label source
    pub ownership: Option<Ownership>,
}

/// Compute progress for steps already sorted by `step_order`
pub fn compute_progress(
    sorted_steps: &[&StepInstance],
    definition: &WorkflowDefinition,
    role: Option<Role>,
) -> Vec<StepProgress> {
    let mut nearest_blocker: Option<String> = None;
    let mut next_assigned = false;
    let mut result = Vec::with_capacity(sorted_steps.len());

    for step in sorted_steps {
        let display_name = definition.display_name(&step.step_id);
        let done = step.status.is_done();
        let locked = step.status == StepStatus::Pending && nearest_blocker.is_some();
        let actionable = !done && !locked;
        let is_next_step = actionable && !next_assigned;
        next_assigned |= is_next_step;

        result.push(StepProgress {
            step_id: step.step_id.clone(),
            display_name: display_name.clone(),
            status: step.status,
            done,
            locked,
            lock_reason: if locked { nearest_blocker.clone() } else { None },
            actionable,
            is_next_step,
            role_restricted: step.is_role_restricted(role),
            ownership: Ownership::from_roles(&step.allowed_roles),
        });

        if !done && definition.is_required(&step.step_id) {
            nearest_blocker = Some(display_name);
        }
    }

    result
}
