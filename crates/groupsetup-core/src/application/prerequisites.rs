//! Cross-step prerequisite gating
//!
//! A prerequisite rule inspects *other* steps' data in the store snapshot
//! and reports blockers for a target step. Blockers are rendered as a banner
//! with a link back to the offending step and stop completion before any
//! collaborator is contacted.

use crate::application::workflow_store::Snapshot;
use crate::domain::workflow_definition::WorkflowDefinition;
use crate::domain::workflow_instance::{StepKey, StepStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// One unmet prerequisite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    /// The step that must be fixed
    pub step_id: StepKey,
    /// Its display name
    pub display_name: String,
    /// What is wrong
    pub reason: String,
}

/// Blocking banner for a target step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteBanner {
    /// The step whose completion is blocked
    pub target: StepKey,
    /// Enumerated blockers
    pub blockers: Vec<Blocker>,
}

impl PrerequisiteBanner {
    /// Reasons to list in the banner
    pub fn reasons(&self) -> Vec<String> {
        self.blockers.iter().map(|b| b.reason.clone()).collect()
    }

    /// Steps to link back to, in first-seen order
    pub fn link_targets(&self) -> Vec<StepKey> {
        let mut targets: Vec<StepKey> = Vec::new();
        for blocker in &self.blockers {
            if !targets.contains(&blocker.step_id) {
                targets.push(blocker.step_id.clone());
            }
        }
        targets
    }
}

/// A cross-step prerequisite
pub trait PrerequisiteRule: Send + Sync {
    /// The step this rule guards
    fn target(&self) -> &StepKey;

    /// Blockers for the target given the current snapshot
    fn evaluate(&self, snapshot: &Snapshot, definition: &WorkflowDefinition) -> Vec<Blocker>;
}

/// An ordered collection of rules
#[derive(Clone, Default)]
pub struct PrerequisiteSet {
    rules: Vec<Arc<dyn PrerequisiteRule>>,
}

impl std::fmt::Debug for PrerequisiteSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let targets: Vec<&StepKey> = self.rules.iter().map(|r| r.target()).collect();
        f.debug_struct("PrerequisiteSet").field("targets", &targets).finish()
    }
}

impl PrerequisiteSet {
    /// No rules
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in group setup rules
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(LicensingVerified::new())
            .with_rule(CommissionAgreementSigned::new())
    }

    /// Add a rule
    pub fn with_rule(mut self, rule: impl PrerequisiteRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Evaluate every rule guarding `target`; `None` when nothing blocks
    pub fn check(
        &self,
        target: &StepKey,
        snapshot: &Snapshot,
        definition: &WorkflowDefinition,
    ) -> Option<PrerequisiteBanner> {
        let blockers: Vec<Blocker> = self
            .rules
            .iter()
            .filter(|r| r.target() == target)
            .flat_map(|r| r.evaluate(snapshot, definition))
            .collect();

        if blockers.is_empty() {
            None
        } else {
            Some(PrerequisiteBanner {
                target: target.clone(),
                blockers,
            })
        }
    }
}

fn blocker(definition: &WorkflowDefinition, step: &StepKey, reason: String) -> Blocker {
    Blocker {
        step_id: step.clone(),
        display_name: definition.display_name(step),
        reason,
    }
}

/// The commission agreement requires verified writing producers
pub struct LicensingVerified {
    target: StepKey,
    source: StepKey,
}

impl LicensingVerified {
    /// Guard `commission_ack` on `licensing`
    pub fn new() -> Self {
        Self {
            target: StepKey::from("commission_ack"),
            source: StepKey::from("licensing"),
        }
    }
}

impl Default for LicensingVerified {
    fn default() -> Self {
        Self::new()
    }
}

/// Reasons a licensing payload does not verify, in display order
pub fn licensing_block_reasons(data: Option<&Value>) -> Vec<String> {
    let Some(producers) = data
        .and_then(|d| d.get("writing_producers"))
        .and_then(Value::as_array)
    else {
        return vec!["No writing producers have been added in the Licensing step.".to_string()];
    };

    let mut reasons = Vec::new();
    if producers.is_empty() {
        reasons.push("At least one writing producer is required.".to_string());
    }

    let inactive = producers
        .iter()
        .filter(|p| p.get("licensing_status").and_then(Value::as_str) != Some("active"))
        .count();
    if inactive > 0 {
        reasons.push(format!(
            "{} producer(s) do not have active licensing status.",
            inactive
        ));
    }

    let no_code = producers
        .iter()
        .filter(|p| {
            p.get("compensable_code")
                .and_then(Value::as_str)
                .map(|c| c.is_empty())
                .unwrap_or(true)
        })
        .count();
    if no_code > 0 {
        reasons.push(format!(
            "{} producer(s) have not been verified for a compensable code.",
            no_code
        ));
    }

    let total: f64 = producers
        .iter()
        .filter_map(|p| p.get("commission_split").and_then(Value::as_f64))
        .sum();
    if (total - 100.0).abs() > f64::EPSILON {
        reasons.push(format!(
            "Commission splits total {}% (must equal 100%).",
            total
        ));
    }

    reasons
}

impl PrerequisiteRule for LicensingVerified {
    fn target(&self) -> &StepKey {
        &self.target
    }

    fn evaluate(&self, snapshot: &Snapshot, definition: &WorkflowDefinition) -> Vec<Blocker> {
        let data = snapshot.step_data(&self.source).map(|p| p.as_value());
        licensing_block_reasons(data)
            .into_iter()
            .map(|reason| blocker(definition, &self.source, reason))
            .collect()
    }
}

/// Finalize requires a completed and signed commission agreement
pub struct CommissionAgreementSigned {
    target: StepKey,
    source: StepKey,
}

impl CommissionAgreementSigned {
    /// Guard `finalize` on `commission_ack`
    pub fn new() -> Self {
        Self {
            target: StepKey::from("finalize"),
            source: StepKey::from("commission_ack"),
        }
    }
}

impl Default for CommissionAgreementSigned {
    fn default() -> Self {
        Self::new()
    }
}

impl PrerequisiteRule for CommissionAgreementSigned {
    fn target(&self) -> &StepKey {
        &self.target
    }

    fn evaluate(&self, snapshot: &Snapshot, definition: &WorkflowDefinition) -> Vec<Blocker> {
        let name = definition.display_name(&self.source);
        let Some(step) = snapshot.step(&self.source) else {
            return vec![blocker(
                definition,
                &self.source,
                format!("{} step is missing.", name),
            )];
        };

        let mut reasons = Vec::new();
        if step.status != StepStatus::Completed {
            reasons.push(format!("{} has not been completed.", name));
        }

        let signed = step
            .data
            .get_path(&["terms", "e_signature"])
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let accepted_by = step
            .data
            .get_path(&["terms", "accepted_by"])
            .and_then(Value::as_str)
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        if !signed || !accepted_by {
            reasons.push(format!("{} has not been signed.", name));
        }

        reasons
            .into_iter()
            .map(|reason| blocker(definition, &self.source, reason))
            .collect()
    }
}
