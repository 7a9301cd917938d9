use crate::{
    domain::events::{
        DomainEvent, GroupSetupStarted, OfflinePacketSubmitted, WorkflowStepCompleted,
        WorkflowStepSaved, WorkflowStepSkipped, WorkflowSubmitted,
    },
    CoreError, Role, StepPayload,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Overall workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    /// Created but not yet started
    NotStarted,

    /// Online step navigation in progress
    InProgress,

    /// Submitted; the terminal value
    Completed,

    /// Offline intake chosen, documents being collected
    Offline,

    /// Offline packet submitted
    OfflineSubmitted,

    /// Offline packet under review
    OfflineInReview,
}

impl WorkflowStatus {
    /// True for every status on the offline intake track
    pub fn is_offline_track(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Offline
                | WorkflowStatus::OfflineSubmitted
                | WorkflowStatus::OfflineInReview
        )
    }
}

/// Step instance status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    /// Not yet touched
    Pending,

    /// Data saved at least once
    InProgress,

    /// Completed through the orchestrator
    Completed,

    /// Explicitly skipped
    Skipped,

    /// Does not apply to this group
    NotApplicable,
}

impl StepStatus {
    /// Done steps never block their successors
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Skipped | StepStatus::NotApplicable
        )
    }
}

/// Value object: Workflow Instance ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowInstanceId(pub String);

/// Value object: Workflow Definition ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowDefinitionId(pub String);

/// Value object: Entity (client group) ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub String);

/// Value object: Step Instance ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepInstanceId(pub String);

/// Value object: stable step key, e.g. `licensing`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepKey(pub String);

impl StepKey {
    /// Create a step key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for StepKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Entity: one step of one workflow instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInstance {
    /// Unique identifier
    pub id: StepInstanceId,

    /// Parent workflow
    pub workflow_instance_id: WorkflowInstanceId,

    /// Stable step key
    pub step_id: StepKey,

    /// Canonical position, immutable once created
    pub step_order: u32,

    /// Current status
    pub status: StepStatus,

    /// Assigned user, if any
    #[serde(default)]
    pub assigned_user_id: Option<String>,

    /// Assigned role, if any
    #[serde(default)]
    pub assigned_role: Option<Role>,

    /// Roles permitted to act on this step; empty means unrestricted
    #[serde(default)]
    pub allowed_roles: Vec<Role>,

    /// Opaque payload owned by the step module
    #[serde(default)]
    pub data: StepPayload,

    /// First save timestamp
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// Completion timestamp
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    /// Last save timestamp
    #[serde(default)]
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl StepInstance {
    /// Create a pending step instance
    pub fn new(
        workflow_instance_id: WorkflowInstanceId,
        step_id: StepKey,
        step_order: u32,
        allowed_roles: Vec<Role>,
    ) -> Self {
        Self {
            id: StepInstanceId(Uuid::new_v4().to_string()),
            workflow_instance_id,
            step_id,
            step_order,
            status: StepStatus::Pending,
            assigned_user_id: None,
            assigned_role: allowed_roles.first().copied(),
            allowed_roles,
            data: StepPayload::empty(),
            started_at: None,
            completed_at: None,
            last_saved_at: None,
        }
    }

    /// Whether the step is done (completed, skipped or not applicable)
    #[inline]
    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }

    /// True iff `allowed_roles` is non-empty and excludes the acting role.
    /// An unknown acting role is never restricted.
    pub fn is_role_restricted(&self, role: Option<Role>) -> bool {
        match role {
            Some(role) => !self.allowed_roles.is_empty() && !self.allowed_roles.contains(&role),
            None => false,
        }
    }
}

/// Aggregate: Workflow instance
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkflowInstance {
    /// Unique identifier
    pub id: WorkflowInstanceId,

    /// Owning entity
    pub entity_id: EntityId,

    /// Which step sequence applies
    pub workflow_definition_id: WorkflowDefinitionId,

    /// Overall status
    pub status: WorkflowStatus,

    /// Current step, always a member of `steps` when set
    #[serde(default)]
    pub current_step_id: Option<StepKey>,

    /// Offline intake variant
    #[serde(default)]
    pub is_offline: bool,

    /// Step instances
    pub steps: Vec<StepInstance>,

    /// Start timestamp
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// Submission timestamp
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    /// Domain events
    #[serde(skip)]
    pub events: Vec<Box<dyn DomainEvent>>,
}

// Manually implement Clone for WorkflowInstance
impl Clone for WorkflowInstance {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            entity_id: self.entity_id.clone(),
            workflow_definition_id: self.workflow_definition_id.clone(),
            status: self.status,
            current_step_id: self.current_step_id.clone(),
            is_offline: self.is_offline,
            steps: self.steps.clone(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            events: Vec::new(), // We don't clone domain events
        }
    }
}

impl PartialEq for WorkflowInstance {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.entity_id == other.entity_id
            && self.workflow_definition_id == other.workflow_definition_id
            && self.status == other.status
            && self.current_step_id == other.current_step_id
            && self.is_offline == other.is_offline
            && self.steps == other.steps
            && self.started_at == other.started_at
            && self.completed_at == other.completed_at
    }
}

impl WorkflowInstance {
    /// Create a workflow instance in `NOT_STARTED` with the given steps
    pub fn new(
        id: WorkflowInstanceId,
        entity_id: EntityId,
        workflow_definition_id: WorkflowDefinitionId,
        steps: Vec<StepInstance>,
    ) -> Self {
        Self {
            id,
            entity_id,
            workflow_definition_id,
            status: WorkflowStatus::NotStarted,
            current_step_id: None,
            is_offline: false,
            steps,
            started_at: None,
            completed_at: None,
            events: Vec::with_capacity(8),
        }
    }

    /// Steps ordered by `step_order`
    pub fn sorted_steps(&self) -> Vec<&StepInstance> {
        let mut steps: Vec<&StepInstance> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.step_order);
        steps
    }

    /// Find a step by key
    #[inline]
    pub fn step(&self, key: &StepKey) -> Option<&StepInstance> {
        self.steps.iter().find(|s| &s.step_id == key)
    }

    fn step_mut(&mut self, key: &StepKey) -> Result<&mut StepInstance, CoreError> {
        self.steps
            .iter_mut()
            .find(|s| &s.step_id == key)
            .ok_or_else(|| CoreError::StepNotFound(key.0.clone()))
    }

    /// Whether the workflow has reached the terminal completed status
    #[inline]
    pub fn is_submitted(&self) -> bool {
        self.status == WorkflowStatus::Completed
    }

    /// Whether this workflow follows the offline intake track
    #[inline]
    pub fn is_offline_track(&self) -> bool {
        self.is_offline || self.status.is_offline_track()
    }

    /// Point the workflow at a step; the step must belong to the workflow
    pub fn set_current_step(&mut self, key: &StepKey) -> Result<(), CoreError> {
        if self.step(key).is_none() {
            return Err(CoreError::StepNotFound(key.0.clone()));
        }
        self.current_step_id = Some(key.clone());
        Ok(())
    }

    /// Start online step navigation at the first step
    pub fn start_online(&mut self) -> Result<(), CoreError> {
        if self.status != WorkflowStatus::NotStarted {
            return Err(CoreError::InvalidStateTransition(format!(
                "Cannot start setup in state: {:?}",
                self.status
            )));
        }

        let now = Utc::now();
        self.status = WorkflowStatus::InProgress;
        self.started_at = Some(now);
        self.current_step_id = self.sorted_steps().first().map(|s| s.step_id.clone());

        self.record_event(Box::new(GroupSetupStarted {
            workflow_instance_id: self.id.clone(),
            entity_id: self.entity_id.clone(),
            offline: false,
            timestamp: now,
        }));
        Ok(())
    }

    /// Switch to the offline intake track
    pub fn start_offline(&mut self) -> Result<(), CoreError> {
        if self.status != WorkflowStatus::NotStarted {
            return Err(CoreError::InvalidStateTransition(format!(
                "Cannot start offline setup in state: {:?}",
                self.status
            )));
        }

        let now = Utc::now();
        self.status = WorkflowStatus::Offline;
        self.is_offline = true;
        self.started_at = Some(now);

        self.record_event(Box::new(GroupSetupStarted {
            workflow_instance_id: self.id.clone(),
            entity_id: self.entity_id.clone(),
            offline: true,
            timestamp: now,
        }));
        Ok(())
    }

    /// Replace a step's data wholesale; a pending step moves to in progress
    pub fn save_step_data(&mut self, key: &StepKey, data: StepPayload) -> Result<(), CoreError> {
        if self.is_submitted() {
            return Err(CoreError::WorkflowSubmitted(self.entity_id.0.clone()));
        }

        let now = Utc::now();
        let step = self.step_mut(key)?;
        step.data = data;
        step.last_saved_at = Some(now);
        if step.status == StepStatus::Pending {
            step.status = StepStatus::InProgress;
            step.started_at = Some(now);
        }
        self.current_step_id = Some(key.clone());

        self.record_event(Box::new(WorkflowStepSaved {
            workflow_instance_id: self.id.clone(),
            step_id: key.clone(),
            timestamp: now,
        }));
        Ok(())
    }

    /// Mark a step completed and return the next step that is not done
    pub fn complete_step(&mut self, key: &StepKey) -> Result<Option<StepKey>, CoreError> {
        if self.is_submitted() {
            return Err(CoreError::WorkflowSubmitted(self.entity_id.0.clone()));
        }

        let now = Utc::now();
        let order = {
            let step = self.step_mut(key)?;
            step.status = StepStatus::Completed;
            step.completed_at = Some(now);
            if step.started_at.is_none() {
                step.started_at = Some(now);
            }
            step.step_order
        };

        let next_step_id = self
            .sorted_steps()
            .into_iter()
            .find(|s| s.step_order > order && !s.is_done())
            .map(|s| s.step_id.clone());

        if let Some(next) = &next_step_id {
            self.current_step_id = Some(next.clone());
        }

        self.record_event(Box::new(WorkflowStepCompleted {
            workflow_instance_id: self.id.clone(),
            step_id: key.clone(),
            next_step_id: next_step_id.clone(),
            timestamp: now,
        }));
        Ok(next_step_id)
    }

    /// Mark a step skipped
    pub fn skip_step(&mut self, key: &StepKey) -> Result<(), CoreError> {
        if self.is_submitted() {
            return Err(CoreError::WorkflowSubmitted(self.entity_id.0.clone()));
        }

        self.step_mut(key)?.status = StepStatus::Skipped;

        self.record_event(Box::new(WorkflowStepSkipped {
            workflow_instance_id: self.id.clone(),
            step_id: key.clone(),
            timestamp: Utc::now(),
        }));
        Ok(())
    }

    /// Submit the workflow; every step must be done
    pub fn submit(&mut self) -> Result<(), CoreError> {
        if self.is_submitted() {
            return Err(CoreError::WorkflowSubmitted(self.entity_id.0.clone()));
        }

        let pending: Vec<&str> = self
            .sorted_steps()
            .into_iter()
            .filter(|s| !s.is_done())
            .map(|s| s.step_id.as_str())
            .collect();
        if !pending.is_empty() {
            return Err(CoreError::InvalidStateTransition(format!(
                "Cannot submit: steps not complete: {}",
                pending.join(", ")
            )));
        }

        let now = Utc::now();
        self.status = WorkflowStatus::Completed;
        self.completed_at = Some(now);

        self.record_event(Box::new(WorkflowSubmitted {
            workflow_instance_id: self.id.clone(),
            timestamp: now,
        }));
        Ok(())
    }

    /// Mark the offline packet as submitted
    pub fn submit_offline_packet(&mut self) -> Result<(), CoreError> {
        if self.status != WorkflowStatus::Offline {
            return Err(CoreError::InvalidStateTransition(format!(
                "Cannot submit offline packet in state: {:?}",
                self.status
            )));
        }

        self.status = WorkflowStatus::OfflineSubmitted;

        self.record_event(Box::new(OfflinePacketSubmitted {
            workflow_instance_id: self.id.clone(),
            timestamp: Utc::now(),
        }));
        Ok(())
    }

    /// Record a domain event
    #[inline]
    pub fn record_event(&mut self, event: Box<dyn DomainEvent>) {
        self.events.push(event);
    }

    /// Drain recorded domain events
    pub fn take_events(&mut self) -> Vec<Box<dyn DomainEvent>> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn workflow(keys: &[&str]) -> WorkflowInstance {
        let id = WorkflowInstanceId("wf-1".to_string());
        let steps = keys
            .iter()
            .enumerate()
            .map(|(i, k)| StepInstance::new(id.clone(), StepKey::from(*k), i as u32 + 1, vec![]))
            .collect();
        WorkflowInstance::new(
            id,
            EntityId::from("client-1"),
            WorkflowDefinitionId("group_setup".to_string()),
            steps,
        )
    }

    #[test]
    fn test_start_online_points_at_first_step() {
        let mut wf = workflow(&["b", "a"]);
        wf.steps[0].step_order = 2;
        wf.steps[1].step_order = 1;

        wf.start_online().unwrap();

        assert_eq!(wf.status, WorkflowStatus::InProgress);
        assert_eq!(wf.current_step_id, Some(StepKey::from("a")));
        assert_eq!(wf.take_events()[0].event_type(), "group_setup.started");
        assert!(wf.start_online().is_err());
    }

    #[test]
    fn test_start_offline_sets_flag() {
        let mut wf = workflow(&["a"]);
        wf.start_offline().unwrap();
        assert_eq!(wf.status, WorkflowStatus::Offline);
        assert!(wf.is_offline);
        assert!(wf.is_offline_track());
    }

    #[test]
    fn test_save_moves_pending_to_in_progress_and_replaces_data() {
        let mut wf = workflow(&["a", "b"]);
        wf.start_online().unwrap();

        wf.save_step_data(&StepKey::from("b"), StepPayload::new(json!({"x": 1})))
            .unwrap();
        wf.save_step_data(&StepKey::from("b"), StepPayload::new(json!({"y": 2})))
            .unwrap();

        let step = wf.step(&StepKey::from("b")).unwrap();
        assert_eq!(step.status, StepStatus::InProgress);
        assert_eq!(step.data.as_value(), &json!({"y": 2}));
        assert!(step.last_saved_at.is_some());
        assert_eq!(wf.current_step_id, Some(StepKey::from("b")));
    }

    #[test]
    fn test_complete_returns_first_later_step_not_done() {
        let mut wf = workflow(&["a", "b", "c"]);
        wf.start_online().unwrap();
        wf.skip_step(&StepKey::from("b")).unwrap();

        let next = wf.complete_step(&StepKey::from("a")).unwrap();
        assert_eq!(next, Some(StepKey::from("c")));

        let next = wf.complete_step(&StepKey::from("c")).unwrap();
        assert_eq!(next, None);
        assert_eq!(wf.status, WorkflowStatus::InProgress);
    }

    #[test]
    fn test_submit_requires_all_steps_done() {
        let mut wf = workflow(&["a", "b"]);
        wf.start_online().unwrap();
        wf.complete_step(&StepKey::from("a")).unwrap();

        let err = wf.submit().unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition(ref m) if m.contains("b")));

        wf.complete_step(&StepKey::from("b")).unwrap();
        wf.submit().unwrap();
        assert!(wf.is_submitted());
        assert!(wf.completed_at.is_some());

        let err = wf
            .save_step_data(&StepKey::from("a"), StepPayload::empty())
            .unwrap_err();
        assert!(matches!(err, CoreError::WorkflowSubmitted(_)));
    }

    #[test]
    fn test_set_current_step_rejects_unknown_key() {
        let mut wf = workflow(&["a"]);
        assert!(matches!(
            wf.set_current_step(&StepKey::from("zzz")),
            Err(CoreError::StepNotFound(_))
        ));
    }

    #[test]
    fn test_role_restriction() {
        let id = WorkflowInstanceId("wf".to_string());
        let step = StepInstance::new(id.clone(), StepKey::from("a"), 1, vec![Role::Employer]);
        assert_eq!(step.assigned_role, Some(Role::Employer));
        assert!(step.is_role_restricted(Some(Role::Broker)));
        assert!(!step.is_role_restricted(Some(Role::Employer)));
        assert!(!step.is_role_restricted(None));

        let open = StepInstance::new(id, StepKey::from("b"), 2, vec![]);
        assert!(!open.is_role_restricted(Some(Role::Broker)));
    }

    #[test]
    fn test_offline_packet_submission_transitions() {
        let mut wf = workflow(&["a"]);
        assert!(wf.submit_offline_packet().is_err());
        wf.start_offline().unwrap();
        wf.submit_offline_packet().unwrap();
        assert_eq!(wf.status, WorkflowStatus::OfflineSubmitted);
    }

    #[test]
    fn test_clone_drops_events() {
        let mut wf = workflow(&["a"]);
        wf.start_online().unwrap();
        let cloned = wf.clone();
        assert!(cloned.events.is_empty());
        assert_eq!(cloned, wf);
    }
}
