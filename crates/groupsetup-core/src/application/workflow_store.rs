//! Observable in-memory projection of the current workflow
//!
//! Every mutation is synchronous and publishes a new immutable [`Snapshot`]
//! with a strictly increasing generation number. Derivations are computed
//! once per snapshot, so readers never observe a torn state.

use crate::domain::workflow_instance::{
    StepInstance, StepKey, StepStatus, WorkflowInstance, WorkflowStatus,
};
use crate::{CoreError, EntityRecord, Role, StepPayload};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

/// Raw store inputs
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    /// The loaded workflow, if any
    pub workflow: Option<WorkflowInstance>,
    /// The enrolling entity, if loaded
    pub entity: Option<EntityRecord>,
    /// The step the user is on
    pub current_step_id: Option<StepKey>,
    /// A load is in progress
    pub loading: bool,
    /// An explicit save is in progress
    pub saving: bool,
    /// The acting role
    pub role: Option<Role>,
}

/// Immutable view of the store at one generation
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    generation: u64,
    state: StoreState,
    sorted: Vec<StepInstance>,
    completed_count: usize,
}

impl Snapshot {
    fn derive(generation: u64, state: StoreState) -> Self {
        let mut sorted = state
            .workflow
            .as_ref()
            .map(|wf| wf.steps.clone())
            .unwrap_or_default();
        sorted.sort_by_key(|s| s.step_order);
        let completed_count = sorted
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count();

        Self {
            generation,
            state,
            sorted,
            completed_count,
        }
    }

    /// Generation number of this snapshot
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The loaded workflow
    pub fn workflow(&self) -> Option<&WorkflowInstance> {
        self.state.workflow.as_ref()
    }

    /// The loaded entity record
    pub fn entity(&self) -> Option<&EntityRecord> {
        self.state.entity.as_ref()
    }

    /// The current step key
    pub fn current_step_id(&self) -> Option<&StepKey> {
        self.state.current_step_id.as_ref()
    }

    /// Whether a load is in progress
    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    /// Whether an explicit save is in progress
    pub fn is_saving(&self) -> bool {
        self.state.saving
    }

    /// The acting role
    pub fn role(&self) -> Option<Role> {
        self.state.role
    }

    /// Steps sorted by `step_order`
    pub fn sorted_steps(&self) -> &[StepInstance] {
        &self.sorted
    }

    /// Look up a step
    pub fn step(&self, key: &StepKey) -> Option<&StepInstance> {
        self.sorted.iter().find(|s| &s.step_id == key)
    }

    /// Data of a step
    pub fn step_data(&self, key: &StepKey) -> Option<&StepPayload> {
        self.step(key).map(|s| &s.data)
    }

    /// The current step instance
    pub fn current_step(&self) -> Option<&StepInstance> {
        self.state.current_step_id.as_ref().and_then(|k| self.step(k))
    }

    /// Number of completed steps
    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    /// Fraction of completed steps in `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        if self.sorted.is_empty() {
            0.0
        } else {
            self.completed_count as f64 / self.sorted.len() as f64
        }
    }

    /// Progress as a rounded percentage
    pub fn progress_percent(&self) -> u8 {
        (self.progress() * 100.0).round() as u8
    }

    /// The current step excludes the acting role
    pub fn is_current_step_role_restricted(&self) -> bool {
        self.current_step()
            .map(|s| s.is_role_restricted(self.state.role))
            .unwrap_or(false)
    }

    /// The workflow reached its terminal status
    pub fn is_workflow_submitted(&self) -> bool {
        self.workflow()
            .map(|wf| wf.status == WorkflowStatus::Completed)
            .unwrap_or(false)
    }

    fn current_index(&self) -> Option<usize> {
        let key = self.state.current_step_id.as_ref()?;
        self.sorted.iter().position(|s| &s.step_id == key)
    }

    /// Whether the current step is the first in order
    pub fn is_first_step(&self) -> bool {
        self.current_index() == Some(0)
    }

    /// Whether the current step is the last in order
    pub fn is_last_step(&self) -> bool {
        match self.current_index() {
            Some(i) => i + 1 == self.sorted.len(),
            None => false,
        }
    }

    /// Step before the current one in sorted order
    pub fn previous_step_id(&self) -> Option<&StepKey> {
        let i = self.current_index()?;
        i.checked_sub(1)
            .and_then(|p| self.sorted.get(p))
            .map(|s| &s.step_id)
    }

    /// Step after the current one in sorted order
    pub fn next_step_id(&self) -> Option<&StepKey> {
        let i = self.current_index()?;
        self.sorted.get(i + 1).map(|s| &s.step_id)
    }
}

/// The workflow state store
#[derive(Debug)]
pub struct WorkflowStore {
    current: Arc<Snapshot>,
    publisher: watch::Sender<Arc<Snapshot>>,
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowStore {
    /// Create an empty store at generation zero
    pub fn new() -> Self {
        let current = Arc::new(Snapshot::default());
        let (publisher, _) = watch::channel(current.clone());
        Self { current, publisher }
    }

    /// The latest snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.clone()
    }

    /// Current generation number
    pub fn generation(&self) -> u64 {
        self.current.generation
    }

    /// Subscribe to published snapshots
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.publisher.subscribe()
    }

    fn publish(&mut self, state: StoreState) {
        let generation = self.current.generation + 1;
        let snapshot = Arc::new(Snapshot::derive(generation, state));
        trace!(generation, "Publishing workflow store snapshot");
        self.current = snapshot.clone();
        self.publisher.send_replace(snapshot);
    }

    fn mutate(&mut self, f: impl FnOnce(&mut StoreState)) {
        let mut state = self.current.state.clone();
        f(&mut state);
        self.publish(state);
    }

    fn mutate_step(
        &mut self,
        key: &StepKey,
        f: impl FnOnce(&mut StepInstance),
    ) -> Result<(), CoreError> {
        let mut state = self.current.state.clone();
        let workflow = state
            .workflow
            .as_mut()
            .ok_or_else(|| CoreError::WorkflowNotFound("no workflow loaded".to_string()))?;
        let step = workflow
            .steps
            .iter_mut()
            .find(|s| &s.step_id == key)
            .ok_or_else(|| CoreError::StepNotFound(key.0.clone()))?;
        f(step);
        self.publish(state);
        Ok(())
    }

    /// Replace the workflow; its `current_step_id` is adopted when set
    pub fn set_workflow(&mut self, workflow: Option<WorkflowInstance>) {
        self.mutate(|state| {
            if let Some(current) = workflow.as_ref().and_then(|wf| wf.current_step_id.clone()) {
                state.current_step_id = Some(current);
            }
            state.workflow = workflow;
        });
    }

    /// Replace the entity record
    pub fn set_entity(&mut self, entity: Option<EntityRecord>) {
        self.mutate(|state| state.entity = entity);
    }

    /// Point the store at a step; the step must belong to the loaded workflow
    pub fn set_current_step(&mut self, key: Option<StepKey>) -> Result<(), CoreError> {
        if let (Some(k), Some(wf)) = (key.as_ref(), self.current.workflow()) {
            if wf.step(k).is_none() {
                return Err(CoreError::StepNotFound(k.0.clone()));
            }
        }
        self.mutate(|state| state.current_step_id = key);
        Ok(())
    }

    /// Set the loading flag
    pub fn set_loading(&mut self, loading: bool) {
        self.mutate(|state| state.loading = loading);
    }

    /// Set the saving flag
    pub fn set_saving(&mut self, saving: bool) {
        self.mutate(|state| state.saving = saving);
    }

    /// Set the acting role
    pub fn set_role(&mut self, role: Option<Role>) {
        self.mutate(|state| state.role = role);
    }

    /// Replace a step's data wholesale
    pub fn update_step_data(&mut self, key: &StepKey, data: StepPayload) -> Result<(), CoreError> {
        self.mutate_step(key, |step| step.data = data)
    }

    /// Set a step's status
    pub fn update_step_status(&mut self, key: &StepKey, status: StepStatus) -> Result<(), CoreError> {
        self.mutate_step(key, |step| step.status = status)
    }

    /// Set the workflow's overall status
    pub fn update_workflow_status(&mut self, status: WorkflowStatus) -> Result<(), CoreError> {
        let mut state = self.current.state.clone();
        let workflow = state
            .workflow
            .as_mut()
            .ok_or_else(|| CoreError::WorkflowNotFound("no workflow loaded".to_string()))?;
        workflow.status = status;
        self.publish(state);
        Ok(())
    }

    /// Clear workflow, entity and current step, keeping the role
    pub fn reset(&mut self) {
        self.mutate(|state| {
            let role = state.role;
            *state = StoreState {
                role,
                ..StoreState::default()
            };
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow_definition::WorkflowDefinition;
    use crate::EntityId;
    use serde_json::json;

    fn loaded_store() -> WorkflowStore {
        let mut wf = WorkflowDefinition::group_setup()
            .instantiate(EntityId::from("client-1"))
            .unwrap();
        wf.start_online().unwrap();
        let mut store = WorkflowStore::new();
        store.set_workflow(Some(wf));
        store
    }

    #[test]
    fn test_set_workflow_adopts_current_step() {
        let store = loaded_store();
        let snap = store.snapshot();
        assert_eq!(snap.current_step_id(), Some(&StepKey::from("licensing")));
        assert_eq!(snap.sorted_steps().len(), 10);
        assert!(snap.is_first_step());
        assert!(!snap.is_last_step());
        assert_eq!(snap.previous_step_id(), None);
        assert_eq!(snap.next_step_id(), Some(&StepKey::from("company_info")));
    }

    #[test]
    fn test_generation_increases_on_every_mutation() {
        let mut store = WorkflowStore::new();
        assert_eq!(store.generation(), 0);
        store.set_loading(true);
        store.set_loading(false);
        store.set_role(Some(Role::Broker));
        assert_eq!(store.generation(), 3);
    }

    #[test]
    fn test_old_snapshots_are_immutable() {
        let mut store = loaded_store();
        let before = store.snapshot();
        store
            .update_step_data(&StepKey::from("licensing"), StepPayload::new(json!({"a": 1})))
            .unwrap();
        assert!(before.step_data(&StepKey::from("licensing")).unwrap().is_empty());
        assert_eq!(
            store.snapshot().step_data(&StepKey::from("licensing")).unwrap().as_value(),
            &json!({"a": 1})
        );
    }

    #[test]
    fn test_progress_derivations() {
        let mut store = loaded_store();
        for key in ["licensing", "company_info"] {
            store
                .update_step_status(&StepKey::from(key), StepStatus::Completed)
                .unwrap();
        }
        store
            .update_step_status(&StepKey::from("risk_assessment"), StepStatus::Skipped)
            .unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.completed_count(), 2);
        assert!((snap.progress() - 0.2).abs() < f64::EPSILON);
        assert_eq!(snap.progress_percent(), 20);
    }

    #[test]
    fn test_role_restriction_of_current_step() {
        let mut store = loaded_store();
        store.set_role(Some(Role::Broker));
        store
            .set_current_step(Some(StepKey::from("authorization")))
            .unwrap();
        assert!(store.snapshot().is_current_step_role_restricted());

        store.set_role(Some(Role::Employer));
        assert!(!store.snapshot().is_current_step_role_restricted());
    }

    #[test]
    fn test_submitted_and_last_step() {
        let mut store = loaded_store();
        store
            .set_current_step(Some(StepKey::from("master_app")))
            .unwrap();
        assert!(store.snapshot().is_last_step());
        assert!(!store.snapshot().is_workflow_submitted());

        store.update_workflow_status(WorkflowStatus::Completed).unwrap();
        assert!(store.snapshot().is_workflow_submitted());
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        let mut store = loaded_store();
        let generation = store.generation();
        assert!(store.set_current_step(Some(StepKey::from("nope"))).is_err());
        assert!(store
            .update_step_status(&StepKey::from("nope"), StepStatus::Completed)
            .is_err());
        assert_eq!(store.generation(), generation);

        let mut empty = WorkflowStore::new();
        assert!(matches!(
            empty.update_workflow_status(WorkflowStatus::Completed),
            Err(CoreError::WorkflowNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_subscribers_observe_published_snapshots() {
        let mut store = WorkflowStore::new();
        let mut rx = store.subscribe();

        store.set_role(Some(Role::Employer));

        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.generation(), 1);
        assert_eq!(snap.role(), Some(Role::Employer));
    }

    #[test]
    fn test_reset_keeps_role() {
        let mut store = loaded_store();
        store.set_role(Some(Role::Ga));
        store.reset();
        let snap = store.snapshot();
        assert!(snap.workflow().is_none());
        assert!(snap.current_step_id().is_none());
        assert_eq!(snap.role(), Some(Role::Ga));
    }
}
