//! The Group Setup orchestrator
//!
//! Owns the workflow store, the active step module and the navigation state
//! machine:
//!
//! ```text
//! Idle -> Loading -> Ready(step) -> Navigating(from -> to) -> Ready(step)
//!                      |                 ^
//!                      v                 |
//!                 Blocked(errors) -------+   (successful retry)
//! Loading -> Offline          Ready(last) -> Submitted
//! ```
//!
//! Every failure ends at the [`Notifier`] and in the observable state; no
//! operation returns an error to the caller.

use crate::application::prerequisites::{PrerequisiteBanner, PrerequisiteSet};
use crate::application::step_registry::{ModuleResolution, StepRegistry};
use crate::application::submission::{Countdown, PhaseFailure, SubmissionPipeline};
use crate::application::workflow_store::{Snapshot, WorkflowStore};
use crate::domain::progression::{compute_progress, StepProgress};
use crate::domain::repository::{SetupMode, SubmissionPayload, WorkflowRepository};
use crate::domain::step::{StepContext, StepModule};
use crate::domain::workflow_definition::WorkflowDefinition;
use crate::domain::workflow_instance::{EntityId, StepInstance, StepKey, StepStatus, WorkflowStatus};
use crate::{CoreError, EngineConfig, HandoffReceipt, Role, StepPayload};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// User-facing notification sink
pub trait Notifier: Send + Sync {
    /// Success toast
    fn success(&self, message: &str);

    /// Error toast
    fn error(&self, message: &str);

    /// Informational notice
    fn info(&self, message: &str) {
        let _ = message;
    }
}

/// Notifier that writes every notification to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(notice = "success", "{}", message);
    }

    fn error(&self, message: &str) {
        warn!(notice = "error", "{}", message);
    }

    fn info(&self, message: &str) {
        info!(notice = "info", "{}", message);
    }
}

/// Observable orchestrator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Nothing loaded
    Idle,
    /// Fetching the workflow
    Loading,
    /// A step is active
    Ready(StepKey),
    /// Switching steps
    Navigating {
        /// Outgoing step, if any
        from: Option<StepKey>,
        /// Incoming step
        to: StepKey,
    },
    /// Completion was refused; the pointer did not move
    Blocked {
        /// The step that failed to complete
        step_id: StepKey,
        /// Reasons to display
        errors: Vec<String>,
    },
    /// The workflow is on the offline packet track
    Offline,
    /// The workflow has been submitted
    Submitted,
}

/// Why an operation was not attempted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refusal {
    /// No workflow loaded
    NotLoaded,
    /// No step module is active
    NoActiveStep,
    /// The workflow is already submitted
    WorkflowSubmitted,
    /// The acting role may not act on the current step
    RoleRestricted,
    /// Handoff requested on a step the role may act on
    NotRoleRestricted,
    /// Handoff already sent this session
    HandoffAlreadySent,
    /// The target is locked behind an unfinished step
    Locked {
        /// Requested step
        step_id: StepKey,
        /// Display name of the blocking step
        reason: Option<String>,
    },
    /// The step does not belong to the workflow
    UnknownStep(StepKey),
    /// Already at the first step
    AtFirstStep,
    /// The workflow is on the offline packet track; steps are not navigable
    OfflineTrack,
}

/// Result of loading a workflow
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The given step is active
    Ready(StepKey),
    /// Redirected to the offline packet track
    Offline,
    /// The workflow has no steps
    Empty,
    /// The workflow could not be fetched
    Failed(CoreError),
}

/// Result of a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateOutcome {
    /// The step module was activated
    Activated(StepKey),
    /// The step has no module; the content area stays empty
    NotImplemented(StepKey),
    /// Navigation was not attempted
    Refused(Refusal),
}

/// Result of an explicit save
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Persisted
    Saved,
    /// Save was a no-op
    Refused(Refusal),
    /// The collaborator failed
    Failed(CoreError),
}

/// Result of a completion attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CompleteOutcome {
    /// The step was completed and the next one activated
    Advanced {
        /// The completed step
        completed: StepKey,
        /// The server designated next step
        next: StepKey,
    },
    /// The step is invalid
    Blocked(Vec<String>),
    /// Another step must be fixed first
    PrerequisitesUnmet(PrerequisiteBanner),
    /// The final step was completed and the workflow submitted
    Submitted(SubmissionPayload),
    /// A pipeline phase failed
    Failed(PhaseFailure),
    /// Completion was not attempted
    Refused(Refusal),
}

/// Result of a skip
#[derive(Debug, Clone, PartialEq)]
pub enum SkipOutcome {
    /// The step was skipped
    Skipped {
        /// The skipped step
        skipped: StepKey,
        /// The step now active, if any
        next: Option<StepKey>,
    },
    /// Skip was not attempted
    Refused(Refusal),
    /// The collaborator failed
    Failed(CoreError),
}

/// Result of a handoff request
#[derive(Debug, Clone, PartialEq)]
pub enum HandoffOutcome {
    /// The employer was notified
    Sent(HandoffReceipt),
    /// Handoff was not attempted
    Refused(Refusal),
    /// The collaborator failed
    Failed(CoreError),
}

/// Result of a master application submission
#[derive(Debug)]
pub enum MasterAppOutcome {
    /// Signed and committed; proceed once the countdown finishes
    Signed(Countdown),
    /// A pipeline phase failed or the signature is missing
    Failed(PhaseFailure),
    /// Submission was not attempted
    Refused(Refusal),
}

/// Drives one Group Setup session
pub struct Orchestrator {
    /// Workflow persistence
    repository: Arc<dyn WorkflowRepository>,

    /// Notification sink
    notifier: Arc<dyn Notifier>,

    /// Step module registry
    registry: StepRegistry,

    /// Step sequence
    definition: Arc<WorkflowDefinition>,

    /// Cross-step rules
    prerequisites: PrerequisiteSet,

    /// Engine configuration
    config: EngineConfig,

    /// The workflow projection
    store: WorkflowStore,

    /// Loaded entity
    entity_id: Option<EntityId>,

    /// Navigation state
    state: OrchestratorState,

    /// The active step module
    active: Option<(StepKey, Box<dyn StepModule>)>,

    /// Notice for a step without a module
    not_implemented: Option<String>,

    /// Banner of the last prerequisite check
    banner: Option<PrerequisiteBanner>,

    /// Background saves, at most one chain per step
    in_flight: HashMap<StepKey, JoinHandle<()>>,

    /// Employer already notified this session
    handoff_sent: bool,

    /// Edit-step requests from step modules
    edit_tx: mpsc::UnboundedSender<StepKey>,
    edit_rx: mpsc::UnboundedReceiver<StepKey>,

    /// Payload of a successful submission
    submission: Option<SubmissionPayload>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("entity_id", &self.entity_id)
            .field("state", &self.state)
            .field("active", &self.active.as_ref().map(|(k, _)| k))
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator with the standard prerequisite rules
    pub fn new(
        repository: Arc<dyn WorkflowRepository>,
        notifier: Arc<dyn Notifier>,
        registry: StepRegistry,
        definition: WorkflowDefinition,
        config: EngineConfig,
    ) -> Self {
        let (edit_tx, edit_rx) = mpsc::unbounded_channel();
        Self {
            repository,
            notifier,
            registry,
            definition: Arc::new(definition),
            prerequisites: PrerequisiteSet::standard(),
            config,
            store: WorkflowStore::new(),
            entity_id: None,
            state: OrchestratorState::Idle,
            active: None,
            not_implemented: None,
            banner: None,
            in_flight: HashMap::new(),
            handoff_sent: false,
            edit_tx,
            edit_rx,
            submission: None,
        }
    }

    /// Replace the prerequisite rules
    pub fn with_prerequisites(mut self, prerequisites: PrerequisiteSet) -> Self {
        self.prerequisites = prerequisites;
        self
    }

    /// Set the acting role
    pub fn with_role(mut self, role: Role) -> Self {
        self.store.set_role(Some(role));
        self
    }

    /// Change the acting role
    pub fn set_role(&mut self, role: Option<Role>) {
        self.store.set_role(role);
    }

    /// Navigation state
    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    /// The store
    pub fn store(&self) -> &WorkflowStore {
        &self.store
    }

    /// Latest store snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    /// Subscribe to store snapshots
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.store.subscribe()
    }

    /// The workflow definition
    pub fn definition(&self) -> &WorkflowDefinition {
        &self.definition
    }

    /// Key of the active step module
    pub fn active_step(&self) -> Option<&StepKey> {
        self.active.as_ref().map(|(key, _)| key)
    }

    /// The active step module
    pub fn active_module(&self) -> Option<&dyn StepModule> {
        self.active.as_ref().map(|(_, module)| &**module)
    }

    /// The active step module, for editing
    pub fn active_module_mut(&mut self) -> Option<&mut (dyn StepModule + 'static)> {
        self.active.as_mut().map(|(_, module)| &mut **module)
    }

    /// Notice shown when the current step has no module
    pub fn not_implemented_notice(&self) -> Option<&str> {
        self.not_implemented.as_deref()
    }

    /// Banner from the last prerequisite check
    pub fn banner(&self) -> Option<&PrerequisiteBanner> {
        self.banner.as_ref()
    }

    /// Whether the employer was notified this session
    pub fn handoff_sent(&self) -> bool {
        self.handoff_sent
    }

    /// Payload of a successful submission
    pub fn submission(&self) -> Option<&SubmissionPayload> {
        self.submission.as_ref()
    }

    /// Steps with a background save still running, sorted
    pub fn in_flight_steps(&mut self) -> Vec<StepKey> {
        self.in_flight.retain(|_, handle| !handle.is_finished());
        let mut keys: Vec<StepKey> = self.in_flight.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Navigation state of every step
    pub fn progress(&self) -> Vec<StepProgress> {
        let snapshot = self.store.snapshot();
        let sorted: Vec<&StepInstance> = snapshot.sorted_steps().iter().collect();
        compute_progress(&sorted, &self.definition, snapshot.role())
    }

    /// Wait for every background save
    pub async fn settle(&mut self) {
        let pending: Vec<(StepKey, JoinHandle<()>)> = self.in_flight.drain().collect();
        for (step_id, handle) in pending {
            if let Err(e) = handle.await {
                error!(step_id = %step_id, error = %e, "Background save task failed");
            }
        }
    }

    async fn await_in_flight(&mut self, step_id: &StepKey) {
        if let Some(handle) = self.in_flight.remove(step_id) {
            debug!(step_id = %step_id, "Waiting for in-flight save");
            if let Err(e) = handle.await {
                error!(step_id = %step_id, error = %e, "Background save task failed");
            }
        }
    }

    /// Queue a background save behind any earlier save of the same step
    fn spawn_save(&mut self, entity_id: EntityId, step_id: StepKey, payload: StepPayload) {
        let previous = self.in_flight.remove(&step_id);
        let repository = self.repository.clone();
        let notifier = self.notifier.clone();
        let fallback = self.config.messages.save_failed.clone();
        let key = step_id.clone();

        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            debug!(entity_id = %entity_id, step_id = %key, "Saving step data before navigation");
            if let Err(e) = repository.save_step_data(&entity_id, &key, payload).await {
                warn!(entity_id = %entity_id, step_id = %key, error = %e, "Background save failed");
                notifier.error(&e.user_message(&fallback));
            }
        });
        self.in_flight.insert(step_id, handle);
    }

    /// True once the workflow left step navigation for the offline packet
    fn is_offline_track(&self) -> bool {
        self.state == OrchestratorState::Offline
            || self
                .store
                .snapshot()
                .workflow()
                .map(|w| w.is_offline_track())
                .unwrap_or(false)
    }

    /// Lock of a step: `None` when unlocked, otherwise the blocking step's name
    fn lock_of(&self, step_id: &StepKey) -> Option<Option<String>> {
        self.progress()
            .into_iter()
            .find(|p| p.step_id == *step_id && p.locked)
            .map(|p| p.lock_reason)
    }

    /// Current step the user may edit, or why not
    fn editable_step(&self) -> Result<StepKey, Refusal> {
        let snapshot = self.store.snapshot();
        if snapshot.workflow().is_none() {
            return Err(Refusal::NotLoaded);
        }
        if self.is_offline_track() {
            return Err(Refusal::OfflineTrack);
        }
        let step = snapshot.current_step().ok_or(Refusal::NoActiveStep)?;
        if snapshot.is_workflow_submitted() {
            return Err(Refusal::WorkflowSubmitted);
        }
        if step.is_role_restricted(snapshot.role()) {
            return Err(Refusal::RoleRestricted);
        }
        // Persisting a pending step would unlock it
        if let Some(reason) = self.lock_of(&step.step_id) {
            return Err(Refusal::Locked {
                step_id: step.step_id.clone(),
                reason,
            });
        }
        Ok(step.step_id.clone())
    }

    fn loaded_entity(&self) -> Result<EntityId, Refusal> {
        self.entity_id.clone().ok_or(Refusal::NotLoaded)
    }

    /// Create the workflow for an entity, then load it
    pub async fn start(&mut self, entity_id: EntityId, mode: SetupMode) -> LoadOutcome {
        info!(entity_id = %entity_id, ?mode, "Starting group setup");
        if let Err(e) = self.repository.start_setup(&entity_id, mode).await {
            error!(entity_id = %entity_id, error = %e, "Failed to start group setup");
            self.notifier
                .error(&e.user_message(&self.config.messages.load_failed));
            return LoadOutcome::Failed(e);
        }
        self.load(entity_id, None).await
    }

    /// Load the workflow of an entity and activate a step
    pub async fn load(&mut self, entity_id: EntityId, requested: Option<StepKey>) -> LoadOutcome {
        // Earlier saves must land before another session starts
        self.settle().await;
        self.active = None;
        self.not_implemented = None;
        self.banner = None;
        self.handoff_sent = false;
        self.submission = None;
        self.store.reset();

        self.state = OrchestratorState::Loading;
        self.store.set_loading(true);
        debug!(entity_id = %entity_id, "Loading workflow");

        let mut workflow = match self.repository.load_workflow(&entity_id).await {
            Ok(workflow) => workflow,
            Err(e) => {
                error!(entity_id = %entity_id, error = %e, "Failed to load workflow");
                self.notifier
                    .error(&e.user_message(&self.config.messages.load_failed));
                self.store.set_loading(false);
                self.state = OrchestratorState::Idle;
                self.entity_id = None;
                return LoadOutcome::Failed(e);
            }
        };
        self.entity_id = Some(entity_id.clone());

        match self.repository.load_entity(&entity_id).await {
            Ok(entity) => self.store.set_entity(Some(entity)),
            Err(e) => warn!(entity_id = %entity_id, error = %e, "Entity record unavailable"),
        }

        // Offline workflows never enter step navigation
        if workflow.is_offline_track() {
            info!(entity_id = %entity_id, status = ?workflow.status, "Redirecting to offline packet");
            self.store.set_workflow(Some(workflow));
            self.store.set_loading(false);
            self.state = OrchestratorState::Offline;
            return LoadOutcome::Offline;
        }

        self.definition.enrich(&mut workflow);
        self.store.set_workflow(Some(workflow));
        self.store.set_loading(false);

        let snapshot = self.store.snapshot();
        let requested = requested.filter(|key| match self.lock_of(key) {
            Some(reason) => {
                warn!(entity_id = %entity_id, step_id = %key, ?reason, "Requested step is locked");
                false
            }
            None => true,
        });
        let target = requested
            .filter(|key| snapshot.step(key).is_some())
            .or_else(|| snapshot.current_step_id().cloned())
            .or_else(|| snapshot.sorted_steps().first().map(|s| s.step_id.clone()));
        let Some(target) = target else {
            warn!(entity_id = %entity_id, "Workflow has no steps");
            self.state = OrchestratorState::Idle;
            return LoadOutcome::Empty;
        };

        self.activate(target.clone()).await;
        if snapshot.is_workflow_submitted() {
            self.state = OrchestratorState::Submitted;
        }
        info!(entity_id = %entity_id, step_id = %target, "Workflow loaded");
        LoadOutcome::Ready(target)
    }

    /// Resolve and activate a step module; the outgoing step must already be persisted
    async fn activate(&mut self, target: StepKey) -> NavigateOutcome {
        if let Err(e) = self.store.set_current_step(Some(target.clone())) {
            warn!(step_id = %target, error = %e, "Cannot activate unknown step");
            return NavigateOutcome::Refused(Refusal::UnknownStep(target));
        }
        self.active = None;
        self.not_implemented = None;
        self.banner = None;

        match self.registry.resolve(&target).await {
            ModuleResolution::Loaded(mut module) => {
                let snapshot = self.store.snapshot();
                let payload = snapshot.step_data(&target).cloned().unwrap_or_default();
                if let Err(e) = module.load(&payload) {
                    warn!(step_id = %target, error = %e, "Saved step data could not be restored");
                }
                if let Some(workflow) = snapshot.workflow() {
                    module.attach_context(&StepContext::from_workflow(workflow));
                }
                module.attach_edit_requests(self.edit_tx.clone());

                debug!(step_id = %target, "Step module activated");
                self.active = Some((target.clone(), module));
                self.state = OrchestratorState::Ready(target.clone());
                NavigateOutcome::Activated(target)
            }
            ModuleResolution::NotRegistered(_) | ModuleResolution::Failed { .. } => {
                let notice = format!("Step \"{}\" is not yet implemented", target);
                self.notifier.info(&notice);
                self.not_implemented = Some(notice);
                self.state = OrchestratorState::Ready(target.clone());
                NavigateOutcome::NotImplemented(target)
            }
        }
    }

    /// Persist the outgoing step in the background and switch to `target`
    pub async fn navigate(&mut self, target: StepKey) -> NavigateOutcome {
        let snapshot = self.store.snapshot();
        if snapshot.workflow().is_none() {
            return NavigateOutcome::Refused(Refusal::NotLoaded);
        }
        if self.is_offline_track() {
            return NavigateOutcome::Refused(Refusal::OfflineTrack);
        }
        if snapshot.step(&target).is_none() {
            return NavigateOutcome::Refused(Refusal::UnknownStep(target));
        }

        let from = self.active.as_ref().map(|(key, _)| key.clone());
        self.state = OrchestratorState::Navigating {
            from: from.clone(),
            to: target.clone(),
        };

        // Save-before-navigate: issued before the next module is activated
        if let (Some((key, module)), Some(entity_id)) = (self.active.as_ref(), self.entity_id.clone()) {
            let restricted = snapshot
                .step(key)
                .map(|s| s.is_role_restricted(snapshot.role()))
                .unwrap_or(true);
            let locked = self.lock_of(key).is_some();
            if !snapshot.is_workflow_submitted() && !restricted && !locked {
                let key = key.clone();
                let payload = module.get_data();
                if let Err(e) = self.store.update_step_data(&key, payload.clone()) {
                    warn!(step_id = %key, error = %e, "Optimistic update failed");
                }
                self.spawn_save(entity_id, key, payload);
            }
        }

        debug!(from = ?from, to = %target, "Navigating");
        self.activate(target).await
    }

    /// Navigate from the sidebar; locked steps are refused
    pub async fn select_step(&mut self, target: StepKey) -> NavigateOutcome {
        if self.is_offline_track() {
            return NavigateOutcome::Refused(Refusal::OfflineTrack);
        }
        if let Some(reason) = self.lock_of(&target) {
            return NavigateOutcome::Refused(Refusal::Locked {
                step_id: target,
                reason,
            });
        }
        self.navigate(target).await
    }

    /// Honour edit-step requests emitted by the active module
    pub async fn process_edit_requests(&mut self) -> Vec<NavigateOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(target) = self.edit_rx.try_recv() {
            debug!(step_id = %target, "Edit step requested");
            outcomes.push(self.navigate(target).await);
        }
        outcomes
    }

    /// Navigate to the preceding step in order
    pub async fn previous(&mut self) -> NavigateOutcome {
        let snapshot = self.store.snapshot();
        if snapshot.workflow().is_none() {
            return NavigateOutcome::Refused(Refusal::NotLoaded);
        }
        if self.is_offline_track() {
            return NavigateOutcome::Refused(Refusal::OfflineTrack);
        }
        match snapshot.previous_step_id() {
            Some(previous) => self.navigate(previous.clone()).await,
            None => NavigateOutcome::Refused(Refusal::AtFirstStep),
        }
    }

    /// Save draft: persist the active step without changing its status
    pub async fn save(&mut self) -> SaveOutcome {
        let step_id = match self.editable_step() {
            Ok(step_id) => step_id,
            Err(refusal) => return SaveOutcome::Refused(refusal),
        };
        let entity_id = match self.loaded_entity() {
            Ok(entity_id) => entity_id,
            Err(refusal) => return SaveOutcome::Refused(refusal),
        };
        let payload = match self.active.as_ref() {
            Some((key, module)) if *key == step_id => module.get_data(),
            _ => return SaveOutcome::Refused(Refusal::NoActiveStep),
        };

        if let Err(e) = self.store.update_step_data(&step_id, payload.clone()) {
            warn!(step_id = %step_id, error = %e, "Optimistic update failed");
        }
        self.store.set_saving(true);
        self.await_in_flight(&step_id).await;

        let result = self
            .repository
            .save_step_data(&entity_id, &step_id, payload)
            .await;
        self.store.set_saving(false);

        match result {
            Ok(()) => {
                info!(entity_id = %entity_id, step_id = %step_id, "Step saved");
                self.notifier.success(&self.config.messages.save_success);
                SaveOutcome::Saved
            }
            Err(e) => {
                error!(entity_id = %entity_id, step_id = %step_id, error = %e, "Save failed");
                self.notifier
                    .error(&e.user_message(&self.config.messages.save_failed));
                SaveOutcome::Failed(e)
            }
        }
    }

    /// Save & continue: validate, persist, complete and advance or submit
    pub async fn complete(&mut self) -> CompleteOutcome {
        let step_id = match self.editable_step() {
            Ok(step_id) => step_id,
            Err(refusal) => return CompleteOutcome::Refused(refusal),
        };
        let entity_id = match self.loaded_entity() {
            Ok(entity_id) => entity_id,
            Err(refusal) => return CompleteOutcome::Refused(refusal),
        };

        let (valid, errors, payload) = match self.active.as_mut() {
            Some((key, module)) if *key == step_id => {
                module.mark_forms_as_touched();
                let valid = module.is_valid();
                let errors = if valid {
                    Vec::new()
                } else {
                    module.validation_errors()
                };
                (valid, errors, module.get_data())
            }
            _ => return CompleteOutcome::Refused(Refusal::NoActiveStep),
        };

        // Validation never contacts a collaborator
        if !valid {
            let errors = if errors.is_empty() {
                vec![self.config.messages.generic_validation.clone()]
            } else {
                errors
            };
            warn!(step_id = %step_id, errors = errors.len(), "Step is not valid");
            self.state = OrchestratorState::Blocked {
                step_id,
                errors: errors.clone(),
            };
            return CompleteOutcome::Blocked(errors);
        }

        let snapshot = self.store.snapshot();
        if let Some(banner) = self.prerequisites.check(&step_id, &snapshot, &self.definition) {
            warn!(step_id = %step_id, blockers = banner.blockers.len(), "Prerequisites not met");
            self.banner = Some(banner.clone());
            self.state = OrchestratorState::Blocked {
                step_id,
                errors: banner.reasons(),
            };
            return CompleteOutcome::PrerequisitesUnmet(banner);
        }
        self.banner = None;

        if let Err(e) = self.store.update_step_data(&step_id, payload.clone()) {
            warn!(step_id = %step_id, error = %e, "Optimistic update failed");
        }
        self.await_in_flight(&step_id).await;

        let pipeline = SubmissionPipeline::new(self.repository.clone(), self.config.messages.clone());
        let committed = match pipeline.commit_step(&entity_id, &step_id, payload).await {
            Ok(committed) => committed,
            Err(failure) => {
                self.notifier.error(&failure.message);
                self.state = OrchestratorState::Ready(step_id);
                return CompleteOutcome::Failed(failure);
            }
        };

        if let Err(e) = self.store.update_step_status(&step_id, StepStatus::Completed) {
            warn!(step_id = %step_id, error = %e, "Local status update failed");
        }
        info!(entity_id = %entity_id, step_id = %step_id, "Step completed");

        if let Some(next) = committed.response.next_step_id {
            // The outgoing step was just persisted; activate without another save
            return match self.activate(next.clone()).await {
                NavigateOutcome::Refused(refusal) => {
                    warn!(step_id = %next, ?refusal, "Server designated an unknown next step");
                    self.state = OrchestratorState::Ready(step_id);
                    CompleteOutcome::Refused(refusal)
                }
                _ => CompleteOutcome::Advanced {
                    completed: step_id,
                    next,
                },
            };
        }

        match pipeline.submit(&entity_id).await {
            Ok(submission) => {
                if let Err(e) = self.store.update_workflow_status(WorkflowStatus::Completed) {
                    warn!(error = %e, "Local workflow status update failed");
                }
                self.notifier.success(&self.config.messages.submit_success);
                self.submission = Some(submission.clone());
                self.state = OrchestratorState::Submitted;
                CompleteOutcome::Submitted(submission)
            }
            Err(failure) => {
                self.notifier.error(&failure.message);
                self.state = OrchestratorState::Ready(step_id);
                CompleteOutcome::Failed(failure)
            }
        }
    }

    /// Skip the current step and advance in sorted order
    pub async fn skip(&mut self) -> SkipOutcome {
        let step_id = match self.editable_step() {
            Ok(step_id) => step_id,
            Err(refusal) => return SkipOutcome::Refused(refusal),
        };
        let entity_id = match self.loaded_entity() {
            Ok(entity_id) => entity_id,
            Err(refusal) => return SkipOutcome::Refused(refusal),
        };

        self.await_in_flight(&step_id).await;
        if let Err(e) = self.repository.skip_step(&entity_id, &step_id).await {
            error!(entity_id = %entity_id, step_id = %step_id, error = %e, "Skip failed");
            self.notifier
                .error(&e.user_message(&self.config.messages.skip_failed));
            return SkipOutcome::Failed(e);
        }

        if let Err(e) = self.store.update_step_status(&step_id, StepStatus::Skipped) {
            warn!(step_id = %step_id, error = %e, "Local status update failed");
        }
        info!(entity_id = %entity_id, step_id = %step_id, "Step skipped");

        let next = self.store.snapshot().next_step_id().cloned();
        if let Some(next) = next.clone() {
            self.activate(next).await;
        }
        SkipOutcome::Skipped {
            skipped: step_id,
            next,
        }
    }

    /// Notify the employer that the current step awaits them
    pub async fn request_handoff(&mut self) -> HandoffOutcome {
        let entity_id = match self.loaded_entity() {
            Ok(entity_id) => entity_id,
            Err(refusal) => return HandoffOutcome::Refused(refusal),
        };
        if self.is_offline_track() {
            return HandoffOutcome::Refused(Refusal::OfflineTrack);
        }
        if !self.store.snapshot().is_current_step_role_restricted() {
            return HandoffOutcome::Refused(Refusal::NotRoleRestricted);
        }
        if self.handoff_sent {
            return HandoffOutcome::Refused(Refusal::HandoffAlreadySent);
        }

        match self.repository.request_handoff(&entity_id).await {
            Ok(receipt) => {
                info!(entity_id = %entity_id, employer_email = %receipt.employer_email, "Employer notified");
                self.handoff_sent = true;
                self.notifier.success(&format!(
                    "Notification sent to {} ({})",
                    receipt.employer_name, receipt.employer_email
                ));
                HandoffOutcome::Sent(receipt)
            }
            Err(e) => {
                error!(entity_id = %entity_id, error = %e, "Handoff failed");
                self.notifier
                    .error(&e.user_message(&self.config.messages.handoff_failed));
                HandoffOutcome::Failed(e)
            }
        }
    }

    /// Sign and commit the master application, then start the pacing countdown
    pub async fn submit_master_application(&mut self) -> MasterAppOutcome {
        let step_id = match self.editable_step() {
            Ok(step_id) => step_id,
            Err(refusal) => return MasterAppOutcome::Refused(refusal),
        };
        let entity_id = match self.loaded_entity() {
            Ok(entity_id) => entity_id,
            Err(refusal) => return MasterAppOutcome::Refused(refusal),
        };
        let payload = match self.active.as_ref() {
            Some((key, module)) if *key == step_id => module.get_data(),
            _ => return MasterAppOutcome::Refused(Refusal::NoActiveStep),
        };

        let mut value = payload.into_value();
        if let Some(fields) = value.as_object_mut() {
            fields.insert("submitted".to_string(), serde_json::Value::Bool(true));
        }
        let payload = StepPayload::new(value);

        self.await_in_flight(&step_id).await;
        let pipeline = SubmissionPipeline::new(self.repository.clone(), self.config.messages.clone());
        if let Err(failure) = pipeline
            .commit_signed(&entity_id, &step_id, payload.clone())
            .await
        {
            self.notifier.error(&failure.message);
            return MasterAppOutcome::Failed(failure);
        }

        if let Some((_, module)) = self.active.as_mut() {
            if let Err(e) = module.load(&payload) {
                warn!(step_id = %step_id, error = %e, "Submitted application could not be reloaded");
            }
        }
        if let Err(e) = self.store.update_step_data(&step_id, payload) {
            warn!(step_id = %step_id, error = %e, "Optimistic update failed");
        }
        if let Err(e) = self.store.update_step_status(&step_id, StepStatus::Completed) {
            warn!(step_id = %step_id, error = %e, "Local status update failed");
        }
        info!(entity_id = %entity_id, step_id = %step_id, "Master application signed");

        MasterAppOutcome::Signed(Countdown::start(
            self.config.master_app_countdown_seconds,
            self.config.countdown_tick(),
        ))
    }
}
