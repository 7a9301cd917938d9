//! Enrollment harness: an orchestrator on top of the in-memory backend.

use std::sync::Arc;

use groupsetup_core::testing::RecordingNotifier;
use groupsetup_core::{
    CompleteOutcome, EngineConfig, EntityId, LoadOutcome, MasterAppOutcome, Orchestrator, Role,
    SetupMode, StepKey, StepRegistry, SubmissionPayload, WorkflowDefinition,
};
use groupsetup_state_inmemory::InMemoryStateStoreProvider;
use groupsetup_steps::standard_registry;
use tracing::debug;

use crate::data_generators::{create_complete_payload, create_employer_contact, create_entity};
use crate::error::TestError;

/// Builder for [`TestEnrollment`]
pub struct TestEnrollmentBuilder {
    entity_id: String,
    role: Role,
    with_contact: bool,
    config: EngineConfig,
    registry: Option<StepRegistry>,
    definition: WorkflowDefinition,
}

impl TestEnrollmentBuilder {
    pub fn new(entity_id: &str) -> Self {
        let config = EngineConfig {
            master_app_countdown_seconds: 3,
            countdown_tick_ms: 10,
            ..EngineConfig::default()
        };
        Self {
            entity_id: entity_id.to_string(),
            role: Role::Broker,
            with_contact: true,
            config,
            registry: None,
            definition: WorkflowDefinition::group_setup(),
        }
    }

    /// Initial acting role
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Register the entity without an employer contact
    pub fn without_contact(mut self) -> Self {
        self.with_contact = false;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the standard step registry
    pub fn registry(mut self, registry: StepRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub async fn build(self) -> TestEnrollment {
        let provider = InMemoryStateStoreProvider::with_definition(self.definition.clone());
        let contact = self.with_contact.then(create_employer_contact);
        provider
            .register_entity(create_entity(&self.entity_id), contact)
            .await;

        let (repository, _) = provider.create_repositories();
        let notifier = RecordingNotifier::new();
        let orchestrator = Orchestrator::new(
            repository,
            Arc::new(notifier.clone()),
            self.registry.unwrap_or_else(standard_registry),
            self.definition,
            self.config,
        )
        .with_role(self.role);

        TestEnrollment {
            provider,
            orchestrator,
            notifier,
            entity_id: EntityId::from(self.entity_id.as_str()),
        }
    }
}

/// A single enrollment session under test
pub struct TestEnrollment {
    pub provider: InMemoryStateStoreProvider,
    pub orchestrator: Orchestrator,
    pub notifier: RecordingNotifier,
    pub entity_id: EntityId,
}

impl TestEnrollment {
    /// Start group setup and load the workflow
    pub async fn start(&mut self, mode: SetupMode) -> LoadOutcome {
        self.orchestrator.start(self.entity_id.clone(), mode).await
    }

    /// Key of the active step
    pub fn active_step(&self) -> Result<StepKey, TestError> {
        self.orchestrator
            .active_step()
            .cloned()
            .ok_or(TestError::NoActiveStep)
    }

    /// Switch to a role allowed to act on the active step, if the current one is not
    pub fn act_as_owner(&mut self) -> Result<(), TestError> {
        let step_id = self.active_step()?;
        let allowed = self
            .orchestrator
            .definition()
            .step(&step_id)
            .map(|s| s.allowed_roles.clone())
            .unwrap_or_default();
        let current = self.orchestrator.snapshot().role();

        if let Some(first) = allowed.first() {
            if !current.is_some_and(|role| allowed.contains(&role)) {
                debug!(step_id = %step_id, role = %first, "Switching role");
                self.orchestrator.set_role(Some(*first));
            }
        }
        Ok(())
    }

    /// Load the active step's sample payload into its module
    pub fn fill_active_step(&mut self) -> Result<(), TestError> {
        let step_id = self.active_step()?;
        let payload = create_complete_payload(&step_id.0)
            .ok_or_else(|| TestError::NoSampleData(step_id.0.clone()))?;
        let module = self
            .orchestrator
            .active_module_mut()
            .ok_or(TestError::NoActiveStep)?;
        module.load(&payload)?;
        Ok(())
    }

    /// Fill and complete the active step as its owner
    pub async fn complete_active_step(&mut self) -> Result<CompleteOutcome, TestError> {
        self.act_as_owner()?;
        self.fill_active_step()?;

        let step_id = self.active_step()?;
        if step_id.0 == "master_app" {
            match self.orchestrator.submit_master_application().await {
                MasterAppOutcome::Signed(mut countdown) => countdown.finished().await,
                other => return Err(TestError::unexpected(&step_id.0, other)),
            }
        }
        Ok(self.orchestrator.complete().await)
    }

    /// Complete steps in order until `target` is active
    pub async fn advance_to(&mut self, target: &str) -> Result<(), TestError> {
        while self.active_step()?.0 != target {
            let step_id = self.active_step()?;
            match self.complete_active_step().await? {
                CompleteOutcome::Advanced { .. } => {}
                other => return Err(TestError::unexpected(&step_id.0, other)),
            }
        }
        Ok(())
    }

    /// Complete every remaining step and return the submission
    pub async fn run_to_submission(&mut self) -> Result<SubmissionPayload, TestError> {
        loop {
            let step_id = self.active_step()?;
            match self.complete_active_step().await? {
                CompleteOutcome::Advanced { .. } => {}
                CompleteOutcome::Submitted(payload) => return Ok(payload),
                other => return Err(TestError::unexpected(&step_id.0, other)),
            }
        }
    }
}
