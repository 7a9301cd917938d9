use crate::domain::workflow_instance::{EntityId, StepKey, WorkflowInstanceId};
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Domain event trait for all events in the system
pub trait DomainEvent: Debug + Send + Sync {
    /// Returns the type of the event as a string
    fn event_type(&self) -> &'static str;

    /// Returns the workflow instance ID this event is associated with
    fn workflow_instance_id(&self) -> &WorkflowInstanceId;

    /// Returns the timestamp when the event occurred
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Event: Group setup started (online or offline)
#[derive(Debug)]
pub struct GroupSetupStarted {
    /// The workflow instance that was created
    pub workflow_instance_id: WorkflowInstanceId,

    /// The enrolling entity
    pub entity_id: EntityId,

    /// Whether the offline intake path was chosen
    pub offline: bool,

    /// The timestamp when setup started
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for GroupSetupStarted {
    fn event_type(&self) -> &'static str {
        if self.offline {
            "group_setup.offline_chosen"
        } else {
            "group_setup.started"
        }
    }

    fn workflow_instance_id(&self) -> &WorkflowInstanceId {
        &self.workflow_instance_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Step data saved
#[derive(Debug)]
pub struct WorkflowStepSaved {
    /// The workflow instance
    pub workflow_instance_id: WorkflowInstanceId,

    /// The step whose data was replaced
    pub step_id: StepKey,

    /// The timestamp when the data was saved
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for WorkflowStepSaved {
    fn event_type(&self) -> &'static str {
        "workflow.step_saved"
    }

    fn workflow_instance_id(&self) -> &WorkflowInstanceId {
        &self.workflow_instance_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Step completed
#[derive(Debug)]
pub struct WorkflowStepCompleted {
    /// The workflow instance
    pub workflow_instance_id: WorkflowInstanceId,

    /// The completed step
    pub step_id: StepKey,

    /// The step designated as next, if any
    pub next_step_id: Option<StepKey>,

    /// The timestamp when the step was completed
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for WorkflowStepCompleted {
    fn event_type(&self) -> &'static str {
        "workflow.step_completed"
    }

    fn workflow_instance_id(&self) -> &WorkflowInstanceId {
        &self.workflow_instance_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Step skipped
#[derive(Debug)]
pub struct WorkflowStepSkipped {
    /// The workflow instance
    pub workflow_instance_id: WorkflowInstanceId,

    /// The skipped step
    pub step_id: StepKey,

    /// The timestamp when the step was skipped
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for WorkflowStepSkipped {
    fn event_type(&self) -> &'static str {
        "workflow.step_skipped"
    }

    fn workflow_instance_id(&self) -> &WorkflowInstanceId {
        &self.workflow_instance_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Workflow submitted downstream
#[derive(Debug)]
pub struct WorkflowSubmitted {
    /// The workflow instance
    pub workflow_instance_id: WorkflowInstanceId,

    /// The timestamp when the workflow was submitted
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for WorkflowSubmitted {
    fn event_type(&self) -> &'static str {
        "workflow.submitted"
    }

    fn workflow_instance_id(&self) -> &WorkflowInstanceId {
        &self.workflow_instance_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Employer handoff requested
#[derive(Debug)]
pub struct HandoffRequested {
    /// The workflow instance
    pub workflow_instance_id: WorkflowInstanceId,

    /// Address the notification was sent to
    pub employer_email: String,

    /// The timestamp when the handoff was requested
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for HandoffRequested {
    fn event_type(&self) -> &'static str {
        "workflow.handoff_requested"
    }

    fn workflow_instance_id(&self) -> &WorkflowInstanceId {
        &self.workflow_instance_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Offline packet submitted for review
#[derive(Debug)]
pub struct OfflinePacketSubmitted {
    /// The workflow instance
    pub workflow_instance_id: WorkflowInstanceId,

    /// The timestamp when the packet was submitted
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for OfflinePacketSubmitted {
    fn event_type(&self) -> &'static str {
        "offline_packet.submitted"
    }

    fn workflow_instance_id(&self) -> &WorkflowInstanceId {
        &self.workflow_instance_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
