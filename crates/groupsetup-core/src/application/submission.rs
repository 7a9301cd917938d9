//! Multi-phase submission
//!
//! The final step is committed in three sequential phases: save, complete,
//! submit. Each phase runs only if the previous one succeeded. A failed
//! phase stops the pipeline and is reported with its own message; earlier
//! phases are not rolled back, so a retry simply starts again at phase one.
//!
//! The master application uses a two-phase variant (save, complete) that
//! requires a captured signature and is followed by a pacing countdown.

use crate::domain::repository::{CompleteStepResponse, SubmissionPayload, WorkflowRepository};
use crate::domain::workflow_instance::{EntityId, StepKey};
use crate::{CoreError, NoticeMessages, StepPayload};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    /// Persist the final payload
    Save,
    /// Mark the step completed
    Complete,
    /// Submit the workflow downstream
    Submit,
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelinePhase::Save => "save",
            PipelinePhase::Complete => "complete",
            PipelinePhase::Submit => "submit",
        })
    }
}

/// A phase failed; nothing after it ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseFailure {
    /// The failed phase
    pub phase: PipelinePhase,
    /// The collaborator error
    pub error: CoreError,
    /// Message shown to the user
    pub message: String,
}

/// Result of the save and complete phases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedStep {
    /// Collaborator response of the complete phase
    pub response: CompleteStepResponse,
}

/// Runs pipeline phases against the workflow collaborator
#[derive(Clone)]
pub struct SubmissionPipeline {
    repository: Arc<dyn WorkflowRepository>,
    messages: NoticeMessages,
}

impl fmt::Debug for SubmissionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionPipeline").finish_non_exhaustive()
    }
}

impl SubmissionPipeline {
    /// Create a pipeline
    pub fn new(repository: Arc<dyn WorkflowRepository>, messages: NoticeMessages) -> Self {
        Self {
            repository,
            messages,
        }
    }

    fn failure(&self, phase: PipelinePhase, error: CoreError) -> PhaseFailure {
        let fallback = match phase {
            PipelinePhase::Save => &self.messages.save_failed,
            PipelinePhase::Complete => &self.messages.complete_failed,
            PipelinePhase::Submit => &self.messages.submit_failed,
        };
        let message = error.user_message(fallback);
        error!(%phase, error = %error, "Pipeline phase failed");
        PhaseFailure {
            phase,
            error,
            message,
        }
    }

    /// Phases one and two
    pub async fn commit_step(
        &self,
        entity_id: &EntityId,
        step_id: &StepKey,
        payload: StepPayload,
    ) -> Result<CommittedStep, PhaseFailure> {
        debug!(entity_id = %entity_id, step_id = %step_id, "Pipeline phase: save");
        self.repository
            .save_step_data(entity_id, step_id, payload)
            .await
            .map_err(|e| self.failure(PipelinePhase::Save, e))?;

        debug!(entity_id = %entity_id, step_id = %step_id, "Pipeline phase: complete");
        let response = self
            .repository
            .complete_step(entity_id, step_id)
            .await
            .map_err(|e| self.failure(PipelinePhase::Complete, e))?;

        Ok(CommittedStep { response })
    }

    /// Phase three
    pub async fn submit(&self, entity_id: &EntityId) -> Result<SubmissionPayload, PhaseFailure> {
        debug!(entity_id = %entity_id, "Pipeline phase: submit");
        let payload = self
            .repository
            .submit_workflow(entity_id)
            .await
            .map_err(|e| self.failure(PipelinePhase::Submit, e))?;
        info!(entity_id = %entity_id, group_number = %payload.group_number, "Workflow submitted");
        Ok(payload)
    }

    /// All three phases for the final step
    pub async fn run(
        &self,
        entity_id: &EntityId,
        step_id: &StepKey,
        payload: StepPayload,
    ) -> Result<SubmissionPayload, PhaseFailure> {
        self.commit_step(entity_id, step_id, payload).await?;
        self.submit(entity_id).await
    }

    /// Master application variant: a signature is required before phase one
    pub async fn commit_signed(
        &self,
        entity_id: &EntityId,
        step_id: &StepKey,
        payload: StepPayload,
    ) -> Result<CommittedStep, PhaseFailure> {
        let signed = payload
            .get_path(&["signature"])
            .map(|s| !s.is_null())
            .unwrap_or(false);
        if !signed {
            return Err(PhaseFailure {
                phase: PipelinePhase::Save,
                error: CoreError::ValidationError("signature is required".to_string()),
                message: "Please sign the application before submitting.".to_string(),
            });
        }
        self.commit_step(entity_id, step_id, payload).await
    }
}

/// Fixed-duration pacing countdown
///
/// Ticks once per interval until zero; the remaining seconds are published
/// on a watch channel. Dropping the countdown stops it.
#[derive(Debug)]
pub struct Countdown {
    total: u32,
    remaining: watch::Receiver<u32>,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Start counting down `total` ticks of `tick`
    pub fn start(total: u32, tick: Duration) -> Self {
        let (tx, remaining) = watch::channel(total);
        let handle = tokio::spawn(async move {
            let mut left = total;
            while left > 0 {
                tokio::time::sleep(tick).await;
                left -= 1;
                if tx.send(left).is_err() {
                    break;
                }
            }
        });
        Self {
            total,
            remaining,
            handle,
        }
    }

    /// Seconds left
    pub fn remaining(&self) -> u32 {
        *self.remaining.borrow()
    }

    /// Elapsed share as a percentage
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            f64::from(self.total - self.remaining()) / f64::from(self.total) * 100.0
        }
    }

    /// Whether the user may proceed
    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Wait until the countdown reaches zero
    pub async fn finished(&mut self) {
        // The sender only goes away after publishing zero
        let _ = self.remaining.wait_for(|left| *left == 0).await;
    }

    /// Observe remaining seconds
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.remaining.clone()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
