//! Test doubles for driving the engine without real step modules
//!
//! Enabled by the `testing` feature (on by default) so integration suites in
//! other crates can script steps and record notifications.

use crate::application::orchestrator::Notifier;
use crate::domain::step::{EditRequestSender, StepContext, StepModule};
use crate::domain::workflow_instance::StepKey;
use crate::{CoreError, StepPayload};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A step module whose validity and errors are fixed up front
///
/// Clones share their recorded state, so a clone handed to a registry factory can be
/// observed through the original.
#[derive(Debug, Clone)]
pub struct ScriptedStep {
    data: StepPayload,
    valid: bool,
    errors: Vec<String>,
    touched: Arc<AtomicBool>,
    loads: Arc<AtomicUsize>,
    context: Arc<Mutex<Option<StepContext>>>,
    edit_sender: Arc<Mutex<Option<EditRequestSender>>>,
}

impl ScriptedStep {
    fn scripted(valid: bool, errors: Vec<String>) -> Self {
        Self {
            data: StepPayload::empty(),
            valid,
            errors,
            touched: Arc::new(AtomicBool::new(false)),
            loads: Arc::new(AtomicUsize::new(0)),
            context: Arc::new(Mutex::new(None)),
            edit_sender: Arc::new(Mutex::new(None)),
        }
    }

    /// Always valid
    pub fn valid() -> Self {
        Self::scripted(true, Vec::new())
    }

    /// Always invalid, reporting `errors`
    pub fn invalid(errors: Vec<String>) -> Self {
        Self::scripted(false, errors)
    }

    /// Initial editable data, kept until a non-empty payload is loaded
    pub fn with_data(mut self, value: serde_json::Value) -> Self {
        self.data = StepPayload::new(value);
        self
    }

    /// Whether `mark_forms_as_touched` was called on any clone
    pub fn was_touched(&self) -> bool {
        self.touched.load(Ordering::SeqCst)
    }

    /// How many times a payload was loaded into any clone
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// The context attached on the latest activation
    pub fn last_context(&self) -> Option<StepContext> {
        self.context.lock().ok().and_then(|c| c.clone())
    }

    /// Emit an edit-step request through the attached sender.
    /// Returns false when no orchestrator is subscribed.
    pub fn request_edit(&self, target: &str) -> bool {
        self.edit_sender
            .lock()
            .ok()
            .and_then(|s| s.as_ref().map(|tx| tx.send(StepKey::from(target)).is_ok()))
            .unwrap_or(false)
    }
}

impl StepModule for ScriptedStep {
    fn get_data(&self) -> StepPayload {
        self.data.clone()
    }

    fn load(&mut self, payload: &StepPayload) -> Result<(), CoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !payload.is_empty() {
            self.data = payload.clone();
        }
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn validation_errors(&self) -> Vec<String> {
        if self.valid {
            Vec::new()
        } else {
            self.errors.clone()
        }
    }

    fn mark_forms_as_touched(&mut self) {
        self.touched.store(true, Ordering::SeqCst);
    }

    fn attach_context(&mut self, context: &StepContext) {
        if let Ok(mut slot) = self.context.lock() {
            *slot = Some(context.clone());
        }
    }

    fn attach_edit_requests(&mut self, sender: EditRequestSender) {
        if let Ok(mut slot) = self.edit_sender.lock() {
            *slot = Some(sender);
        }
    }
}

/// Severity of a recorded notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Success toast
    Success,
    /// Error toast
    Error,
    /// Informational notice
    Info,
}

/// One recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Text shown to the user
    pub message: String,
}

/// Notifier that records every notification
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(Notice {
                level,
                message: message.to_string(),
            });
        }
    }

    /// All notifications so far
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// Messages of one severity, in order
    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }

    /// Error messages, in order
    pub fn errors(&self) -> Vec<String> {
        self.messages(NoticeLevel::Error)
    }

    /// Success messages, in order
    pub fn successes(&self) -> Vec<String> {
        self.messages(NoticeLevel::Success)
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.push(NoticeLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(NoticeLevel::Error, message);
    }

    fn info(&self, message: &str) {
        self.push(NoticeLevel::Info, message);
    }
}
