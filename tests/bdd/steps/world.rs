use cucumber::World;
use groupsetup_core::{
    CompleteOutcome, CoreError, HandoffOutcome, LoadOutcome, NavigateOutcome, OfflinePacketTracker,
    SubmissionPayload,
};
use groupsetup_test_utils::{TestEnrollment, TestEnrollmentBuilder};

/// World struct that holds state across step definitions
#[derive(World, Default)]
#[world(init = Self::default)]
pub struct EnrollmentWorld {
    // Pending harness configuration, consumed when the workflow starts
    pub builder: Option<TestEnrollmentBuilder>,
    pub enrollment: Option<TestEnrollment>,

    // Last outcomes
    pub load: Option<LoadOutcome>,
    pub navigation: Option<NavigateOutcome>,
    pub completion: Option<CompleteOutcome>,
    pub handoff: Option<HandoffOutcome>,
    pub submission: Option<SubmissionPayload>,

    // Offline packet
    pub tracker: Option<OfflinePacketTracker>,
    pub packet_error: Option<CoreError>,
}

impl EnrollmentWorld {
    pub fn enrollment(&mut self) -> &mut TestEnrollment {
        self.enrollment
            .as_mut()
            .expect("group setup has not been started")
    }

    pub fn builder(&mut self) -> TestEnrollmentBuilder {
        self.builder
            .take()
            .unwrap_or_else(|| TestEnrollmentBuilder::new("acme"))
    }
}

// Manual Debug implementation since the harness types don't implement Debug
impl std::fmt::Debug for EnrollmentWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollmentWorld")
            .field("entity_id", &self.enrollment.as_ref().map(|e| &e.entity_id))
            .field("load", &self.load)
            .field("navigation", &self.navigation)
            .field("completion", &self.completion)
            .field("handoff", &self.handoff)
            .field("submission", &self.submission)
            .field("packet_error", &self.packet_error)
            .finish()
    }
}
