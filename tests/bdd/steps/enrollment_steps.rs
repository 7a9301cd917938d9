use cucumber::{given, then, when};
use groupsetup_core::{
    CompleteOutcome, EntityStatus, HandoffOutcome, LoadOutcome, NavigateOutcome, Refusal, Role,
    SetupMode, SkipOutcome, StepKey, WorkflowStatus,
};
use groupsetup_test_utils::TestEnrollmentBuilder;

use crate::steps::world::EnrollmentWorld;

fn parse_role(role: &str) -> Role {
    match role {
        "broker" => Role::Broker,
        "general agent" => Role::Ga,
        "TPA" => Role::Tpa,
        "employer" => Role::Employer,
        other => panic!("Unknown role: {}", other),
    }
}

#[given(expr = "a group {string} with an employer contact")]
async fn given_group_with_contact(world: &mut EnrollmentWorld, entity_id: String) {
    world.builder = Some(TestEnrollmentBuilder::new(&entity_id));
}

#[given(expr = "a group {string} without an employer contact")]
async fn given_group_without_contact(world: &mut EnrollmentWorld, entity_id: String) {
    world.builder = Some(TestEnrollmentBuilder::new(&entity_id).without_contact());
}

async fn start(world: &mut EnrollmentWorld, role: &str, mode: SetupMode) {
    let mut enrollment = world.builder().role(parse_role(role)).build().await;
    world.load = Some(enrollment.start(mode).await);
    world.enrollment = Some(enrollment);
}

#[given(expr = "the {word} has started group setup online")]
async fn given_started_online(world: &mut EnrollmentWorld, role: String) {
    start(world, &role, SetupMode::Online).await;
}

#[when(expr = "the {word} starts group setup online")]
async fn when_starts_online(world: &mut EnrollmentWorld, role: String) {
    start(world, &role, SetupMode::Online).await;
}

#[when(expr = "the {word} chooses the offline packet")]
async fn when_chooses_offline(world: &mut EnrollmentWorld, role: String) {
    start(world, &role, SetupMode::Offline).await;
}

#[given(expr = "the enrollment has advanced to {string}")]
async fn given_advanced_to(world: &mut EnrollmentWorld, step_name: String) {
    world
        .enrollment()
        .advance_to(&step_name)
        .await
        .expect("enrollment could not advance");
}

#[when(expr = "the enrollment advances to {string}")]
async fn when_advances_to(world: &mut EnrollmentWorld, step_name: String) {
    world
        .enrollment()
        .advance_to(&step_name)
        .await
        .expect("enrollment could not advance");
}

#[when(expr = "the {word} takes over")]
async fn act_as(world: &mut EnrollmentWorld, role: String) {
    world.enrollment().orchestrator.set_role(Some(parse_role(&role)));
}

#[when("every remaining step is completed")]
async fn when_every_step_completed(world: &mut EnrollmentWorld) {
    let submission = world
        .enrollment()
        .run_to_submission()
        .await
        .expect("enrollment did not reach submission");
    world.submission = Some(submission);
}

#[when(expr = "{string} is selected from the sidebar")]
async fn when_sidebar_selected(world: &mut EnrollmentWorld, step_name: String) {
    let outcome = world
        .enrollment()
        .orchestrator
        .select_step(StepKey::from(step_name.as_str()))
        .await;
    world.navigation = Some(outcome);
}

#[when("the current step is skipped")]
async fn when_step_skipped(world: &mut EnrollmentWorld) {
    let outcome = world.enrollment().orchestrator.skip().await;
    assert!(
        matches!(outcome, SkipOutcome::Skipped { .. }),
        "skip failed: {:?}",
        outcome
    );
}

#[when("the current step is submitted without changes")]
async fn when_completed_as_is(world: &mut EnrollmentWorld) {
    world.completion = Some(world.enrollment().orchestrator.complete().await);
}

#[when("the current step is filled in and submitted")]
async fn when_filled_and_completed(world: &mut EnrollmentWorld) {
    let outcome = world
        .enrollment()
        .complete_active_step()
        .await
        .expect("step could not be filled");
    world.completion = Some(outcome);
}

#[when("the employer is asked to take over")]
async fn when_handoff_requested(world: &mut EnrollmentWorld) {
    world.handoff = Some(world.enrollment().orchestrator.request_handoff().await);
}

#[then(expr = "the active step is {string}")]
async fn then_active_step(world: &mut EnrollmentWorld, step_name: String) {
    assert_eq!(
        world.enrollment().orchestrator.active_step(),
        Some(&StepKey::from(step_name.as_str()))
    );
}

#[then(expr = "the workflow loads at {string}")]
async fn then_loaded_at(world: &mut EnrollmentWorld, step_name: String) {
    assert_eq!(world.load, Some(LoadOutcome::Ready(StepKey::from(step_name.as_str()))));
}

#[then("the workflow is redirected to the offline packet")]
async fn then_offline(world: &mut EnrollmentWorld) {
    assert_eq!(world.load, Some(LoadOutcome::Offline));
    assert_eq!(world.enrollment().orchestrator.active_step(), None);
}

#[then("the workflow is submitted with a group number")]
async fn then_submitted(world: &mut EnrollmentWorld) {
    let submission = world.submission.as_ref().expect("no submission recorded");
    assert!(submission.group_number.starts_with("GRP-"));

    let enrollment = world.enrollment();
    let workflow = enrollment
        .provider
        .workflow(&enrollment.entity_id.0)
        .await
        .expect("workflow not stored");
    assert_eq!(workflow.status, WorkflowStatus::Completed);
}

#[then("the group is active")]
async fn then_group_active(world: &mut EnrollmentWorld) {
    let enrollment = world.enrollment();
    let entity = enrollment
        .provider
        .entity(&enrollment.entity_id.0)
        .await
        .expect("entity not registered");
    assert_eq!(entity.status, EntityStatus::Active);
}

#[then(expr = "navigation is refused until {string} is finished")]
async fn then_navigation_locked(world: &mut EnrollmentWorld, blocker: String) {
    match world.navigation.as_ref() {
        Some(NavigateOutcome::Refused(Refusal::Locked { reason, .. })) => {
            assert_eq!(reason.as_deref(), Some(blocker.as_str()));
        }
        other => panic!("Expected a locked step, got {:?}", other),
    }
}

#[then(expr = "the notice {string} is shown")]
async fn then_notice_shown(world: &mut EnrollmentWorld, notice: String) {
    let notifier = &world.enrollment().notifier;
    let shown = notifier.successes().contains(&notice) || notifier.errors().contains(&notice);
    assert!(shown, "notice not shown: {}", notice);
}

#[then("the handoff is refused as already sent")]
async fn then_handoff_already_sent(world: &mut EnrollmentWorld) {
    assert_eq!(
        world.handoff,
        Some(HandoffOutcome::Refused(Refusal::HandoffAlreadySent))
    );
}

#[then("the handoff fails")]
async fn then_handoff_fails(world: &mut EnrollmentWorld) {
    assert!(
        matches!(world.handoff, Some(HandoffOutcome::Failed(_))),
        "handoff did not fail: {:?}",
        world.handoff
    );
}

#[then("completion is refused because the role may not act")]
async fn then_role_restricted(world: &mut EnrollmentWorld) {
    assert_eq!(
        world.completion,
        Some(CompleteOutcome::Refused(Refusal::RoleRestricted))
    );
}

#[then(expr = "completion is blocked with an error starting {string}")]
async fn then_blocked_with_prefix(world: &mut EnrollmentWorld, prefix: String) {
    match world.completion.as_ref() {
        Some(CompleteOutcome::Blocked(errors)) => assert!(
            errors.iter().any(|e| e.starts_with(&prefix)),
            "no error starts with {}: {:?}",
            prefix,
            errors
        ),
        other => panic!("Expected the step to be blocked, got {:?}", other),
    }
}

#[then(expr = "completion is blocked with {string}")]
async fn then_blocked_with(world: &mut EnrollmentWorld, error: String) {
    assert_eq!(world.completion, Some(CompleteOutcome::Blocked(vec![error])));
}
