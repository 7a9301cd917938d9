use std::sync::Arc;

use groupsetup_core::testing::RecordingNotifier;
use groupsetup_core::{
    CompleteOutcome, CoreError, EngineConfig, LoadOutcome, NavigateOutcome, Orchestrator,
    PipelinePhase, SetupMode, StepKey, StepStatus, WorkflowDefinition,
};
use groupsetup_steps::standard_registry;
use groupsetup_test_utils::{TestEnrollmentBuilder, TestError};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_failed_complete_keeps_step_and_retries() -> Result<(), TestError> {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    enrollment.start(SetupMode::Online).await;
    enrollment
        .provider
        .fail_next("complete_step", CoreError::persistence("complete_step", "timeout"));

    match enrollment.complete_active_step().await? {
        CompleteOutcome::Failed(failure) => {
            assert_eq!(failure.phase, PipelinePhase::Complete);
            assert_eq!(failure.message, "Failed to complete step");
        }
        other => panic!("Expected the complete phase to fail, got {:?}", other),
    }
    assert_eq!(enrollment.active_step()?, StepKey::from("licensing"));
    assert_eq!(enrollment.notifier.errors(), vec!["Failed to complete step".to_string()]);

    assert_eq!(
        enrollment.orchestrator.complete().await,
        CompleteOutcome::Advanced {
            completed: StepKey::from("licensing"),
            next: StepKey::from("company_info"),
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_failed_save_shows_recovery_hint() -> Result<(), TestError> {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    enrollment.start(SetupMode::Online).await;
    enrollment.provider.fail_next(
        "save_step_data",
        CoreError::persistence("save_step_data", "503")
            .with_recovery_hint("The enrollment service is busy, please retry"),
    );

    match enrollment.complete_active_step().await? {
        CompleteOutcome::Failed(failure) => assert_eq!(failure.phase, PipelinePhase::Save),
        other => panic!("Expected the save phase to fail, got {:?}", other),
    }
    assert_eq!(
        enrollment.notifier.errors(),
        vec!["The enrollment service is busy, please retry".to_string()]
    );

    let workflow = enrollment.provider.workflow("acme").await.unwrap();
    let licensing = workflow.step(&StepKey::from("licensing")).unwrap();
    assert_eq!(licensing.status, StepStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn test_navigating_away_saves_draft() -> Result<(), TestError> {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    enrollment.start(SetupMode::Online).await;
    enrollment.advance_to("company_info").await?;
    enrollment.fill_active_step()?;

    assert_eq!(
        enrollment.orchestrator.previous().await,
        NavigateOutcome::Activated(StepKey::from("licensing"))
    );
    enrollment.orchestrator.settle().await;

    let workflow = enrollment.provider.workflow("acme").await.unwrap();
    let company = workflow.step(&StepKey::from("company_info")).unwrap();
    assert_ne!(company.status, StepStatus::Completed);
    assert_eq!(
        company.data.get_path(&["basic", "company_name"]),
        Some(&json!("Acme Widgets"))
    );
    Ok(())
}

#[tokio::test]
async fn test_new_session_resumes_saved_progress() -> Result<(), TestError> {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    enrollment.start(SetupMode::Online).await;
    enrollment.advance_to("risk_assessment").await?;

    let (repository, _) = enrollment.provider.create_repositories();
    let mut resumed = Orchestrator::new(
        repository,
        Arc::new(RecordingNotifier::new()),
        standard_registry(),
        WorkflowDefinition::group_setup(),
        EngineConfig::default(),
    );

    assert_eq!(
        resumed.load(enrollment.entity_id.clone(), None).await,
        LoadOutcome::Ready(StepKey::from("risk_assessment"))
    );
    assert_eq!(resumed.snapshot().progress_percent(), 20);

    resumed.navigate(StepKey::from("company_info")).await;
    let data = resumed
        .active_module()
        .ok_or(TestError::NoActiveStep)?
        .get_data();
    assert_eq!(
        data.get_path(&["basic", "federal_tax_id"]),
        Some(&json!("12-3456789"))
    );
    Ok(())
}

#[tokio::test]
async fn test_load_failure_is_reported() {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    enrollment
        .provider
        .fail_next("start_setup", CoreError::persistence("start_setup", "connection reset"));

    assert!(matches!(
        enrollment.start(SetupMode::Online).await,
        LoadOutcome::Failed(_)
    ));
    assert_eq!(
        enrollment.notifier.errors(),
        vec!["Failed to load workflow".to_string()]
    );
    assert_eq!(enrollment.orchestrator.active_step(), None);
}
