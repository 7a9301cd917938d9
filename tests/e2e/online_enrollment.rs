use groupsetup_core::testing::ScriptedStep;
use groupsetup_core::{
    CompleteOutcome, EntityStatus, HandoffOutcome, LoadOutcome, NavigateOutcome, Refusal, Role,
    SetupMode, SkipOutcome, StepKey, StepPayload, StepStatus, WorkflowStatus,
};
use groupsetup_test_utils::data_generators::unverified_licensing;
use groupsetup_test_utils::{TestEnrollmentBuilder, TestError};
use groupsetup_tests::permissive_registry;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_online_enrollment_submits_group() -> Result<(), TestError> {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    assert_eq!(
        enrollment.start(SetupMode::Online).await,
        LoadOutcome::Ready(StepKey::from("licensing"))
    );

    let submission = enrollment.run_to_submission().await?;
    assert!(submission.group_number.starts_with("GRP-"));
    assert_eq!(submission.departments, vec!["Operations".to_string()]);
    assert_eq!(submission.step_data.len(), 10);
    assert_eq!(
        submission.step_data["master_app"]["submitted"],
        serde_json::Value::Bool(true)
    );

    let workflow = enrollment.provider.workflow("acme").await.unwrap();
    assert_eq!(workflow.status, WorkflowStatus::Completed);
    assert!(workflow.steps.iter().all(|s| s.status == StepStatus::Completed));

    let entity = enrollment.provider.entity("acme").await.unwrap();
    assert_eq!(entity.status, EntityStatus::Active);

    assert_eq!(enrollment.orchestrator.snapshot().progress_percent(), 100);
    assert_eq!(
        enrollment.notifier.successes().last().map(String::as_str),
        Some("All steps completed!")
    );

    let events: Vec<String> = enrollment
        .provider
        .events()
        .await
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(events.first().map(String::as_str), Some("group_setup.started"));
    assert_eq!(events.last().map(String::as_str), Some("workflow.submitted"));
    Ok(())
}

#[tokio::test]
async fn test_submitted_workflow_refuses_edits() -> Result<(), TestError> {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    enrollment.start(SetupMode::Online).await;
    enrollment.run_to_submission().await?;

    assert_eq!(
        enrollment.orchestrator.complete().await,
        CompleteOutcome::Refused(Refusal::WorkflowSubmitted)
    );
    assert_eq!(
        enrollment.orchestrator.skip().await,
        SkipOutcome::Refused(Refusal::WorkflowSubmitted)
    );
    Ok(())
}

#[tokio::test]
async fn test_sidebar_refuses_locked_step() {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    enrollment.start(SetupMode::Online).await;

    let outcome = enrollment
        .orchestrator
        .select_step(StepKey::from("renewal_period"))
        .await;
    assert_eq!(
        outcome,
        NavigateOutcome::Refused(Refusal::Locked {
            step_id: StepKey::from("renewal_period"),
            reason: Some("Commission Agreement".to_string()),
        })
    );
    assert_eq!(
        enrollment.orchestrator.active_step(),
        Some(&StepKey::from("licensing"))
    );
}

#[tokio::test]
async fn test_producer_hands_off_employer_steps() -> Result<(), TestError> {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    enrollment.start(SetupMode::Online).await;
    enrollment.advance_to("authorization").await?;
    enrollment.orchestrator.set_role(Some(Role::Broker));

    assert_eq!(
        enrollment.orchestrator.complete().await,
        CompleteOutcome::Refused(Refusal::RoleRestricted)
    );

    match enrollment.orchestrator.request_handoff().await {
        HandoffOutcome::Sent(receipt) => assert_eq!(receipt.employer_email, "jane@acme.test"),
        other => panic!("Expected handoff to be sent, got {:?}", other),
    }
    assert_eq!(
        enrollment.notifier.successes(),
        vec!["Notification sent to Jane Employer (jane@acme.test)".to_string()]
    );
    assert_eq!(
        enrollment.orchestrator.request_handoff().await,
        HandoffOutcome::Refused(Refusal::HandoffAlreadySent)
    );
    Ok(())
}

#[tokio::test]
async fn test_handoff_without_contact_reports_hint() -> Result<(), TestError> {
    let mut enrollment = TestEnrollmentBuilder::new("acme").without_contact().build().await;
    enrollment.start(SetupMode::Online).await;
    enrollment.advance_to("authorization").await?;
    enrollment.orchestrator.set_role(Some(Role::Ga));

    assert!(matches!(
        enrollment.orchestrator.request_handoff().await,
        HandoffOutcome::Failed(_)
    ));
    assert_eq!(
        enrollment.notifier.errors(),
        vec!["No employer contact is on file for this group".to_string()]
    );
    assert!(!enrollment.orchestrator.handoff_sent());
    Ok(())
}

#[tokio::test]
async fn test_employer_cannot_complete_empty_authorization() -> Result<(), TestError> {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    enrollment.start(SetupMode::Online).await;
    enrollment.advance_to("authorization").await?;
    enrollment.orchestrator.set_role(Some(Role::Employer));

    match enrollment.orchestrator.complete().await {
        CompleteOutcome::Blocked(errors) => {
            assert!(errors.iter().any(|e| e.starts_with("Online Access:")));
            assert!(errors.iter().any(|e| e.starts_with("Final Signature:")));
        }
        other => panic!("Expected the step to be blocked, got {:?}", other),
    }

    let workflow = enrollment.provider.workflow("acme").await.unwrap();
    assert_eq!(workflow.current_step_id, Some(StepKey::from("authorization")));
    Ok(())
}

#[tokio::test]
async fn test_finalize_requires_signed_commission_agreement() -> Result<(), TestError> {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    enrollment.start(SetupMode::Online).await;
    enrollment.advance_to("commission_ack").await?;

    assert!(matches!(
        enrollment.orchestrator.skip().await,
        SkipOutcome::Skipped { .. }
    ));
    enrollment.advance_to("finalize").await?;

    assert_eq!(
        enrollment.complete_active_step().await?,
        CompleteOutcome::Blocked(vec![
            "Commission Agreement must be completed and signed before finalizing.".to_string()
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_commission_agreement_banner_lists_licensing_blockers() -> Result<(), TestError> {
    let mut enrollment = TestEnrollmentBuilder::new("acme")
        .registry(permissive_registry())
        .build()
        .await;
    enrollment.start(SetupMode::Online).await;

    enrollment
        .orchestrator
        .active_module_mut()
        .ok_or(TestError::NoActiveStep)?
        .load(&StepPayload::new(unverified_licensing()))?;
    assert!(matches!(
        enrollment.orchestrator.complete().await,
        CompleteOutcome::Advanced { .. }
    ));
    enrollment.advance_to("commission_ack").await?;

    match enrollment.orchestrator.complete().await {
        CompleteOutcome::PrerequisitesUnmet(banner) => {
            assert_eq!(banner.target, StepKey::from("commission_ack"));
            assert_eq!(
                banner.reasons(),
                vec![
                    "1 producer(s) do not have active licensing status.".to_string(),
                    "1 producer(s) have not been verified for a compensable code.".to_string(),
                ]
            );
            assert_eq!(banner.link_targets(), vec![StepKey::from("licensing")]);
        }
        other => panic!("Expected a prerequisite banner, got {:?}", other),
    }
    assert!(enrollment.orchestrator.banner().is_some());
    Ok(())
}

#[tokio::test]
async fn test_finalize_banner_after_skipped_agreement() -> Result<(), TestError> {
    let mut enrollment = TestEnrollmentBuilder::new("acme")
        .registry(permissive_registry())
        .build()
        .await;
    enrollment.start(SetupMode::Online).await;
    enrollment.advance_to("commission_ack").await?;
    enrollment.orchestrator.skip().await;
    enrollment.advance_to("finalize").await?;

    match enrollment.orchestrator.complete().await {
        CompleteOutcome::PrerequisitesUnmet(banner) => assert_eq!(
            banner.reasons(),
            vec![
                "Commission Agreement has not been completed.".to_string(),
                "Commission Agreement has not been signed.".to_string(),
            ]
        ),
        other => panic!("Expected a prerequisite banner, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_review_step_requests_edit() -> Result<(), TestError> {
    let review = ScriptedStep::valid();
    let mut registry = permissive_registry();
    let handle = review.clone();
    registry.register_factory("finalize", move || Box::new(handle.clone()));

    let mut enrollment = TestEnrollmentBuilder::new("acme").registry(registry).build().await;
    enrollment.start(SetupMode::Online).await;
    enrollment.advance_to("finalize").await?;

    assert!(review.request_edit("company_info"));
    assert_eq!(
        enrollment.orchestrator.process_edit_requests().await,
        vec![NavigateOutcome::Activated(StepKey::from("company_info"))]
    );
    assert_eq!(
        enrollment.orchestrator.active_step(),
        Some(&StepKey::from("company_info"))
    );
    Ok(())
}
