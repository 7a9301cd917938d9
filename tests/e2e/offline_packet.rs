use groupsetup_core::{
    CompleteOutcome, DocumentType, DocumentUpload, EntityStatus, LoadOutcome, NavigateOutcome,
    OfflinePacketTracker, PacketStatus, Refusal, SaveOutcome, SetupMode, SkipOutcome, StepKey,
    StepStatus, WorkflowStatus,
};
use groupsetup_test_utils::TestEnrollmentBuilder;
use groupsetup_tests::permissive_registry;
use pretty_assertions::assert_eq;

fn pdf(name: &str, file_type: DocumentType) -> DocumentUpload {
    DocumentUpload::new(name, file_type, b"%PDF-1.7".to_vec())
}

#[tokio::test]
async fn test_offline_choice_redirects_to_packet() {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;

    assert_eq!(enrollment.start(SetupMode::Offline).await, LoadOutcome::Offline);
    assert_eq!(enrollment.orchestrator.active_step(), None);

    let entity = enrollment.provider.entity("acme").await.unwrap();
    assert_eq!(entity.is_offline, Some(true));
    assert_eq!(entity.status, EntityStatus::ApplicationInProgress);
}

#[tokio::test]
async fn test_offline_track_keeps_steps_untouched() {
    let mut enrollment = TestEnrollmentBuilder::new("acme")
        .registry(permissive_registry())
        .build()
        .await;
    assert_eq!(enrollment.start(SetupMode::Offline).await, LoadOutcome::Offline);

    let orchestrator = &mut enrollment.orchestrator;
    assert_eq!(
        orchestrator.navigate(StepKey::from("licensing")).await,
        NavigateOutcome::Refused(Refusal::OfflineTrack)
    );
    assert_eq!(
        orchestrator.select_step(StepKey::from("licensing")).await,
        NavigateOutcome::Refused(Refusal::OfflineTrack)
    );
    assert_eq!(orchestrator.save().await, SaveOutcome::Refused(Refusal::OfflineTrack));
    assert_eq!(
        orchestrator.complete().await,
        CompleteOutcome::Refused(Refusal::OfflineTrack)
    );
    assert_eq!(orchestrator.skip().await, SkipOutcome::Refused(Refusal::OfflineTrack));
    orchestrator.settle().await;
    assert_eq!(orchestrator.active_step(), None);

    let workflow = enrollment.provider.workflow("acme").await.unwrap();
    assert!(workflow.is_offline_track());
    let licensing = workflow.step(&StepKey::from("licensing")).unwrap();
    assert_eq!(licensing.status, StepStatus::Pending);
    assert!(enrollment.notifier.errors().is_empty());
}

#[tokio::test]
async fn test_offline_packet_submission() {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    enrollment.start(SetupMode::Offline).await;

    let (workflows, documents) = enrollment.provider.create_repositories();
    let tracker = OfflinePacketTracker::new(workflows, documents);
    let entity_id = enrollment.entity_id.clone();

    tracker
        .upload(&entity_id, pdf("master_app.pdf", DocumentType::MasterApp))
        .await
        .unwrap();
    let err = tracker.submit(&entity_id).await.unwrap_err();
    assert!(err.to_string().contains("Data Gathering Tool"));

    tracker
        .upload(&entity_id, pdf("dgt.pdf", DocumentType::DataGatheringTool))
        .await
        .unwrap();
    let overview = tracker.overview(&entity_id).await.unwrap();
    assert!(overview.is_complete());
    assert_eq!(overview.status, PacketStatus::Collecting);

    let workflow = tracker.submit(&entity_id).await.unwrap();
    assert_eq!(workflow.status, WorkflowStatus::OfflineSubmitted);

    let overview = tracker.overview(&entity_id).await.unwrap();
    assert!(overview.is_submitted());
    assert!(tracker.submit(&entity_id).await.is_err());
}

#[tokio::test]
async fn test_removed_document_reopens_checklist() {
    let mut enrollment = TestEnrollmentBuilder::new("acme").build().await;
    enrollment.start(SetupMode::Offline).await;

    let (workflows, documents) = enrollment.provider.create_repositories();
    let tracker = OfflinePacketTracker::new(workflows, documents);
    let entity_id = enrollment.entity_id.clone();

    tracker
        .upload(&entity_id, pdf("master_app.pdf", DocumentType::MasterApp))
        .await
        .unwrap();
    let census = tracker
        .upload(&entity_id, pdf("census.xlsx", DocumentType::CensusTemplate))
        .await
        .unwrap();
    tracker.remove(&entity_id, &census.id).await.unwrap();

    let overview = tracker.overview(&entity_id).await.unwrap();
    assert_eq!(overview.missing_required, vec!["Data Gathering Tool".to_string()]);
    let census_entry = overview
        .entries
        .iter()
        .find(|e| e.file_type == DocumentType::CensusTemplate)
        .unwrap();
    assert!(!census_entry.uploaded);
    assert!(!census_entry.required);
}
