use cucumber::{then, when};
use groupsetup_core::application::offline_packet::PACKET_DOCUMENTS;
use groupsetup_core::{
    CompleteOutcome, DocumentType, DocumentUpload, NavigateOutcome, OfflinePacketTracker,
    PacketStatus, Refusal,
};

use crate::steps::world::EnrollmentWorld;

fn document_type(label: &str) -> DocumentType {
    PACKET_DOCUMENTS
        .into_iter()
        .find(|t| t.label() == label)
        .unwrap_or_else(|| panic!("Unknown packet document: {}", label))
}

fn tracker(world: &mut EnrollmentWorld) -> &OfflinePacketTracker {
    if world.tracker.is_none() {
        let (workflows, documents) = world.enrollment().provider.create_repositories();
        world.tracker = Some(OfflinePacketTracker::new(workflows, documents));
    }
    world.tracker.as_ref().expect("tracker was just created")
}

#[when(expr = "the {string} document is uploaded")]
async fn when_document_uploaded(world: &mut EnrollmentWorld, label: String) {
    let entity_id = world.enrollment().entity_id.clone();
    let file_type = document_type(&label);
    let upload = DocumentUpload::new(
        format!("{}.pdf", label.to_lowercase().replace(' ', "_")),
        file_type,
        b"%PDF-1.7".to_vec(),
    );
    tracker(world)
        .upload(&entity_id, upload)
        .await
        .expect("upload failed");
}

#[when("the packet is submitted")]
async fn when_packet_submitted(world: &mut EnrollmentWorld) {
    let entity_id = world.enrollment().entity_id.clone();
    let result = tracker(world).submit(&entity_id).await;
    world.packet_error = result.err();
}

#[then(expr = "packet submission fails listing {string}")]
async fn then_submission_fails(world: &mut EnrollmentWorld, label: String) {
    let error = world.packet_error.as_ref().expect("packet submission succeeded");
    assert!(
        error.to_string().contains(&label),
        "error does not list {}: {}",
        label,
        error
    );
}

#[then(expr = "the packet status is {string}")]
async fn then_packet_status(world: &mut EnrollmentWorld, status: String) {
    assert!(world.packet_error.is_none(), "{:?}", world.packet_error);

    let entity_id = world.enrollment().entity_id.clone();
    let overview = tracker(world)
        .overview(&entity_id)
        .await
        .expect("overview failed");
    let expected = match status.as_str() {
        "collecting" => PacketStatus::Collecting,
        "submitted" => PacketStatus::Submitted,
        "in review" => PacketStatus::InReview,
        other => panic!("Unknown packet status: {}", other),
    };
    assert_eq!(overview.status, expected);
}

#[then(expr = "{int} required document(s) are missing")]
async fn then_missing_count(world: &mut EnrollmentWorld, count: usize) {
    let entity_id = world.enrollment().entity_id.clone();
    let overview = tracker(world)
        .overview(&entity_id)
        .await
        .expect("overview failed");
    assert_eq!(overview.missing_required.len(), count);
}

#[then("step navigation is refused for the offline packet")]
async fn then_offline_navigation_refused(world: &mut EnrollmentWorld) {
    assert_eq!(
        world.navigation,
        Some(NavigateOutcome::Refused(Refusal::OfflineTrack))
    );
    let outcome = world.enrollment().orchestrator.complete().await;
    assert_eq!(outcome, CompleteOutcome::Refused(Refusal::OfflineTrack));
    assert_eq!(world.enrollment().orchestrator.active_step(), None);
}
