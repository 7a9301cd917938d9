use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use groupsetup_core::{
    CompleteOutcome, DocumentUpload, EngineConfig, EntityId, HandoffOutcome, LoadOutcome,
    MasterAppOutcome, OfflinePacketTracker, Orchestrator, Role, SetupMode, SubmissionPayload,
    TracingNotifier, WorkflowDefinition,
};
use groupsetup_core::application::offline_packet::REQUIRED_DOCUMENTS;
use groupsetup_monitoring::{init_logging, LogExt, MonitoringConfig};
use groupsetup_state_inmemory::InMemoryStateStoreProvider;
use groupsetup_steps::standard_registry;
use tracing::info;

mod demo;

#[derive(Parser, Debug)]
#[command(name = "groupsetup", about = "Run a scripted group setup enrollment")]
struct Args {
    /// Configuration file (without extension)
    #[arg(short, long, default_value = "groupsetup")]
    config: String,

    /// Entity id of the enrolling group
    #[arg(short, long, default_value = "demo-group")]
    entity: String,

    /// Take the offline packet route instead of the online steps
    #[arg(long)]
    offline: bool,

    /// Wait for the master application countdown before submitting
    #[arg(long)]
    wait_countdown: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = EngineConfig::load(Some(&args.config))
        .context("Failed to load configuration")?;

    let monitoring_config = MonitoringConfig::from_settings("groupsetup-cli", &config.logging);
    init_logging(&monitoring_config).context("Failed to initialize logging")?;

    let provider = InMemoryStateStoreProvider::with_definition(WorkflowDefinition::group_setup());
    provider
        .register_entity(demo::entity(&args.entity), Some(demo::employer_contact()))
        .await;
    let entity_id = EntityId::from(args.entity.as_str());

    if args.offline {
        return run_offline(&provider, entity_id).await;
    }

    let (repository, _) = provider.create_repositories();
    let mut orchestrator = Orchestrator::new(
        repository,
        Arc::new(TracingNotifier),
        standard_registry(),
        WorkflowDefinition::group_setup(),
        config,
    )
    .with_role(Role::Broker);

    let submission = run_online(&mut orchestrator, entity_id, args.wait_countdown).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&submission).context("Failed to render submission")?
    );
    Ok(())
}

async fn run_online(
    orchestrator: &mut Orchestrator,
    entity_id: EntityId,
    wait_countdown: bool,
) -> Result<SubmissionPayload> {
    match orchestrator.start(entity_id, SetupMode::Online).await {
        LoadOutcome::Ready(step_id) => info!(step_id = %step_id, "Workflow ready"),
        other => bail!("Workflow did not load: {:?}", other),
    }

    loop {
        let step_id = orchestrator
            .active_step()
            .cloned()
            .context("No active step")?;

        // Producer hands the employer-only steps over before switching roles
        if orchestrator.snapshot().is_current_step_role_restricted() {
            if let HandoffOutcome::Sent(receipt) = orchestrator.request_handoff().await {
                info!(employer = %receipt.employer_email, "Handed off to employer");
            }
            orchestrator.set_role(Some(Role::Employer));
        }

        let payload = demo::step_payload(&step_id.0)
            .with_context(|| format!("No scripted data for step {}", step_id))?;
        orchestrator
            .active_module_mut()
            .context("Step module is not loaded")?
            .load(&payload)
            .with_context(|| format!("Scripted data rejected by {}", step_id))?;

        if step_id.0 == "master_app" {
            match orchestrator.submit_master_application().await {
                MasterAppOutcome::Signed(mut countdown) => {
                    info!(seconds = countdown.remaining(), "Master application signed");
                    if wait_countdown {
                        countdown.finished().await;
                    }
                }
                other => bail!("Master application was not signed: {:?}", other),
            }
        }

        match orchestrator.complete().await {
            CompleteOutcome::Advanced { completed, next } => {
                let percent = orchestrator.snapshot().progress_percent();
                info!(completed = %completed, next = %next, percent, "Step completed");
            }
            CompleteOutcome::Submitted(submission) => return Ok(submission),
            other => bail!("Step {} did not complete: {:?}", step_id, other),
        }
    }
}

async fn run_offline(provider: &InMemoryStateStoreProvider, entity_id: EntityId) -> Result<()> {
    let (workflows, documents) = provider.create_repositories();
    workflows
        .start_setup(&entity_id, SetupMode::Offline)
        .await
        .context("Failed to start offline setup")?;

    let tracker = OfflinePacketTracker::new(workflows, documents);
    for file_type in REQUIRED_DOCUMENTS {
        let file_name = format!("{}.pdf", file_type.label().to_lowercase().replace(' ', "_"));
        tracker
            .upload(&entity_id, DocumentUpload::new(file_name, file_type, b"%PDF-1.7".to_vec()))
            .await
            .log_done("upload")
            .log_failure("upload")
            .with_context(|| format!("Failed to upload {}", file_type.label()))?;
    }

    let workflow = tracker
        .submit(&entity_id)
        .await
        .log_failure("submit_offline_packet")
        .context("Failed to submit offline packet")?;
    let overview = tracker.overview(&entity_id).await?;
    info!(status = ?workflow.status, "Offline packet submitted");
    println!(
        "{}",
        serde_json::to_string_pretty(&overview).context("Failed to render packet")?
    );
    Ok(())
}
