/// Observable workflow state store
pub mod workflow_store;

/// Step module registry
pub mod step_registry;

/// Cross-step prerequisite rules
pub mod prerequisites;

/// Navigation and completion orchestration
pub mod orchestrator;

/// Multi-phase submission pipeline
pub mod submission;

/// Offline intake packet
pub mod offline_packet;
