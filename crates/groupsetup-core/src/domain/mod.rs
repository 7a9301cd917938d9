/// Workflow and step instance models
pub mod workflow_instance;

/// Domain events
pub mod events;

/// Static workflow definitions
pub mod workflow_definition;

/// The step module contract
pub mod step;

/// Progression and locking rules
pub mod progression;

/// Document gate for acknowledgements
pub mod document_gate;

/// Document metadata
pub mod document;

/// Collaborator interfaces
pub mod repository;
