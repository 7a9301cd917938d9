//! Shared helpers for the workspace test suites.
//!
//! ```bash
//! # End-to-end enrollment tests
//! cargo test -p groupsetup-tests --test e2e
//!
//! # BDD scenarios
//! cargo test -p groupsetup-tests --test bdd
//! ```

use std::path::PathBuf;

use groupsetup_core::testing::ScriptedStep;
use groupsetup_core::StepRegistry;
use groupsetup_steps::STANDARD_STEPS;

/// Directory holding the `.feature` files
pub fn features_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("bdd").join("features")
}

/// A registry where every standard step accepts any data
pub fn permissive_registry() -> StepRegistry {
    let mut registry = StepRegistry::new();
    for key in STANDARD_STEPS {
        registry.register_factory(key, || Box::new(ScriptedStep::valid()));
    }
    registry
}
