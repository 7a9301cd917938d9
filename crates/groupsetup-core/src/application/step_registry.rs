//! Registry of step modules
//!
//! Maps a step key to an asynchronous loader. Resolution never fails with an
//! error; an unknown key or a failing loader is reported as a tagged
//! [`ModuleResolution`] the orchestrator must handle.

use crate::domain::step::StepModule;
use crate::domain::workflow_instance::StepKey;
use crate::CoreError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Asynchronous constructor of a step module
pub type StepLoader =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Box<dyn StepModule>, CoreError>> + Send + Sync>;

/// Outcome of resolving a step key
pub enum ModuleResolution {
    /// The module was constructed
    Loaded(Box<dyn StepModule>),
    /// No loader is registered for the key
    NotRegistered(StepKey),
    /// The loader ran and failed
    Failed {
        /// The requested key
        step_id: StepKey,
        /// Loader error text
        reason: String,
    },
}

impl ModuleResolution {
    /// Whether a module was constructed
    pub fn is_loaded(&self) -> bool {
        matches!(self, ModuleResolution::Loaded(_))
    }

    /// The module, if constructed
    pub fn into_module(self) -> Option<Box<dyn StepModule>> {
        match self {
            ModuleResolution::Loaded(module) => Some(module),
            _ => None,
        }
    }
}

impl fmt::Debug for ModuleResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleResolution::Loaded(_) => f.write_str("Loaded(..)"),
            ModuleResolution::NotRegistered(key) => f.debug_tuple("NotRegistered").field(key).finish(),
            ModuleResolution::Failed { step_id, reason } => f
                .debug_struct("Failed")
                .field("step_id", step_id)
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Step key to loader map
#[derive(Clone, Default)]
pub struct StepRegistry {
    loaders: HashMap<StepKey, StepLoader>,
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

impl StepRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asynchronous loader, replacing any previous one
    pub fn register<F, Fut>(&mut self, key: impl Into<StepKey>, loader: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Box<dyn StepModule>, CoreError>> + Send + 'static,
    {
        let loader: StepLoader = Arc::new(move || loader().boxed());
        self.loaders.insert(key.into(), loader);
    }

    /// Register a synchronous constructor
    pub fn register_factory<F>(&mut self, key: impl Into<StepKey>, factory: F)
    where
        F: Fn() -> Box<dyn StepModule> + Send + Sync + 'static,
    {
        let factory = Arc::new(factory);
        self.register(key, move || {
            let factory = factory.clone();
            async move { Ok(factory()) }
        });
    }

    /// Whether a loader is registered
    pub fn contains(&self, key: &StepKey) -> bool {
        self.loaders.contains_key(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<StepKey> {
        let mut keys: Vec<StepKey> = self.loaders.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Resolve and construct the module for a key
    pub async fn resolve(&self, key: &StepKey) -> ModuleResolution {
        let Some(loader) = self.loaders.get(key) else {
            debug!(step_id = %key, "No step module registered");
            return ModuleResolution::NotRegistered(key.clone());
        };

        match loader().await {
            Ok(module) => ModuleResolution::Loaded(module),
            Err(e) => {
                warn!(step_id = %key, error = %e, "Step module failed to load");
                ModuleResolution::Failed {
                    step_id: key.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }
}
