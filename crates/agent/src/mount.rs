//! Mounting the orchestrator into a host's module table.

use hookloop_config::{ConfigError, OrchestratorConfig};
use hookloop_core::orchestrator::Orchestrator;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::loop_runner::EventDrivenOrchestrator;

/// The slot an orchestrator occupies.
pub const ORCHESTRATOR_SLOT: &str = "orchestrator";

#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("Slot '{0}' is already occupied")]
    SlotOccupied(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A host's table of named module slots.
#[derive(Default)]
pub struct ModuleCoordinator {
    slots: RwLock<HashMap<String, Arc<dyn Orchestrator>>>,
}

impl ModuleCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `module` in `slot`. Fails if the slot is taken.
    pub async fn mount(&self, slot: &str, module: Arc<dyn Orchestrator>) -> Result<(), MountError> {
        let mut slots = self.slots.write().await;
        if slots.contains_key(slot) {
            return Err(MountError::SlotOccupied(slot.to_string()));
        }
        slots.insert(slot.to_string(), module);
        Ok(())
    }

    pub async fn get(&self, slot: &str) -> Option<Arc<dyn Orchestrator>> {
        self.slots.read().await.get(slot).cloned()
    }

    pub async fn unmount(&self, slot: &str) -> Option<Arc<dyn Orchestrator>> {
        self.slots.write().await.remove(slot)
    }

    /// Occupied slot names, sorted.
    pub async fn slots(&self) -> Vec<String> {
        let mut names: Vec<String> = self.slots.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Build an [`EventDrivenOrchestrator`] from `config` and mount it in the
/// orchestrator slot. A missing mapping uses the defaults.
pub async fn mount(
    coordinator: &ModuleCoordinator,
    config: Option<serde_json::Value>,
) -> Result<(), MountError> {
    let config = OrchestratorConfig::from_value(config.unwrap_or(serde_json::Value::Null))?;
    let max_iterations = config.max_iterations;
    coordinator
        .mount(ORCHESTRATOR_SLOT, Arc::new(EventDrivenOrchestrator::new(config)))
        .await?;
    tracing::info!(max_iterations, "Mounted EventDrivenOrchestrator");
    Ok(())
}
