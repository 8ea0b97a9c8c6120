//! In-process hook bus: a priority-ordered list of [`HookHandler`]s.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::hook::{HookAction, HookDispatch, HookEvent, HookHandler, HookResult};

/// Priority used by [`HookRegistry::register`].
pub const DEFAULT_PRIORITY: u32 = 100;

/// A registered handler with its priority.
struct HandlerEntry {
    handler: Arc<dyn HookHandler>,
    priority: u32,
}

/// Registry that manages handlers and aggregates their verdicts.
///
/// Handlers run in priority order (lower number first, ties in
/// registration order). The first `deny` stops the chain and is returned.
/// `modify` verdicts merge their data, later keys overriding earlier ones.
/// A handler that errors is logged and skipped.
pub struct HookRegistry {
    handlers: RwLock<Vec<HandlerEntry>>,
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register a handler with default priority (100).
    pub async fn register(&self, handler: Arc<dyn HookHandler>) {
        self.register_with_priority(handler, DEFAULT_PRIORITY).await;
    }

    /// Register a handler with a specific priority.
    pub async fn register_with_priority(&self, handler: Arc<dyn HookHandler>, priority: u32) {
        let mut handlers = self.handlers.write().await;
        handlers.push(HandlerEntry { handler, priority });
        handlers.sort_by_key(|e| e.priority);
    }

    /// Unregister a handler by name. Returns `true` if it was found and removed.
    pub async fn unregister(&self, name: &str) -> bool {
        let mut handlers = self.handlers.write().await;
        let before = handlers.len();
        handlers.retain(|e| e.handler.name() != name);
        handlers.len() < before
    }

    /// List all registered handler names (in run order).
    pub async fn list(&self) -> Vec<String> {
        let handlers = self.handlers.read().await;
        handlers.iter().map(|e| e.handler.name().to_string()).collect()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HookDispatch for HookRegistry {
    async fn emit(&self, event: &HookEvent) -> HookResult {
        let point = event.point();

        // Snapshot matching handlers so the guard is not held across awaits.
        let matching: Vec<Arc<dyn HookHandler>> = {
            let handlers = self.handlers.read().await;
            handlers
                .iter()
                .filter(|e| e.handler.events().contains(&point))
                .map(|e| e.handler.clone())
                .collect()
        };

        let mut merged: Option<HookResult> = None;

        for handler in &matching {
            match handler.handle(event).await {
                Ok(verdict) => match verdict.action {
                    HookAction::Deny => {
                        tracing::debug!(hook = handler.name(), event = %point, "Hook denied");
                        return verdict;
                    }
                    HookAction::Modify => {
                        tracing::debug!(hook = handler.name(), event = %point, "Hook modified");
                        let acc = merged.get_or_insert_with(|| {
                            HookResult::modify(serde_json::Map::new())
                        });
                        if let (Some(into), Some(from)) = (acc.data.as_mut(), verdict.data) {
                            into.extend(from);
                        }
                        if verdict.reason.is_some() {
                            acc.reason = verdict.reason;
                        }
                    }
                    HookAction::Allow => {}
                },
                Err(e) => {
                    tracing::warn!(hook = handler.name(), event = %point, error = %e, "Hook failed (fail-open)");
                }
            }
        }

        merged.unwrap_or_default()
    }
}
