//! Orchestrator trait: what occupies the coordinator's "orchestrator" slot.

use async_trait::async_trait;

use crate::context::ContextManager;
use crate::hook::HookDispatch;
use crate::provider::ProviderRegistry;
use crate::tool::ToolRegistry;

/// Drives one session from a user prompt to a final response.
///
/// Registries are borrowed read-only for the duration of the call, so
/// independent sessions may share them. Failures are reported in the
/// returned text, never raised.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn execute(
        &self,
        prompt: &str,
        context: &dyn ContextManager,
        providers: &ProviderRegistry,
        tools: &ToolRegistry,
        hooks: &dyn HookDispatch,
    ) -> String;
}
