//! Provider selection: which provider drives a session.

use hookloop_core::provider::{Provider, ProviderRegistry};
use std::sync::Arc;

/// Pick the provider for a whole session.
///
/// Returns the configured default when it is registered; otherwise the
/// first entry in the registry's iteration order, which is lexicographic
/// by key. `None` when no providers are registered.
pub fn select_provider<'a>(
    providers: &'a ProviderRegistry,
    default_provider: Option<&str>,
) -> Option<&'a Arc<dyn Provider>> {
    if let Some(provider) = default_provider.and_then(|key| providers.get(key)) {
        return Some(provider);
    }

    if let Some(key) = default_provider {
        tracing::debug!(default = key, "Configured default provider not registered, using first");
    }

    providers.first().map(|(_, provider)| provider)
}
