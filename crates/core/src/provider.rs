//! Provider trait: the abstraction over LLM backends.
//!
//! A Provider knows how to send a conversation to an LLM and get the next
//! assistant turn back, and how to pull the tool calls out of that turn.
//! HTTP clients live outside this workspace; the orchestrator only sees
//! this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ProviderError;
use crate::message::Message;
use crate::tool::ToolCall;

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded
    pub model: String,

    /// Provider-specific metadata
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ProviderResponse {
    /// The text content of the generated message (may be empty).
    pub fn content(&self) -> &str {
        &self.message.content
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The orchestration loop calls
/// `complete()` without knowing which provider is being used.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter", "anthropic").
    fn name(&self) -> &str;

    /// Send the conversation plus the currently available tools and get the
    /// next assistant turn.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Extract the tool calls requested by a response, in provider order.
    ///
    /// Must not fail: a response without tool calls yields an empty vec.
    /// The default decodes the JSON argument strings carried on the
    /// message; arguments that are not valid JSON become an empty object.
    fn parse_tool_calls(&self, response: &ProviderResponse) -> Vec<ToolCall> {
        response
            .message
            .tool_calls
            .iter()
            .map(|tc| {
                let arguments = serde_json::from_str(&tc.arguments).unwrap_or_else(|e| {
                    tracing::warn!(tool = %tc.name, error = %e, "Undecodable tool arguments");
                    serde_json::Value::Object(serde_json::Map::new())
                });
                ToolCall::new(tc.id.clone(), tc.name.clone(), arguments)
            })
            .collect()
    }
}

/// Named providers available to a session.
///
/// Backed by a `BTreeMap`, so iteration is in lexicographic key order.
/// Provider selection relies on that order for its "first available"
/// fallback.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under `key`. Replaces any existing entry.
    pub fn register(&mut self, key: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(key.into(), provider);
    }

    /// Get a provider by key.
    pub fn get(&self, key: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.get(key)
    }

    /// The entry with the smallest key, if any.
    pub fn first(&self) -> Option<(&str, &Arc<dyn Provider>)> {
        self.providers.iter().next().map(|(k, p)| (k.as_str(), p))
    }

    /// List all registered keys, in order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
