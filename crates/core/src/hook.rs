//! Hook contract: lifecycle events announced by the orchestrator and the
//! verdicts observers send back.
//!
//! The event catalogue is closed: one [`HookEvent`] variant per lifecycle
//! point, each with a typed payload. Observers answer every emission with a
//! [`HookResult`]; the orchestrator only acts on the verdicts for
//! `tool:selecting` and `tool:pre`, everything else is a notification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::decision::ErrorEvent;
use crate::error::HookError;
use crate::provider::ToolDefinition;

/// Points in the orchestration lifecycle where hooks can observe or decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    SessionStart,
    ToolSelecting,
    ToolSelected,
    ToolPre,
    ToolPost,
    ContextPreCompact,
    SessionEnd,
    ProviderError,
    ToolError,
}

impl HookPoint {
    pub const ALL: [HookPoint; 9] = [
        HookPoint::SessionStart,
        HookPoint::ToolSelecting,
        HookPoint::ToolSelected,
        HookPoint::ToolPre,
        HookPoint::ToolPost,
        HookPoint::ContextPreCompact,
        HookPoint::SessionEnd,
        HookPoint::ProviderError,
        HookPoint::ToolError,
    ];

    /// The event name on the bus.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStart => "session:start",
            Self::ToolSelecting => "tool:selecting",
            Self::ToolSelected => "tool:selected",
            Self::ToolPre => "tool:pre",
            Self::ToolPost => "tool:post",
            Self::ContextPreCompact => "context:pre-compact",
            Self::SessionEnd => "session:end",
            Self::ProviderError => "error:provider",
            Self::ToolError => "error:tool",
        }
    }
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HookPoint {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| HookError::UnknownEvent(s.to_string()))
    }
}

/// Who picked the tool that is about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionSource {
    Llm,
    Scheduler,
}

/// A lifecycle event with its payload.
///
/// Serializes as `{"event": "<name>", ...payload keys}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum HookEvent {
    #[serde(rename = "session:start")]
    SessionStart { prompt: String },

    #[serde(rename = "tool:selecting")]
    ToolSelecting {
        tool: String,
        arguments: serde_json::Value,
        available_tools: Vec<String>,
    },

    #[serde(rename = "tool:selected")]
    ToolSelected {
        tool: String,
        source: SelectionSource,
        /// The model's original choice when a scheduler replaced it.
        original_tool: Option<String>,
    },

    #[serde(rename = "tool:pre")]
    ToolPre {
        tool: String,
        arguments: serde_json::Value,
        /// Metadata of the resolved tool, absent when it does not exist.
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_obj: Option<ToolDefinition>,
    },

    #[serde(rename = "tool:post")]
    ToolPost {
        tool: String,
        result: serde_json::Value,
    },

    #[serde(rename = "context:pre-compact")]
    ContextPreCompact,

    #[serde(rename = "session:end")]
    SessionEnd { response: String },

    #[serde(rename = "error:provider")]
    ProviderFailed(ErrorEvent),

    #[serde(rename = "error:tool")]
    ToolFailed {
        #[serde(skip_serializing_if = "Option::is_none")]
        tool: Option<String>,
        #[serde(flatten)]
        error: ErrorEvent,
    },
}

impl HookEvent {
    pub fn point(&self) -> HookPoint {
        match self {
            Self::SessionStart { .. } => HookPoint::SessionStart,
            Self::ToolSelecting { .. } => HookPoint::ToolSelecting,
            Self::ToolSelected { .. } => HookPoint::ToolSelected,
            Self::ToolPre { .. } => HookPoint::ToolPre,
            Self::ToolPost { .. } => HookPoint::ToolPost,
            Self::ContextPreCompact => HookPoint::ContextPreCompact,
            Self::SessionEnd { .. } => HookPoint::SessionEnd,
            Self::ProviderFailed(_) => HookPoint::ProviderError,
            Self::ToolFailed { .. } => HookPoint::ToolError,
        }
    }

    /// The event name on the bus, e.g. `"tool:selecting"`.
    pub fn name(&self) -> &'static str {
        self.point().as_str()
    }

    /// The payload mapping, without the event name.
    pub fn payload(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("event");
                map
            }
            _ => serde_json::Map::new(),
        }
    }

    /// The error event carried by `error:*` emissions.
    pub fn error_event(&self) -> Option<&ErrorEvent> {
        match self {
            Self::ProviderFailed(error) | Self::ToolFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// What an observer wants done with the event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookAction {
    #[default]
    Allow,
    Deny,
    Modify,
}

/// The verdict returned for every emission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookResult {
    pub action: HookAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
}

impl HookResult {
    pub fn allow() -> Self {
        Self::default()
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            action: HookAction::Deny,
            reason: Some(reason.into()),
            data: None,
        }
    }

    pub fn modify(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            action: HookAction::Modify,
            reason: None,
            data: Some(data),
        }
    }

    /// Shorthand for a `modify` verdict replacing the tool with `tool`.
    pub fn replace_tool(tool: impl Into<String>) -> Self {
        let mut data = serde_json::Map::new();
        data.insert("tool".into(), serde_json::Value::String(tool.into()));
        Self::modify(data)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn is_deny(&self) -> bool {
        self.action == HookAction::Deny
    }

    /// The replacement tool name carried in `data["tool"]`, if any.
    pub fn selected_tool(&self) -> Option<&str> {
        self.data.as_ref()?.get("tool")?.as_str()
    }
}

/// The dispatch side of the hook bus, as seen by the orchestrator.
///
/// Called synchronously and sequentially for every event. The returned
/// verdict is authoritative: ordering and aggregation across observers
/// belong to the implementation.
#[async_trait]
pub trait HookDispatch: Send + Sync {
    async fn emit(&self, event: &HookEvent) -> HookResult;
}

/// A single observer registered on a hook bus.
#[async_trait]
pub trait HookHandler: Send + Sync {
    /// A unique name, used for unregistering and in logs.
    fn name(&self) -> &str;

    /// The lifecycle points this handler wants to see.
    fn events(&self) -> &[HookPoint];

    async fn handle(&self, event: &HookEvent) -> Result<HookResult, HookError>;
}

/// A dispatcher with no observers: everything is allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

#[async_trait]
impl HookDispatch for NoopHooks {
    async fn emit(&self, _event: &HookEvent) -> HookResult {
        HookResult::allow()
    }
}
