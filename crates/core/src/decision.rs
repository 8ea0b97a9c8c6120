//! Decision event model: the typed payloads a scheduler exchanges over the
//! hook bus.
//!
//! Every request shares a [`DecisionRequest`] header (event id, timestamp,
//! session, metadata). Responses carry a selection, a score or verdict and a
//! rationale. The event-driven orchestrator only consumes the tool-selection
//! shape, via `From<ToolResolutionResponse> for HookResult`; the agent and
//! context shapes exist for other orchestrators sharing the same bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hook::HookResult;
use crate::message::{Message, SessionId};

type Metadata = serde_json::Map<String, serde_json::Value>;

/// Header shared by all decision requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: SessionId,
    #[serde(default)]
    pub metadata: Metadata,
}

impl DecisionRequest {
    /// A fresh header for `session_id`, stamped now.
    pub fn new(session_id: SessionId) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            session_id,
            metadata: Metadata::new(),
        }
    }
}

// ── Tool selection ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResolutionRequest {
    #[serde(flatten)]
    pub header: DecisionRequest,
    pub available_tools: Vec<String>,
    #[serde(default)]
    pub context: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResolutionResponse {
    pub selected_tool: String,
    pub score: f64,
    pub rationale: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A scheduler's tool choice becomes a `modify` verdict naming the tool.
impl From<ToolResolutionResponse> for HookResult {
    fn from(response: ToolResolutionResponse) -> Self {
        let mut data = Metadata::new();
        data.insert("tool".into(), response.selected_tool.into());
        data.insert("score".into(), response.score.into());
        HookResult::modify(data).with_reason(response.rationale)
    }
}

// ── Agent selection ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResolutionRequest {
    #[serde(flatten)]
    pub header: DecisionRequest,
    pub available_agents: Vec<String>,
    pub task: String,
    #[serde(default)]
    pub context: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResolutionResponse {
    pub selected_agent: String,
    pub score: f64,
    pub rationale: String,
    #[serde(default)]
    pub metadata: Metadata,
}

// ── Context management ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResolutionRequest {
    #[serde(flatten)]
    pub header: DecisionRequest,
    pub context_size: usize,
    pub max_size: usize,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResolutionResponse {
    pub should_compact: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compaction_strategy: Option<String>,
    pub rationale: String,
    #[serde(default)]
    pub metadata: Metadata,
}

// ── Errors ────────────────────────────────────────────────────────────────

/// How bad an error is, for telemetry triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Structured error event for telemetry.
///
/// Emitted on the hook bus and never stored by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// e.g. "completion_failed", "tool_not_found", "execution_failed"
    pub error_type: String,
    #[serde(default)]
    pub error_code: Option<String>,
    pub error_message: String,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub recovery_attempted: bool,
    #[serde(default)]
    pub recovery_successful: bool,
    #[serde(default)]
    pub fallback_used: Option<String>,
    pub severity: Severity,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ErrorEvent {
    pub fn new(
        error_type: impl Into<String>,
        error_message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            error_code: None,
            error_message: error_message.into(),
            stack_trace: None,
            recovery_attempted: false,
            recovery_successful: false,
            fallback_used: None,
            severity,
            metadata: Metadata::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Record that recovery was attempted, and whether it worked.
    pub fn with_recovery(mut self, successful: bool) -> Self {
        self.recovery_attempted = true;
        self.recovery_successful = successful;
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback_used = Some(fallback.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
