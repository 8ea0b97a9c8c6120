//! Data model for recorded lifecycle events and session summaries.

use chrono::{DateTime, Utc};
use hookloop_core::decision::{ErrorEvent, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ── Event log ─────────────────────────────────────────────────────────────

/// One hook emission as seen by the recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique identifier.
    pub id: String,
    /// Event name on the bus, e.g. `tool:post`.
    pub name: String,
    /// When the event was observed.
    pub timestamp: DateTime<Utc>,
    /// The event payload, without the event name.
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl EventRecord {
    pub fn new(name: impl Into<String>, payload: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

// ── Aggregated views ──────────────────────────────────────────────────────

/// Tool execution counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStats {
    /// Executions that reached `tool:post`.
    pub executed: u64,
    /// Of those, how many reported `success: false`.
    pub failed: u64,
}

impl ToolStats {
    pub fn succeeded(&self) -> u64 {
        self.executed - self.failed
    }
}

/// Everything the recorder knows about a session, in one serializable value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// The prompt from `session:start`.
    pub prompt: Option<String>,
    /// The response from `session:end`. `None` while the session runs.
    pub final_response: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Wall-clock duration between start and end, when both were seen.
    pub duration_ms: Option<u64>,
    /// Number of events recorded.
    pub event_count: usize,
    pub tools: ToolStats,
    /// Execution counts per tool name.
    pub tools_by_name: BTreeMap<String, ToolStats>,
    /// Tools replaced by a scheduler.
    pub scheduler_overrides: u64,
    pub compactions: u64,
    /// Errors counted by severity name.
    pub errors_by_severity: BTreeMap<Severity, u64>,
    pub errors: Vec<ErrorEvent>,
}

impl SessionSummary {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// The most severe error seen, if any.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.errors.iter().map(|e| e.severity).max()
    }

    /// Whether the session ended with an answer rather than an error string.
    pub fn completed(&self) -> bool {
        matches!(&self.final_response, Some(r) if !r.is_empty() && !r.starts_with("Error"))
    }
}
