//! Thread-safe telemetry recorder: a hook handler that observes every
//! lifecycle event and folds it into a session summary.

use crate::TelemetryError;
use crate::model::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hookloop_core::decision::ErrorEvent;
use hookloop_core::error::HookError;
use hookloop_core::hook::{HookEvent, HookHandler, HookPoint, HookResult, SelectionSource};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Records lifecycle events for one session.
///
/// Subscribes to every hook point and always answers `allow`, so it can be
/// registered next to deciding handlers without changing any outcome.
pub struct TelemetryRecorder {
    name: String,
    events: RwLock<Vec<EventRecord>>,
    errors: RwLock<Vec<ErrorEvent>>,
    totals: RwLock<RunningTotals>,
}

/// Internal running totals, updated per event.
#[derive(Debug, Default)]
struct RunningTotals {
    prompt: Option<String>,
    final_response: Option<String>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    tools: ToolStats,
    tools_by_name: BTreeMap<String, ToolStats>,
    scheduler_overrides: u64,
    compactions: u64,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self::named("telemetry")
    }

    /// Create a recorder registered under `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: RwLock::new(Vec::new()),
            errors: RwLock::new(Vec::new()),
            totals: RwLock::new(RunningTotals::default()),
        }
    }

    /// Fold one event into the log and totals.
    pub fn record(&self, event: &HookEvent) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(EventRecord::new(event.name(), event.payload()));

        if let Some(error) = event.error_event() {
            tracing::debug!(
                event = event.name(),
                error_type = %error.error_type,
                severity = %error.severity,
                "Recorded error event"
            );
            self.errors
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(error.clone());
            return;
        }

        let mut totals = self.totals.write().unwrap_or_else(PoisonError::into_inner);
        match event {
            HookEvent::SessionStart { prompt } => {
                totals.prompt = Some(prompt.clone());
                totals.started_at = Some(Utc::now());
            }
            HookEvent::ToolSelected { source, .. } => {
                if *source == SelectionSource::Scheduler {
                    totals.scheduler_overrides += 1;
                }
            }
            HookEvent::ToolPost { tool, result } => {
                let failed = result.get("success").and_then(|s| s.as_bool()) == Some(false);
                let per_tool = totals.tools_by_name.entry(tool.clone()).or_default();
                per_tool.executed += 1;
                per_tool.failed += u64::from(failed);
                totals.tools.executed += 1;
                totals.tools.failed += u64::from(failed);
            }
            HookEvent::ContextPreCompact => totals.compactions += 1,
            HookEvent::SessionEnd { response } => {
                totals.final_response = Some(response.clone());
                totals.ended_at = Some(Utc::now());
            }
            _ => {}
        }
    }

    /// The ordered event log.
    pub fn event_log(&self) -> Vec<EventRecord> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Error events, in the order they were emitted.
    pub fn errors(&self) -> Vec<ErrorEvent> {
        self.errors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn summary(&self) -> SessionSummary {
        let event_count = self.events.read().unwrap_or_else(PoisonError::into_inner).len();
        let errors = self.errors();
        let totals = self.totals.read().unwrap_or_else(PoisonError::into_inner);

        let mut errors_by_severity = BTreeMap::new();
        for error in &errors {
            *errors_by_severity.entry(error.severity).or_insert(0) += 1;
        }

        let duration_ms = match (totals.started_at, totals.ended_at) {
            (Some(start), Some(end)) => {
                Some(end.signed_duration_since(start).num_milliseconds().max(0) as u64)
            }
            _ => None,
        };

        SessionSummary {
            prompt: totals.prompt.clone(),
            final_response: totals.final_response.clone(),
            started_at: totals.started_at,
            ended_at: totals.ended_at,
            duration_ms,
            event_count,
            tools: totals.tools,
            tools_by_name: totals.tools_by_name.clone(),
            scheduler_overrides: totals.scheduler_overrides,
            compactions: totals.compactions,
            errors_by_severity,
            errors,
        }
    }

    /// The summary as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String, TelemetryError> {
        Ok(serde_json::to_string_pretty(&self.summary())?)
    }

    /// Forget everything recorded so far.
    pub fn reset(&self) {
        self.events.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.errors.write().unwrap_or_else(PoisonError::into_inner).clear();
        *self.totals.write().unwrap_or_else(PoisonError::into_inner) = RunningTotals::default();
    }
}

#[async_trait]
impl HookHandler for TelemetryRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn events(&self) -> &[HookPoint] {
        &HookPoint::ALL
    }

    async fn handle(&self, event: &HookEvent) -> Result<HookResult, HookError> {
        self.record(event);
        Ok(HookResult::allow())
    }
}
