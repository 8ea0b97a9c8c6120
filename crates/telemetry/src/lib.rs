//! Session telemetry for hookloop.
//!
//! A [`TelemetryRecorder`] registers on the hook bus like any other
//! observer, keeps an ordered log of lifecycle events and the structured
//! `ErrorEvent`s carried by `error:*` emissions, and folds them into a
//! serializable [`SessionSummary`].

pub mod model;
pub mod recorder;

pub use model::{EventRecord, SessionSummary, ToolStats};
pub use recorder::TelemetryRecorder;

/// Errors from the telemetry subsystem.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
