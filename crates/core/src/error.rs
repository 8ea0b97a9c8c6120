//! Error types for the hookloop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator boundary has its own error enum.

use thiserror::Error;

// --- Collaborator errors ---

/// Failure of a provider completion. Fatal to the session that hit it.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),
}

/// Failure of a tool execution. Recorded as a failed result, never fatal.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Permission denied: {tool_name}: {reason}")]
    PermissionDenied { tool_name: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum HookError {
    #[error("Hook '{name}' failed: {reason}")]
    HandlerFailed { name: String, reason: String },

    #[error("Unknown hook event: {0}")]
    UnknownEvent(String),
}
