//! # hookloop core
//!
//! Domain types, collaborator traits and hook contracts for the hookloop
//! orchestrator. This crate has **no framework dependencies**; it defines
//! the model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the orchestration loop is a trait here:
//! - [`Provider`] produces the next assistant turn
//! - [`Tool`] executes a capability
//! - [`ContextManager`] owns the message history
//! - [`HookDispatch`] announces lifecycle events and returns verdicts
//!
//! Implementations live elsewhere, which keeps the loop testable with
//! scripted stand-ins.

pub mod context;
pub mod decision;
pub mod error;
pub mod hook;
pub mod hook_registry;
pub mod message;
pub mod orchestrator;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use context::{CompactionPolicy, ContextManager, InMemoryContext};
pub use decision::{
    AgentResolutionRequest, AgentResolutionResponse, ContextResolutionRequest,
    ContextResolutionResponse, DecisionRequest, ErrorEvent, Severity, ToolResolutionRequest,
    ToolResolutionResponse,
};
pub use error::{HookError, ProviderError, ToolError};
pub use hook::{
    HookAction, HookDispatch, HookEvent, HookHandler, HookPoint, HookResult, NoopHooks,
    SelectionSource,
};
pub use hook_registry::HookRegistry;
pub use message::{Conversation, Message, MessageToolCall, Role, SessionId};
pub use orchestrator::Orchestrator;
pub use provider::{Provider, ProviderRegistry, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
