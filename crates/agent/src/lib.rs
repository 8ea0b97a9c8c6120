//! The event-driven agent loop.
//!
//! Each session follows a **Complete → Vet → Act → Record** cycle:
//!
//! 1. **Receive** the prompt and announce `session:start`
//! 2. **Complete** the conversation with the selected provider
//! 3. **If tool calls**: let hooks veto or rewrite each call, execute the
//!    survivors, record one tool reply per call, compact if needed, loop
//! 4. **If text response**: record it and announce `session:end`
//!
//! The loop continues until the model answers without tool calls, the
//! provider fails, or `max_iterations` is reached.

pub mod loop_runner;
pub mod mount;
pub mod selection;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{EventDrivenOrchestrator, NO_PROVIDERS};
pub use mount::{mount, ModuleCoordinator, MountError, ORCHESTRATOR_SLOT};
pub use selection::select_provider;
