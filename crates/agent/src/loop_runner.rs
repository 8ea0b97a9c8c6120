//! The event-driven orchestration loop.

use async_trait::async_trait;
use hookloop_config::OrchestratorConfig;
use hookloop_core::context::ContextManager;
use hookloop_core::decision::{ErrorEvent, Severity};
use hookloop_core::hook::{HookAction, HookDispatch, HookEvent, SelectionSource};
use hookloop_core::message::Message;
use hookloop_core::orchestrator::Orchestrator;
use hookloop_core::provider::ProviderRegistry;
use hookloop_core::tool::{ToolCall, ToolRegistry, ToolResult};
use tracing::{debug, error, info, warn};

use crate::selection::select_provider;

/// Returned when no provider is registered.
pub const NO_PROVIDERS: &str = "Error: No providers available";

const SELECTION_DENIED: &str = "Tool execution denied by scheduler";
const EXECUTION_DENIED: &str = "Tool execution denied";

/// An orchestrator that trusts the model's tool choices, while letting
/// hook observers veto or rewrite each one before it runs.
///
/// Two independent veto points exist per tool call: `tool:selecting`
/// (which may also replace the tool) and `tool:pre`. Every tool call gets
/// exactly one tool-role reply in the context, whatever its outcome.
#[derive(Debug, Clone, Default)]
pub struct EventDrivenOrchestrator {
    config: OrchestratorConfig,
}

/// The single tool-role reply recorded for a call, plus a notification
/// to emit once the reply is in the context.
struct CallOutcome {
    reply: Message,
    then_emit: Option<HookEvent>,
}

impl CallOutcome {
    fn reply(reply: Message) -> Self {
        Self {
            reply,
            then_emit: None,
        }
    }
}

impl EventDrivenOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Resolve, vet, execute and record one tool call.
    async fn process_tool_call(
        &self,
        call: &ToolCall,
        tools: &ToolRegistry,
        available_tools: &[String],
        hooks: &dyn HookDispatch,
    ) -> CallOutcome {
        let selecting = hooks
            .emit(&HookEvent::ToolSelecting {
                tool: call.name.clone(),
                arguments: call.arguments.clone(),
                available_tools: available_tools.to_vec(),
            })
            .await;

        let (tool_name, source) = match selecting.action {
            HookAction::Deny => {
                let reason = selecting
                    .reason
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| SELECTION_DENIED.into());
                warn!(tool = %call.name, reason = %reason, "Tool vetoed by scheduler");
                return CallOutcome::reply(Message::tool_result(
                    &call.id,
                    &call.name,
                    format!("Error: {reason}"),
                ));
            }
            HookAction::Modify => {
                let name = selecting.selected_tool().unwrap_or(call.name.as_str()).to_string();
                info!(from = %call.name, to = %name, "Tool changed by scheduler");
                (name, SelectionSource::Scheduler)
            }
            HookAction::Allow => (call.name.clone(), SelectionSource::Llm),
        };

        // Observability only; the verdict is ignored.
        hooks
            .emit(&HookEvent::ToolSelected {
                tool: tool_name.clone(),
                source,
                original_tool: (source == SelectionSource::Scheduler).then(|| call.name.clone()),
            })
            .await;

        let tool = tools.get(&tool_name);

        let pre = hooks
            .emit(&HookEvent::ToolPre {
                tool: tool_name.clone(),
                arguments: call.arguments.clone(),
                tool_obj: tool.map(|t| t.to_definition()),
            })
            .await;

        if pre.is_deny() {
            let reason = pre
                .reason
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| EXECUTION_DENIED.into());
            warn!(tool = %tool_name, reason = %reason, "Tool denied by pre-execution hook");
            return CallOutcome::reply(Message::tool_result(
                &call.id,
                &tool_name,
                format!("Error: {reason}"),
            ));
        }

        let Some(tool) = tool else {
            let message = format!("Tool {tool_name} not found");
            warn!(tool = %tool_name, "Requested tool is not registered");
            return CallOutcome {
                reply: Message::tool_result(&call.id, &tool_name, format!("Error: {message}")),
                then_emit: Some(HookEvent::ToolFailed {
                    tool: None,
                    error: ErrorEvent::new("tool_not_found", message, Severity::Medium),
                }),
            };
        };

        let start = std::time::Instant::now();
        let result = match tool.execute(call.arguments.clone()).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %tool_name, error = %e, "Tool execution failed");
                hooks
                    .emit(&HookEvent::ToolFailed {
                        tool: Some(tool_name.clone()),
                        error: ErrorEvent::new("execution_failed", e.to_string(), Severity::High),
                    })
                    .await;
                ToolResult::failure(e.to_string())
            }
        };
        debug!(
            tool = %tool_name,
            success = result.success,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tool call finished"
        );

        let serialized = serde_json::to_value(&result).unwrap_or_else(|e| {
            warn!(tool = %tool_name, error = %e, "Could not serialize tool result");
            serde_json::Value::String(result.to_message_content())
        });
        hooks
            .emit(&HookEvent::ToolPost {
                tool: tool_name.clone(),
                result: serialized,
            })
            .await;

        CallOutcome::reply(Message::tool_result(
            &call.id,
            &tool_name,
            result.to_message_content(),
        ))
    }
}

#[async_trait]
impl Orchestrator for EventDrivenOrchestrator {
    /// Run one session to completion.
    ///
    /// Returns the model's final answer, an `"Error..."` string when the
    /// session could not run or the provider failed, or the empty string
    /// when `max_iterations` ran out before the model stopped calling tools.
    async fn execute(
        &self,
        prompt: &str,
        context: &dyn ContextManager,
        providers: &ProviderRegistry,
        tools: &ToolRegistry,
        hooks: &dyn HookDispatch,
    ) -> String {
        let session_id = context.session_id().clone();

        hooks
            .emit(&HookEvent::SessionStart {
                prompt: prompt.to_string(),
            })
            .await;
        context.add_message(Message::user(prompt)).await;

        let Some(provider) = select_provider(providers, self.config.default_provider.as_deref())
        else {
            warn!(session_id = %session_id, "No providers available");
            return NO_PROVIDERS.to_string();
        };

        info!(
            session_id = %session_id,
            provider = provider.name(),
            tools = tools.len(),
            max_iterations = self.config.max_iterations,
            "Starting session"
        );

        let tool_definitions = tools.definitions();
        let available_tools = tools.names();
        let mut final_response = String::new();

        for iteration in 1..=self.config.max_iterations {
            debug!(session_id = %session_id, iteration = iteration, "Orchestration iteration");

            let messages = context.get_messages().await;

            let response = match provider.complete(&messages, &tool_definitions).await {
                Ok(response) => response,
                Err(e) => {
                    error!(session_id = %session_id, error = %e, "Provider error");
                    hooks
                        .emit(&HookEvent::ProviderFailed(ErrorEvent::new(
                            "completion_failed",
                            e.to_string(),
                            Severity::High,
                        )))
                        .await;
                    final_response = format!("Error getting response: {e}");
                    break;
                }
            };

            if let Some(usage) = &response.usage {
                debug!(model = %response.model, tokens = usage.total_tokens, "Completion usage");
            }

            let tool_calls = provider.parse_tool_calls(&response);

            if tool_calls.is_empty() {
                final_response = response.content().to_string();
                context
                    .add_message(Message::assistant(final_response.clone()))
                    .await;
                break;
            }

            debug!(tool_count = tool_calls.len(), "Executing tool calls");
            context
                .add_message(Message::assistant_with_tool_calls(
                    response.content(),
                    &tool_calls,
                ))
                .await;

            // Strictly sequential: later calls may depend on earlier ones.
            for call in &tool_calls {
                let outcome = self
                    .process_tool_call(call, tools, &available_tools, hooks)
                    .await;
                context.add_message(outcome.reply).await;
                if let Some(event) = outcome.then_emit {
                    hooks.emit(&event).await;
                }
            }

            if context.should_compact().await {
                debug!(session_id = %session_id, iteration = iteration, "Compacting context");
                hooks.emit(&HookEvent::ContextPreCompact).await;
                context.compact().await;
            }
        }

        if final_response.is_empty() {
            warn!(session_id = %session_id, "Session ended without a final answer");
        }

        hooks
            .emit(&HookEvent::SessionEnd {
                response: final_response.clone(),
            })
            .await;

        info!(session_id = %session_id, "Session finished");
        final_response
    }
}
