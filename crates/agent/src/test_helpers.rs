//! Shared test helpers for orchestration tests.
//!
//! Scripted stand-ins for every collaborator of the loop. Each can write to
//! a shared [`Journal`] so tests can assert the interleaving of provider
//! calls, hook emissions, tool executions and context mutations.

use async_trait::async_trait;
use hookloop_core::context::{ContextManager, InMemoryContext};
use hookloop_core::error::{ProviderError, ToolError};
use hookloop_core::hook::{HookDispatch, HookEvent, HookPoint, HookResult};
use hookloop_core::message::{Message, MessageToolCall, Role, SessionId};
use hookloop_core::provider::{Provider, ProviderResponse, ToolDefinition, Usage};
use hookloop_core::tool::{Tool, ToolResult};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Ordered log of collaborator activity shared across mocks.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

fn note(journal: &Option<Journal>, entry: impl Into<String>) {
    if let Some(j) = journal {
        j.lock().unwrap().push(entry.into());
    }
}

// ── Provider ──────────────────────────────────────────────────────────────

/// A mock provider that returns a sequence of scripted outcomes.
///
/// Each call to `complete` returns the next outcome in the queue. With
/// `repeating`, the last outcome is returned forever. Panics if more
/// calls are made than outcomes provided.
pub struct SequentialMockProvider {
    name: String,
    outcomes: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    repeat_last: bool,
    call_count: AtomicUsize,
    seen_tools: Mutex<Vec<Vec<String>>>,
    journal: Option<Journal>,
}

impl SequentialMockProvider {
    pub fn new(outcomes: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self::named("sequential_mock", outcomes)
    }

    pub fn named(name: &str, outcomes: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            name: name.into(),
            outcomes: Mutex::new(outcomes.into()),
            repeat_last: false,
            call_count: AtomicUsize::new(0),
            seen_tools: Mutex::new(Vec::new()),
            journal: None,
        }
    }

    /// Create a provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(make_text_response(text))])
    }

    /// Create a provider that returns `response` on every call.
    pub fn repeating(response: ProviderResponse) -> Self {
        let mut provider = Self::new(vec![Ok(response)]);
        provider.repeat_last = true;
        provider
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Tool names offered on each call.
    pub fn seen_tools(&self) -> Vec<Vec<String>> {
        self.seen_tools.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        _messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ProviderResponse, ProviderError> {
        note(&self.journal, "complete");
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.seen_tools
            .lock()
            .unwrap()
            .push(tools.iter().map(|t| t.name.clone()).collect());

        let mut outcomes = self.outcomes.lock().unwrap();
        if self.repeat_last && outcomes.len() == 1 {
            return outcomes[0].clone();
        }
        match outcomes.pop_front() {
            Some(outcome) => outcome,
            None => panic!(
                "SequentialMockProvider: no more responses (call #{})",
                count + 1
            ),
        }
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
        metadata: serde_json::Map::new(),
    }
}

/// Create a response requesting `(id, tool, arguments)` calls, in order.
pub fn make_tool_call_response(
    calls: &[(&str, &str, serde_json::Value)],
    content: &str,
) -> ProviderResponse {
    let mut message = Message::assistant(content);
    message.tool_calls = calls
        .iter()
        .map(|(id, name, args)| MessageToolCall {
            id: (*id).into(),
            name: (*name).into(),
            arguments: args.to_string(),
        })
        .collect();

    ProviderResponse {
        message,
        usage: None,
        model: "mock-model".into(),
        metadata: serde_json::Map::new(),
    }
}

// ── Hooks ─────────────────────────────────────────────────────────────────

/// A hook dispatcher that records every event and answers with scripted
/// verdicts per hook point (allow when nothing is scripted).
#[derive(Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<HookEvent>>,
    verdicts: Mutex<HashMap<HookPoint, VecDeque<HookResult>>>,
    journal: Option<Journal>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `verdict` as the answer to the next emission at `point`.
    pub fn on(self, point: HookPoint, verdict: HookResult) -> Self {
        self.verdicts
            .lock()
            .unwrap()
            .entry(point)
            .or_default()
            .push_back(verdict);
        self
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.name()).collect()
    }

    pub fn count(&self, point: HookPoint) -> usize {
        self.events().iter().filter(|e| e.point() == point).count()
    }

    pub fn payloads(&self, point: HookPoint) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.events()
            .iter()
            .filter(|e| e.point() == point)
            .map(|e| e.payload())
            .collect()
    }
}

#[async_trait]
impl HookDispatch for RecordingHooks {
    async fn emit(&self, event: &HookEvent) -> HookResult {
        note(&self.journal, format!("emit:{}", event.name()));
        self.events.lock().unwrap().push(event.clone());
        self.verdicts
            .lock()
            .unwrap()
            .get_mut(&event.point())
            .and_then(|q| q.pop_front())
            .unwrap_or_default()
    }
}

// ── Tools ─────────────────────────────────────────────────────────────────

enum ToolBehavior {
    Output(serde_json::Value),
    /// Returns a failed `ToolResult` without raising.
    SoftFail(String),
    /// Returns `Err`, as a crashing tool would.
    Raise(String),
}

/// A tool with scripted behavior that counts its executions.
pub struct CountingTool {
    name: String,
    behavior: ToolBehavior,
    calls: AtomicUsize,
    seen_arguments: Mutex<Vec<serde_json::Value>>,
    journal: Option<Journal>,
}

impl CountingTool {
    fn build(name: &str, behavior: ToolBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            calls: AtomicUsize::new(0),
            seen_arguments: Mutex::new(Vec::new()),
            journal: None,
        }
    }

    pub fn ok(name: &str, output: serde_json::Value) -> Self {
        Self::build(name, ToolBehavior::Output(output))
    }

    pub fn soft_failing(name: &str, message: &str) -> Self {
        Self::build(name, ToolBehavior::SoftFail(message.into()))
    }

    pub fn raising(name: &str, reason: &str) -> Self {
        Self::build(name, ToolBehavior::Raise(reason.into()))
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_arguments(&self) -> Vec<serde_json::Value> {
        self.seen_arguments.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Scripted test tool"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object" })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        note(&self.journal, format!("execute:{}", self.name));
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_arguments.lock().unwrap().push(arguments);

        match &self.behavior {
            ToolBehavior::Output(value) => Ok(ToolResult::ok(value.clone())),
            ToolBehavior::SoftFail(message) => Ok(ToolResult::failure(message.clone())),
            ToolBehavior::Raise(reason) => Err(ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

// ── Context ───────────────────────────────────────────────────────────────

/// An in-memory context that journals every call and answers
/// `should_compact` with a fixed value.
pub struct RecordingContext {
    inner: InMemoryContext,
    wants_compaction: bool,
    compactions: AtomicUsize,
    journal: Journal,
}

impl RecordingContext {
    pub fn new(journal: &Journal) -> Self {
        Self {
            inner: InMemoryContext::for_session(SessionId::from("test-session")),
            wants_compaction: false,
            compactions: AtomicUsize::new(0),
            journal: journal.clone(),
        }
    }

    pub fn always_compact(mut self) -> Self {
        self.wants_compaction = true;
        self
    }

    pub fn compactions(&self) -> usize {
        self.compactions.load(Ordering::SeqCst)
    }
}

fn role_name(role: &Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
        Role::Tool => "tool",
    }
}

#[async_trait]
impl ContextManager for RecordingContext {
    fn session_id(&self) -> &SessionId {
        self.inner.session_id()
    }

    async fn add_message(&self, message: Message) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("add:{}", role_name(&message.role)));
        self.inner.add_message(message).await;
    }

    async fn get_messages(&self) -> Vec<Message> {
        self.inner.get_messages().await
    }

    async fn should_compact(&self) -> bool {
        self.journal.lock().unwrap().push("should_compact".into());
        self.wants_compaction
    }

    async fn compact(&self) {
        self.journal.lock().unwrap().push("compact".into());
        self.compactions.fetch_add(1, Ordering::SeqCst);
    }
}
