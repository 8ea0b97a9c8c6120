//! Context trait: the owner of a session's message history.
//!
//! The orchestrator appends to and reads from the context, and asks it
//! whether the history should be compacted. How compaction works is the
//! context's business; the loop only triggers it.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::message::{Conversation, Message, Role, SessionId};

/// The context collaborator consumed by the orchestration loop.
#[async_trait]
pub trait ContextManager: Send + Sync {
    /// The session this history belongs to.
    fn session_id(&self) -> &SessionId;

    /// Append a message. Order is significant and append-only.
    async fn add_message(&self, message: Message);

    /// The full ordered message history.
    async fn get_messages(&self) -> Vec<Message>;

    /// Whether the history has grown enough to warrant compaction.
    async fn should_compact(&self) -> bool;

    /// Compact the history.
    async fn compact(&self);
}

/// When an [`InMemoryContext`] compacts and how much it keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionPolicy {
    /// Compact once the history holds more than this many messages.
    pub max_messages: usize,

    /// Number of most recent messages kept after compaction
    /// (in addition to the leading system/user messages).
    pub keep_recent: usize,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            max_messages: 200,
            keep_recent: 50,
        }
    }
}

/// A context that stores the conversation in memory.
/// Useful for testing and sessions where persistence isn't needed.
pub struct InMemoryContext {
    session_id: SessionId,
    conversation: RwLock<Conversation>,
    policy: Option<CompactionPolicy>,
    compactions: AtomicUsize,
}

impl InMemoryContext {
    /// A context that never asks for compaction.
    pub fn new() -> Self {
        Self::for_session(SessionId::new())
    }

    pub fn for_session(session_id: SessionId) -> Self {
        Self {
            conversation: RwLock::new(Conversation::with_id(session_id.clone())),
            session_id,
            policy: None,
            compactions: AtomicUsize::new(0),
        }
    }

    /// Enable compaction with the given policy.
    pub fn with_compaction(mut self, policy: CompactionPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// How many times `compact()` has run.
    pub fn compaction_count(&self) -> usize {
        self.compactions.load(Ordering::Relaxed)
    }

    /// Drop the whole history, keeping the session id.
    pub async fn reset(&self) {
        let mut conversation = self.conversation.write().await;
        *conversation = Conversation::with_id(self.session_id.clone());
    }
}

impl Default for InMemoryContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextManager for InMemoryContext {
    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    async fn add_message(&self, message: Message) {
        self.conversation.write().await.push(message);
    }

    async fn get_messages(&self) -> Vec<Message> {
        self.conversation.read().await.messages.clone()
    }

    async fn should_compact(&self) -> bool {
        let Some(policy) = self.policy else {
            return false;
        };
        self.conversation.read().await.messages.len() > policy.max_messages
    }

    async fn compact(&self) {
        let keep_recent = self.policy.unwrap_or_default().keep_recent;
        let mut conversation = self.conversation.write().await;
        let before = conversation.messages.len();
        conversation.messages = compacted(&conversation.messages, keep_recent);
        self.compactions.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = %self.session_id,
            before = before,
            after = conversation.messages.len(),
            "Compacted in-memory context"
        );
    }
}

/// Keep the leading messages up to and including the first user message,
/// plus the most recent `keep_recent` messages. The kept tail never starts
/// on a tool-role message, which would orphan it from the assistant turn
/// that requested it.
fn compacted(messages: &[Message], keep_recent: usize) -> Vec<Message> {
    let head_end = messages
        .iter()
        .position(|m| m.role == Role::User)
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut tail_start = messages.len().saturating_sub(keep_recent).max(head_end);
    while tail_start < messages.len() && messages[tail_start].role == Role::Tool {
        tail_start += 1;
    }

    messages[..head_end]
        .iter()
        .chain(messages[tail_start..].iter())
        .cloned()
        .collect()
}
