use super::history::Conversation;
use crate::api::ApiClient;
use crate::config::{GenerationOptions, TurnLimits};
use crate::state::{Message, TokenUsage};
use crate::tools::ToolRegistry;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Incremental output of a running turn, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Text(String),
    Tool(Message),
    Thought(Message),
}

/// Receives engine output while a turn runs. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Interactive approval guarding tool execution. `Ok(false)` and `Err(_)`
/// both mean the call must not run.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, tool_name: &str, arguments: &Value) -> anyhow::Result<bool>;
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("{0}")]
    Transport(String),
    #[error("model returned an empty response{}", blocked_suffix(.0))]
    EmptyResponse(Option<String>),
    #[error("turn cancelled")]
    Cancelled,
    #[error("turn timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

fn blocked_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|reason| format!(" (prompt blocked: {reason})"))
        .unwrap_or_default()
}

impl TurnError {
    pub(super) fn transport(error: anyhow::Error) -> Self {
        TurnError::Transport(format!("{error:#}"))
    }
}

/// Per-turn settings chosen by the caller.
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    pub generation: GenerationOptions,
    pub limits: TurnLimits,
}

/// Owns the conversation, the token counters and the active model.
///
/// Exactly one turn may run at a time; `process_turn` takes `&mut self`, so a
/// caller sharing the engine must hold its lock for the whole turn.
pub struct ConversationEngine {
    pub(super) client: Arc<ApiClient>,
    pub(super) registry: Arc<ToolRegistry>,
    pub(super) conversation: Conversation,
    pub(super) usage: TokenUsage,
    pub(super) model: String,
}

impl ConversationEngine {
    pub fn new(client: ApiClient, registry: ToolRegistry, model: impl Into<String>) -> Self {
        Self {
            client: Arc::new(client),
            registry: Arc::new(registry),
            conversation: Conversation::default(),
            usage: TokenUsage::default(),
            model: model.into(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Forgets the conversation. Token counters keep their totals.
    pub fn clear(&mut self) {
        self.conversation.clear();
    }
}
