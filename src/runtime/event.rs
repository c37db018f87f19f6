use crate::state::{Message, TokenUsage};
use serde_json::Value;
use tokio::sync::oneshot;

/// A tool call waiting for the user's decision. Dropping it without an answer
/// counts as a denial.
#[derive(Debug)]
pub struct ToolApprovalRequest {
    pub tool_name: String,
    pub arguments: Value,
    reply: oneshot::Sender<bool>,
}

impl ToolApprovalRequest {
    pub fn new(
        tool_name: impl Into<String>,
        arguments: Value,
        reply: oneshot::Sender<bool>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            reply,
        }
    }

    pub fn respond(self, approved: bool) {
        if self.reply.send(approved).is_err() {
            tracing::debug!(tool = %self.tool_name, "confirmation answered after the turn stopped waiting");
        }
    }
}

/// Every terminal variant carries the engine's token totals as of the end of
/// the turn.
#[derive(Debug)]
pub enum StreamEvent {
    TextChunk(String),
    ToolMessage(Message),
    ThoughtMessage(Message),
    ConfirmationRequest(ToolApprovalRequest),
    Complete {
        messages: Vec<Message>,
        usage: TokenUsage,
    },
    Error {
        message: String,
        usage: TokenUsage,
    },
    Cancelled {
        usage: TokenUsage,
    },
}

impl StreamEvent {
    /// Exactly one terminal event closes every turn.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Complete { .. }
                | StreamEvent::Error { .. }
                | StreamEvent::Cancelled { .. }
        )
    }
}

/// A stream event tagged with the turn that produced it.
#[derive(Debug)]
pub struct TurnEvent {
    pub turn_id: u64,
    pub event: StreamEvent,
}
