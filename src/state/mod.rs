pub mod conversation;
mod message;

pub use conversation::{
    BlockRole, ConfirmationGate, Conversation, ConversationBlock, ConversationEngine,
    EngineEvent, EventSink, ToolOutcome, ToolPipeline, TurnError, TurnOptions,
};
pub use message::{Message, MessageKind, TokenUsage};
