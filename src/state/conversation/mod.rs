mod core;
mod history;
mod state;
mod tools;


pub use history::{BlockRole, Conversation, ConversationBlock};
pub use state::{
    ConfirmationGate, ConversationEngine, EngineEvent, EventSink, TurnError, TurnOptions,
};
pub use tools::{ToolOutcome, ToolPipeline};
