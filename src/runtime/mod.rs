pub mod bridge;
pub mod context;
pub mod event;
pub mod frontend;
pub mod r#loop;
pub mod mode;

pub use bridge::{StreamingBridge, EVENT_QUEUE_CAPACITY};
pub use context::RuntimeContext;
pub use event::{StreamEvent, ToolApprovalRequest, TurnEvent};
pub use frontend::{FrontendAdapter, ScrollAction, UserInputEvent};
pub use mode::RuntimeMode;
pub use r#loop::Runtime;
