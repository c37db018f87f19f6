mod builtin;
mod executor;
mod registry;
mod shell;

pub use builtin::builtin_registry;
pub use executor::ToolExecutor;
pub use registry::{ToolDefinition, ToolFn, ToolRegistry};
