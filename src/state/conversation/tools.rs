use super::state::ConfirmationGate;
use crate::state::Message;
use crate::tools::ToolRegistry;
use crate::types::Part;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DENIED_BY_USER: &str = "User denied execution";

/// How one tool call ended. Every variant still produces a function response
/// for the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Completed(String),
    Failed(String),
    /// Not executed. Carries the reason shown to the user.
    Denied(String),
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        !matches!(self, ToolOutcome::Completed(_))
    }

    pub fn response_payload(&self) -> Value {
        match self {
            ToolOutcome::Completed(result) => json!({ "result": result }),
            ToolOutcome::Failed(error) => json!({ "error": error }),
            ToolOutcome::Denied(reason) if reason == DENIED_BY_USER => {
                json!({ "error": "User denied tool execution" })
            }
            ToolOutcome::Denied(reason) => {
                json!({ "error": format!("Tool execution not confirmed: {reason}") })
            }
        }
    }

    pub fn transcript_message(&self, name: &str, args: &Value) -> Message {
        let args = serde_json::to_string(args).unwrap_or_else(|_| args.to_string());
        let content = match self {
            ToolOutcome::Completed(result) => {
                format!("🔧 Tool Call: {name}\nArguments: {args}\nResult: {result}")
            }
            ToolOutcome::Failed(error) => {
                format!("🔧 Tool Call: {name}\nArguments: {args}\nError: {error}")
            }
            ToolOutcome::Denied(reason) => {
                format!("🚫 Tool Call Rejected: {name}\nArguments: {args}\nReason: {reason}")
            }
        };
        Message::tool(content, self.is_error())
    }
}

/// Lookup, confirmation and guarded execution of a single tool call.
pub struct ToolPipeline<'a> {
    registry: &'a ToolRegistry,
    tool_timeout: Duration,
}

impl<'a> ToolPipeline<'a> {
    pub fn new(registry: &'a ToolRegistry, tool_timeout: Duration) -> Self {
        Self {
            registry,
            tool_timeout,
        }
    }

    pub async fn execute(
        &self,
        name: &str,
        args: &Value,
        gate: Option<&dyn ConfirmationGate>,
        cancel: &CancellationToken,
    ) -> ToolOutcome {
        let Some(tool) = self.registry.get(name).cloned() else {
            return ToolOutcome::Failed(format!("tool {name} not found"));
        };

        if let Some(gate) = gate {
            match gate.confirm(name, args).await {
                Ok(true) => {}
                Ok(false) => return ToolOutcome::Denied(DENIED_BY_USER.to_string()),
                Err(error) => return ToolOutcome::Denied(format!("{error:#}")),
            }
        }

        if cancel.is_cancelled() {
            return ToolOutcome::Failed("cancelled before execution".to_string());
        }

        tracing::debug!(tool = name, "executing tool");
        let tool_cancel = cancel.child_token();
        let _cancel_on_exit = tool_cancel.clone().drop_guard();
        let task_cancel = tool_cancel.clone();
        let task_args = args.clone();
        let mut task =
            tokio::task::spawn_blocking(move || tool.invoke(&task_cancel, &task_args));

        match tokio::time::timeout(self.tool_timeout, &mut task).await {
            Ok(Ok(Ok(output))) => ToolOutcome::Completed(output),
            Ok(Ok(Err(error))) => ToolOutcome::Failed(format!("{error:#}")),
            Ok(Err(join_error)) => {
                ToolOutcome::Failed(format!("Tool execution task failed for {name}: {join_error}"))
            }
            Err(_) => {
                tool_cancel.cancel();
                task.abort();
                ToolOutcome::Failed(format!(
                    "Tool execution timed out after {}s for {name}",
                    self.tool_timeout.as_secs_f32()
                ))
            }
        }
    }
}

pub(super) fn function_response_part(name: &str, outcome: &ToolOutcome) -> Part {
    Part::function_response(name, outcome.response_payload())
}

/// Identity of a call for de-duplication: name plus arguments serialized with
/// object keys sorted at every depth.
pub(super) fn dedup_key(name: &str, args: &Value) -> String {
    format!("{name}:{}", canonicalize(args))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key.clone(), canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
