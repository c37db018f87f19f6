use serde_json::Value;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::util::env_flag;

const DEFAULT_LOG_FILE: &str = "cli-agent.log";
const DEBUG_PAYLOAD_ENV: &str = "AGENT_DEBUG_PAYLOAD";
const LOG_PATH_ENV: &str = "AGENT_LOG_PATH";
const LOG_FILTER_ENV: &str = "AGENT_LOG";

/// Routes `tracing` output to a log file, since the terminal belongs to the
/// TUI. Returns the path in use, or `None` when the file could not be opened
/// or a subscriber was already installed.
pub fn init_file_logging() -> Option<PathBuf> {
    let path = resolve_log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .ok()?;
    Some(path)
}

pub fn debug_payload_enabled() -> bool {
    env_flag(DEBUG_PAYLOAD_ENV)
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    tracing::debug!(url = request_url, "request payload\n{formatted_payload}");
}

pub fn emit_sse_parse_error(json_data: &str, parse_error: &serde_json::Error) {
    tracing::warn!(error = %parse_error, "sse frame skipped: {json_data}");
}

fn resolve_log_path() -> PathBuf {
    std::env::var(LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_FILE))
}
