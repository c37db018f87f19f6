//! Models offered in the selection overlay.

pub const AVAILABLE_MODELS: &[&str] = &[
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
];

const THINKING_MODELS: &[&str] = &["gemini-2.5-pro", "gemini-2.5-flash", "gemini-2.5-flash-lite"];

pub fn supports_thinking(model: &str) -> bool {
    THINKING_MODELS.contains(&model)
}

/// Position of `model` in the catalog, or 0 for unknown names.
pub fn model_index(model: &str) -> usize {
    AVAILABLE_MODELS
        .iter()
        .position(|candidate| *candidate == model)
        .unwrap_or(0)
}
