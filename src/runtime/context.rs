use super::bridge::StreamingBridge;
use crate::config::{GenerationOptions, Preferences};
use std::path::Path;

/// Borrowed per-tick context passed into every `RuntimeMode` callback.
pub struct RuntimeContext<'a> {
    pub bridge: &'a mut StreamingBridge,
    /// Where toggled preferences are written. `None` keeps them in memory.
    pub preferences_path: Option<&'a Path>,
}

impl<'a> RuntimeContext<'a> {
    pub fn new(bridge: &'a mut StreamingBridge, preferences_path: Option<&'a Path>) -> Self {
        Self {
            bridge,
            preferences_path,
        }
    }

    /// Dispatches a user turn and returns the id its events will carry.
    pub fn start_turn(
        &mut self,
        input: String,
        generation: GenerationOptions,
        require_confirmation: bool,
    ) -> u64 {
        self.bridge
            .start_turn(input, generation, require_confirmation)
    }

    pub fn cancel_turn(&mut self) {
        self.bridge.cancel();
    }

    pub fn set_model(&mut self, model: &str) {
        self.bridge.set_model(model.to_string());
    }

    pub fn clear_conversation(&mut self) {
        self.bridge.clear();
    }

    /// Failures are logged; the in-memory choice still applies.
    pub fn save_preferences(&self, preferences: &Preferences) {
        let Some(path) = self.preferences_path else {
            return;
        };
        if let Err(error) = preferences.save_to(path) {
            tracing::warn!(path = %path.display(), error = %format!("{error:#}"), "failed to save preferences");
        }
    }
}
