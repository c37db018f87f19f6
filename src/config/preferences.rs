use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::DEFAULT_MODEL;

const APP_DIR: &str = "cli-agent";
const PREFERENCES_FILE: &str = "preferences.json";

/// User choices that survive restarts. Missing fields fall back to defaults so
/// older files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub selected_model: String,
    pub require_tool_confirmation: bool,
    pub enable_thinking_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            selected_model: DEFAULT_MODEL.to_string(),
            require_tool_confirmation: true,
            enable_thinking_mode: false,
        }
    }
}

impl Preferences {
    pub fn default_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join(APP_DIR).join(PREFERENCES_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preferences {}", path.display()))?;
        let mut prefs: Preferences = serde_json::from_str(&content)
            .with_context(|| format!("Malformed preferences file {}", path.display()))?;
        if prefs.selected_model.trim().is_empty() {
            prefs.selected_model = DEFAULT_MODEL.to_string();
        }
        Ok(prefs)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write preferences {}", path.display()))
    }
}
