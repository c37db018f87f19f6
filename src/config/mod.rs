mod preferences;

pub use preferences::Preferences;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::util::{env_override_u64, is_local_endpoint_url};

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TURN_TIMEOUT_SECS: u64 = 300;
const DEFAULT_CONFIRM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_TOOL_ROUNDS: u64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    /// `GOOGLE_MODEL`, when set, wins over the saved preference.
    pub model_override: Option<String>,
    pub api_url: String,
    pub working_dir: PathBuf,
    pub limits: TurnLimits,
}

/// Time and round bounds applied to every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnLimits {
    pub tool_timeout: Duration,
    pub turn_timeout: Duration,
    pub confirm_timeout: Duration,
    pub max_tool_rounds: usize,
}

impl Default for TurnLimits {
    fn default() -> Self {
        Self {
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            turn_timeout: Duration::from_secs(DEFAULT_TURN_TIMEOUT_SECS),
            confirm_timeout: Duration::from_secs(DEFAULT_CONFIRM_TIMEOUT_SECS),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS as usize,
        }
    }
}

impl TurnLimits {
    pub fn from_env() -> Self {
        Self {
            tool_timeout: Duration::from_secs(env_override_u64(
                "AGENT_TOOL_TIMEOUT_SECS",
                DEFAULT_TOOL_TIMEOUT_SECS,
                1,
                3600,
            )),
            turn_timeout: Duration::from_secs(env_override_u64(
                "AGENT_TURN_TIMEOUT_SECS",
                DEFAULT_TURN_TIMEOUT_SECS,
                10,
                7200,
            )),
            confirm_timeout: Duration::from_secs(env_override_u64(
                "AGENT_CONFIRM_TIMEOUT_SECS",
                DEFAULT_CONFIRM_TIMEOUT_SECS,
                1,
                3600,
            )),
            max_tool_rounds: env_override_u64(
                "AGENT_MAX_TOOL_ROUNDS",
                DEFAULT_MAX_TOOL_ROUNDS,
                1,
                200,
            ) as usize,
        }
    }
}

/// Sampling parameters sent with each model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub thinking: bool,
    /// `-1` lets the model size its own reasoning budget.
    pub thinking_budget: i32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_output_tokens: 8192,
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            thinking: false,
            thinking_budget: -1,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let api_url = std::env::var("GOOGLE_API_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_key = std::env::var("GOOGLE_API_KEY").ok().and_then(|v| {
            if v.trim().is_empty() {
                None
            } else {
                Some(v.trim().to_string())
            }
        });
        let model_override = std::env::var("GOOGLE_MODEL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            api_key,
            model_override,
            api_url,
            working_dir: std::env::current_dir()?,
            limits: TurnLimits::from_env(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!(
                "Invalid GOOGLE_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if !self.is_local_endpoint() && self.api_key.is_none() {
            bail!(
                "GOOGLE_API_KEY must be set for non-local endpoints (url: '{}')",
                self.api_url
            );
        }

        Ok(())
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }

    /// Model for the first turn: the environment override, else the saved choice.
    pub fn initial_model(&self, preferences: &Preferences) -> String {
        self.model_override
            .clone()
            .unwrap_or_else(|| preferences.selected_model.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScopedEnv;

    #[test]
    fn test_load_uses_defaults_without_overrides() {
        let mut env = ScopedEnv::new();
        env.unset("GOOGLE_API_URL")
            .unset("GOOGLE_MODEL")
            .unset("AGENT_TURN_TIMEOUT_SECS")
            .unset("AGENT_CONFIRM_TIMEOUT_SECS");

        let config = Config::load().expect("load config");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model_override, None);
        assert_eq!(config.initial_model(&Preferences::default()), DEFAULT_MODEL);
        assert_eq!(config.limits.turn_timeout, Duration::from_secs(300));
        assert_eq!(config.limits.confirm_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_load_trims_trailing_slash_from_api_url() {
        let mut env = ScopedEnv::new();
        env.set("GOOGLE_API_URL", "http://localhost:9000/v1beta/");
        let config = Config::load().expect("load config");

        assert_eq!(config.api_url, "http://localhost:9000/v1beta");
        assert!(config.is_local_endpoint());
    }

    #[test]
    fn test_model_override_beats_saved_preference() {
        let mut env = ScopedEnv::new();
        env.set("GOOGLE_MODEL", " gemini-2.0-flash ");
        let config = Config::load().expect("load config");

        let prefs = Preferences {
            selected_model: "gemini-2.5-pro".to_string(),
            ..Preferences::default()
        };
        assert_eq!(config.initial_model(&prefs), "gemini-2.0-flash");
    }

    #[test]
    fn test_turn_limits_are_clamped() {
        let mut env = ScopedEnv::new();
        env.set("AGENT_MAX_TOOL_ROUNDS", "0")
            .set("AGENT_TOOL_TIMEOUT_SECS", "5");
        let limits = TurnLimits::from_env();
        assert_eq!(limits.max_tool_rounds, 1);
        assert_eq!(limits.tool_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_generation_defaults() {
        let options = GenerationOptions::default();
        assert_eq!(options.max_output_tokens, 8192);
        assert_eq!(options.top_k, 40);
        assert_eq!(options.thinking_budget, -1);
        assert!(!options.thinking);
    }
}
