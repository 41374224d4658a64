//! Model configuration from the environment.
//!
//! Read once at startup (after `.env` loading when the `openai` feature is
//! on) and passed down explicitly; nothing in the workflow reads the
//! environment behind the caller's back.

use std::env;

/// Chat-model settings for the real-model path.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Model name (`OPENAI_MODEL`, default `gpt-4o-mini`).
    pub model: String,
    /// Sampling temperature (`OPENAI_TEMPERATURE`, default 0.0).
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
        }
    }
}

impl ModelConfig {
    /// Loads the config from the environment, falling back to defaults for
    /// missing or malformed values.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            model: env::var("OPENAI_MODEL").unwrap_or(default.model),
            temperature: env::var("OPENAI_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.temperature),
        }
    }
}
