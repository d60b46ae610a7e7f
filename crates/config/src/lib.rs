//! Runtime settings for Palaver.
//!
//! Settings are read from the environment exactly once at process start into
//! an explicit `Settings` struct and passed by reference from there on —
//! there is no global mutable configuration state. Resolution into an active
//! backend happens in `palaver-backends`.

use palaver_core::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The recognized runtime settings.
///
/// Optional string fields are `None` when the corresponding variable is
/// unset or empty — providers treat an empty credential the same as a
/// missing one.
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Provider identifier: openai | anthropic | openrouter | together | self-hosted.
    pub provider: String,
    pub model_name: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    /// Takes precedence over `model_name` when the provider is openrouter.
    pub openrouter_model: Option<String>,
    pub together_api_key: Option<String>,
    /// Takes precedence over `model_name` when the provider is together.
    pub together_model: Option<String>,
    pub self_hosted_model_url: Option<String>,
    pub self_hosted_api_key: Option<String>,
}

impl Settings {
    /// Read settings from the process environment. Call once at startup.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. This is the seam tests
    /// use so they never mutate the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let max_tokens = match var("MAX_TOKENS").map(|v| v.parse::<u32>()) {
            Some(Ok(n)) if n > 0 => n,
            Some(_) => {
                warn!("MAX_TOKENS is not a positive integer, using default");
                DEFAULT_MAX_TOKENS
            }
            None => DEFAULT_MAX_TOKENS,
        };

        let temperature = match var("TEMPERATURE").map(|v| v.parse::<f32>()) {
            Some(Ok(t)) => t.clamp(0.0, 2.0),
            Some(Err(_)) => {
                warn!("TEMPERATURE is not a number, using default");
                DEFAULT_TEMPERATURE
            }
            None => DEFAULT_TEMPERATURE,
        };

        Self {
            provider: var("MODEL_PROVIDER").unwrap_or_else(|| "openai".into()),
            model_name: var("MODEL_NAME").unwrap_or_else(|| "gpt-4".into()),
            max_tokens,
            temperature,
            openai_api_key: var("OPENAI_API_KEY"),
            anthropic_api_key: var("ANTHROPIC_API_KEY"),
            openrouter_api_key: var("OPENROUTER_API_KEY"),
            openrouter_model: var("OPENROUTER_MODEL"),
            together_api_key: var("TOGETHER_API_KEY"),
            together_model: var("TOGETHER_MODEL"),
            self_hosted_model_url: var("SELF_HOSTED_MODEL_URL"),
            self_hosted_api_key: var("SELF_HOSTED_API_KEY"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn redact(value: &Option<String>) -> &'static str {
    match value {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("provider", &self.provider)
            .field("model_name", &self.model_name)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("openrouter_api_key", &redact(&self.openrouter_api_key))
            .field("openrouter_model", &self.openrouter_model)
            .field("together_api_key", &redact(&self.together_api_key))
            .field("together_model", &self.together_model)
            .field("self_hosted_model_url", &self.self_hosted_model_url)
            .field("self_hosted_api_key", &redact(&self.self_hosted_api_key))
            .finish()
    }
}
