//! Backend trait — the abstraction over LLM providers.
//!
//! A `Backend` knows how to translate a message plus conversation context
//! into one provider's wire format, perform the HTTP call, and normalize
//! the response. The orchestrator calls `complete()` without knowing which
//! provider is active.
//!
//! Implementations: OpenAI, Anthropic, OpenRouter, Together AI, self-hosted.

use crate::context::ConversationContext;
use crate::error::{BackendError, ConfigError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The closed set of supported providers.
///
/// Adding a provider means one new variant here plus one new arm in the
/// resolver's match — never open-ended dynamic lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "together")]
    TogetherAi,
    #[serde(rename = "self-hosted")]
    SelfHosted,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::OpenRouter => "openrouter",
            Provider::TogetherAi => "together",
            Provider::SelfHosted => "self-hosted",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "openrouter" => Ok(Provider::OpenRouter),
            "together" => Ok(Provider::TogetherAi),
            "self-hosted" => Ok(Provider::SelfHosted),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A validated backend selection. Immutable once constructed; exactly one
/// is active per orchestrator instance at a time.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub provider: Provider,
    pub model_name: String,
    /// Empty only for the self-hosted provider.
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("model_name", &self.model_name)
            .field(
                "api_key",
                &if self.api_key.is_empty() { "" } else { "[REDACTED]" },
            )
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// The backend-agnostic result returned to the caller after translating a
/// provider-specific response.
///
/// Backends leave `latency_ms` at zero — the orchestrator's wall-clock
/// measurement around the call is the authoritative figure and overwrites it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResponse {
    pub content: String,
    pub model_name: String,
    pub token_count: u32,
    pub latency_ms: f64,
}

/// The core Backend trait.
#[async_trait]
pub trait Backend: std::fmt::Debug + Send + Sync {
    /// The provider name (e.g., "openai", "anthropic").
    fn name(&self) -> &str;

    /// Send one chat request carrying the windowed conversation context and
    /// return the normalized response. One HTTP POST per call, no retries.
    async fn complete(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> std::result::Result<NormalizedResponse, BackendError>;
}
