//! Configuration resolver — builds the active backend from runtime settings.
//!
//! Exactly one `BackendConfig` and one `Backend` client come out of a
//! resolution, or it fails with a deterministic configuration error before
//! any side effect. No network I/O happens here.

use std::sync::Arc;

use palaver_config::Settings;
use palaver_core::{Backend, BackendConfig, ConfigError, Provider};
use tracing::info;

use crate::anthropic::AnthropicBackend;
use crate::openai_compat::OpenAiCompatBackend;

/// Resolve the provider selection in `settings` into a validated config and
/// the corresponding backend client.
///
/// Adding a provider means one new `Provider` variant plus one arm in each
/// match below.
pub fn resolve(settings: &Settings) -> Result<(BackendConfig, Arc<dyn Backend>), ConfigError> {
    let provider: Provider = settings.provider.parse()?;

    let config = match provider {
        Provider::OpenAi => BackendConfig {
            provider,
            model_name: settings.model_name.clone(),
            api_key: require(&settings.openai_api_key, "openai", "OPENAI_API_KEY")?,
            base_url: None,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        },
        Provider::Anthropic => BackendConfig {
            provider,
            model_name: settings.model_name.clone(),
            api_key: require(&settings.anthropic_api_key, "anthropic", "ANTHROPIC_API_KEY")?,
            base_url: None,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        },
        Provider::OpenRouter => BackendConfig {
            provider,
            // The dedicated override wins over the generic model name.
            model_name: settings
                .openrouter_model
                .clone()
                .unwrap_or_else(|| settings.model_name.clone()),
            api_key: require(&settings.openrouter_api_key, "openrouter", "OPENROUTER_API_KEY")?,
            base_url: None,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        },
        Provider::TogetherAi => BackendConfig {
            provider,
            model_name: settings
                .together_model
                .clone()
                .unwrap_or_else(|| settings.model_name.clone()),
            api_key: require(&settings.together_api_key, "together", "TOGETHER_API_KEY")?,
            base_url: None,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        },
        Provider::SelfHosted => BackendConfig {
            provider,
            model_name: settings.model_name.clone(),
            // Key is optional for self-hosted; empty means no auth header.
            api_key: settings.self_hosted_api_key.clone().unwrap_or_default(),
            base_url: Some(
                settings
                    .self_hosted_model_url
                    .clone()
                    .ok_or(ConfigError::MissingEndpoint)?,
            ),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        },
    };

    let backend: Arc<dyn Backend> = match provider {
        Provider::OpenAi => Arc::new(OpenAiCompatBackend::openai(config.clone())),
        Provider::Anthropic => Arc::new(AnthropicBackend::new(config.clone())),
        Provider::OpenRouter => Arc::new(OpenAiCompatBackend::openrouter(config.clone())),
        Provider::TogetherAi => Arc::new(OpenAiCompatBackend::together(config.clone())),
        Provider::SelfHosted => Arc::new(OpenAiCompatBackend::self_hosted(config.clone())),
    };

    info!(provider = %provider, model = %config.model_name, "resolved active backend");
    Ok((config, backend))
}

fn require(
    value: &Option<String>,
    provider: &'static str,
    variable: &'static str,
) -> Result<String, ConfigError> {
    value
        .clone()
        .ok_or(ConfigError::MissingCredential { provider, variable })
}
