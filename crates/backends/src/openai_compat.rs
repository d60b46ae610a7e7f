//! OpenAI-compatible backend.
//!
//! OpenAI, OpenRouter, Together AI, and self-hosted deployments all speak
//! the same chat-completion wire shape (`choices[0].message.content`,
//! `usage.total_tokens`); they differ only in endpoint, auth headers, and
//! how strictly the usage block can be relied on. One client covers all
//! four, parameterized by the constructors below.

use async_trait::async_trait;
use palaver_core::{
    Backend, BackendConfig, BackendError, ChatMessage, ConversationContext, NormalizedResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::wire;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai";
const TOGETHER_BASE_URL: &str = "https://api.together.xyz";

/// An OpenAI-compatible chat backend.
#[derive(Debug)]
pub struct OpenAiCompatBackend {
    name: &'static str,
    url: String,
    api_key: Option<String>,
    extra_headers: Vec<(&'static str, String)>,
    config: BackendConfig,
    client: reqwest::Client,
}

impl OpenAiCompatBackend {
    fn build(
        name: &'static str,
        url: String,
        api_key: Option<String>,
        extra_headers: Vec<(&'static str, String)>,
        config: BackendConfig,
    ) -> Self {
        // The client session is owned by this backend; reqwest releases the
        // connection on every exit path when the backend drops.
        let client = reqwest::Client::new();
        Self {
            name,
            url,
            api_key,
            extra_headers,
            config,
            client,
        }
    }

    /// OpenAI's hosted endpoint.
    pub fn openai(config: BackendConfig) -> Self {
        let base = trimmed_base(&config, OPENAI_BASE_URL);
        let key = config.api_key.clone();
        Self::build(
            "openai",
            format!("{base}/v1/chat/completions"),
            Some(key),
            Vec::new(),
            config,
        )
    }

    /// OpenRouter. Sends the referer headers the service expects.
    pub fn openrouter(config: BackendConfig) -> Self {
        let base = trimmed_base(&config, OPENROUTER_BASE_URL);
        let key = config.api_key.clone();
        Self::build(
            "openrouter",
            format!("{base}/api/v1/chat/completions"),
            Some(key),
            vec![
                ("HTTP-Referer", "https://github.com/palaver-gw/palaver".into()),
                ("X-Title", "Palaver Gateway".into()),
            ],
            config,
        )
    }

    /// Together AI.
    pub fn together(config: BackendConfig) -> Self {
        let base = trimmed_base(&config, TOGETHER_BASE_URL);
        let key = config.api_key.clone();
        Self::build(
            "together",
            format!("{base}/v1/chat/completions"),
            Some(key),
            Vec::new(),
            config,
        )
    }

    /// A self-hosted deployment. Posts to the configured URL verbatim; the
    /// auth header is omitted when no key is configured, and a missing usage
    /// block counts as zero tokens.
    pub fn self_hosted(config: BackendConfig) -> Self {
        let url = config
            .base_url
            .clone()
            .unwrap_or_default();
        let key = Some(config.api_key.clone()).filter(|k| !k.is_empty());
        Self::build("self-hosted", url, key, Vec::new(), config)
    }
}

fn trimmed_base(config: &BackendConfig, default: &str) -> String {
    config
        .base_url
        .as_deref()
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

#[async_trait]
impl Backend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        self.name
    }

    async fn complete(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> std::result::Result<NormalizedResponse, BackendError> {
        let messages = context.request_messages(message);
        let body = ChatRequest {
            model: &self.config.model_name,
            messages: &messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(
            backend = self.name,
            model = %self.config.model_name,
            turns = messages.len(),
            "sending chat completion request"
        );

        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        for (header, value) in &self.extra_headers {
            request = request.header(*header, value);
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| wire::network_error(self.name, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| wire::network_error(self.name, e))?;

        if !status.is_success() {
            warn!(backend = self.name, status = status.as_u16(), "chat completion failed");
            return Err(wire::api_error(self.name, status.as_u16(), &text));
        }

        let (content, token_count) =
            parse_chat_response(&text).map_err(|m| BackendError::new(self.name, m))?;

        Ok(NormalizedResponse {
            content,
            model_name: self.config.model_name.clone(),
            token_count,
            // Authoritative latency is measured by the orchestrator.
            latency_ms: 0.0,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    #[serde(default)]
    total_tokens: u32,
}

/// Extract assistant text and token usage from a 2xx chat-completion body.
/// A missing usage block counts as zero tokens.
fn parse_chat_response(body: &str) -> std::result::Result<(String, u32), String> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| format!("failed to parse response: {e}"))?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| "no choices in response".to_string())?;
    let tokens = response.usage.map(|u| u.total_tokens).unwrap_or(0);
    Ok((choice.message.content.unwrap_or_default(), tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_core::{ConversationTurn, Provider};

    fn config(provider: Provider) -> BackendConfig {
        BackendConfig {
            provider,
            model_name: "gpt-4".into(),
            api_key: "sk-test".into(),
            base_url: None,
            max_tokens: 4000,
            temperature: 0.7,
        }
    }

    #[test]
    fn openai_posts_to_chat_completions() {
        let backend = OpenAiCompatBackend::openai(config(Provider::OpenAi));
        assert_eq!(backend.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(backend.name(), "openai");
    }

    #[test]
    fn openrouter_uses_api_prefix_and_referer_headers() {
        let backend = OpenAiCompatBackend::openrouter(config(Provider::OpenRouter));
        assert_eq!(backend.url, "https://openrouter.ai/api/v1/chat/completions");
        assert!(backend.extra_headers.iter().any(|(h, _)| *h == "HTTP-Referer"));
        assert!(backend.extra_headers.iter().any(|(h, _)| *h == "X-Title"));
    }

    #[test]
    fn together_endpoint() {
        let backend = OpenAiCompatBackend::together(config(Provider::TogetherAi));
        assert_eq!(backend.url, "https://api.together.xyz/v1/chat/completions");
    }

    #[test]
    fn base_url_override_is_respected() {
        let mut cfg = config(Provider::OpenAi);
        cfg.base_url = Some("http://localhost:8000/".into());
        let backend = OpenAiCompatBackend::openai(cfg);
        assert_eq!(backend.url, "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn self_hosted_uses_configured_url_verbatim() {
        let mut cfg = config(Provider::SelfHosted);
        cfg.base_url = Some("http://llm.internal:8080/generate".into());
        let backend = OpenAiCompatBackend::self_hosted(cfg);
        assert_eq!(backend.url, "http://llm.internal:8080/generate");
    }

    #[test]
    fn self_hosted_without_key_sends_no_auth() {
        let mut cfg = config(Provider::SelfHosted);
        cfg.api_key = String::new();
        cfg.base_url = Some("http://llm.internal:8080".into());
        let backend = OpenAiCompatBackend::self_hosted(cfg);
        assert!(backend.api_key.is_none());
    }

    #[test]
    fn request_body_carries_model_and_sampling_parameters() {
        let messages = vec![ChatMessage {
            role: palaver_core::Role::User,
            content: "Hello".into(),
        }];
        let body = ChatRequest {
            model: "gpt-4",
            messages: &messages,
            max_tokens: 4000,
            temperature: 0.7,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["max_tokens"], 4000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hello");
    }

    #[test]
    fn request_body_windows_long_histories() {
        let mut ctx = ConversationContext::new("u", "c");
        for i in 0..30 {
            ctx.push(ConversationTurn::user(format!("turn {i}")));
        }
        let messages = ctx.request_messages("Hello");
        let json = serde_json::to_value(ChatRequest {
            model: "gpt-4",
            messages: &messages,
            max_tokens: 100,
            temperature: 0.0,
        })
        .unwrap();
        let wire_messages = json["messages"].as_array().unwrap();
        assert_eq!(wire_messages.len(), 11);
        assert_eq!(wire_messages[0]["content"], "turn 20");
        assert_eq!(wire_messages[10]["content"], "Hello");
    }

    #[test]
    fn parses_content_and_total_tokens() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Hi there"}}],
            "usage": {"prompt_tokens": 8, "completion_tokens": 4, "total_tokens": 12}
        }"#;
        let (content, tokens) = parse_chat_response(body).unwrap();
        assert_eq!(content, "Hi there");
        assert_eq!(tokens, 12);
    }

    #[test]
    fn missing_usage_counts_as_zero() {
        let body = r#"{"choices": [{"message": {"content": "ok"}}]}"#;
        let (content, tokens) = parse_chat_response(body).unwrap();
        assert_eq!(content, "ok");
        assert_eq!(tokens, 0);
    }

    #[test]
    fn empty_choices_is_an_error() {
        let err = parse_chat_response(r#"{"choices": []}"#).unwrap_err();
        assert!(err.contains("no choices"));
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(parse_chat_response("<html></html>").is_err());
    }
}
