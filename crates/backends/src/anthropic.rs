//! Anthropic native backend.
//!
//! Uses Anthropic's Messages API directly:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as a top-level field, never inside the messages array
//! - Response text in `content[0].text`, usage split into
//!   `input_tokens` + `output_tokens`

use async_trait::async_trait;
use palaver_core::{
    Backend, BackendConfig, BackendError, ChatMessage, ConversationContext, NormalizedResponse,
    Role,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::wire;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

#[derive(Debug)]
pub struct AnthropicBackend {
    url: String,
    config: BackendConfig,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(config: BackendConfig) -> Self {
        let base = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        Self {
            url: format!("{base}/v1/messages"),
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Backend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> std::result::Result<NormalizedResponse, BackendError> {
        let (system, messages) = split_system(context.request_messages(message));
        let body = build_request_body(&self.config, system.as_deref(), &messages);

        debug!(
            backend = "anthropic",
            model = %self.config.model_name,
            turns = messages.len(),
            "sending messages request"
        );

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| wire::network_error("anthropic", e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| wire::network_error("anthropic", e))?;

        if !status.is_success() {
            warn!(backend = "anthropic", status = status.as_u16(), "messages request failed");
            return Err(wire::api_error("anthropic", status.as_u16(), &text));
        }

        let (content, token_count) =
            parse_messages_response(&text).map_err(|m| BackendError::new("anthropic", m))?;

        Ok(NormalizedResponse {
            content,
            model_name: self.config.model_name.clone(),
            token_count,
            latency_ms: 0.0,
        })
    }
}

/// Lift system turns out of the message list. Anthropic carries the system
/// prompt as a top-level field; the messages array holds only user and
/// assistant roles.
fn split_system(messages: Vec<ChatMessage>) -> (Option<String>, Vec<ChatMessage>) {
    let mut system_parts: Vec<String> = Vec::new();
    let mut rest = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            Role::System => system_parts.push(message.content),
            _ => rest.push(message),
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, rest)
}

fn build_request_body(
    config: &BackendConfig,
    system: Option<&str>,
    messages: &[ChatMessage],
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": config.model_name,
        "messages": messages,
        "max_tokens": config.max_tokens,
        "temperature": config.temperature,
    });
    if let Some(system) = system {
        body["system"] = serde_json::json!(system);
    }
    body
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Extract assistant text and token usage from a 2xx Messages API body.
/// Token count is the sum of input and output tokens.
fn parse_messages_response(body: &str) -> std::result::Result<(String, u32), String> {
    let response: MessagesResponse =
        serde_json::from_str(body).map_err(|e| format!("failed to parse response: {e}"))?;
    let content = response
        .content
        .first()
        .and_then(|block| block.text.clone())
        .ok_or_else(|| "no text content in response".to_string())?;
    let tokens = response
        .usage
        .map(|u| u.input_tokens + u.output_tokens)
        .unwrap_or(0);
    Ok((content, tokens))
}
