//! Request orchestration for the Palaver gateway.
//!
//! One `Orchestrator` owns the active backend selection, the context store
//! handle, and the tool dispatcher, and composes them to fulfill a
//! "process message" call: fetch (or create) the conversation context,
//! invoke the backend with the windowed history, append the user/assistant
//! turn pair, persist, and return the normalized response with latency and
//! token metadata.
//!
//! Failure anywhere aborts the request without persisting partial state —
//! all mutation happens on an owned copy of the context, and the copy is
//! discarded unless the store write succeeds.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use palaver_backends::resolver;
use palaver_config::Settings;
use palaver_core::{
    Backend, BackendConfig, ContextStore, ConversationContext, ConversationTurn, Error,
    NormalizedResponse, Result,
};
use palaver_tools::ToolDispatcher;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// Who a request is for. `user_id` and `channel_id` form the context key
/// and must be non-empty.
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    pub user_id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub interaction_type: String,
}

impl RequestIdentity {
    pub fn new(user_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            channel_id: channel_id.into(),
            guild_id: None,
            interaction_type: "message".into(),
        }
    }

    pub fn with_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_interaction_type(mut self, interaction_type: impl Into<String>) -> Self {
        self.interaction_type = interaction_type.into();
        self
    }
}

/// Response metadata returned alongside each completed request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub model: String,
    pub token_count: u32,
    pub latency_ms: f64,
}

/// The result of one fully completed request.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub response: NormalizedResponse,
    /// The persisted context, including the new turn pair.
    pub context: ConversationContext,
    pub metadata: ResponseMetadata,
}

/// Health surface reported by `status()`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub status: String,
    pub uptime_seconds: f64,
    pub metrics: ServiceMetrics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetrics {
    pub requests_total: u64,
    pub errors_total: u64,
    pub average_latency_ms: f64,
}

struct ActiveBackend {
    config: BackendConfig,
    backend: Arc<dyn Backend>,
}

pub struct Orchestrator {
    active: RwLock<ActiveBackend>,
    store: Arc<dyn ContextStore>,
    tools: ToolDispatcher,
    started_at: Instant,
    requests: AtomicU64,
    errors: AtomicU64,
    latency_total_us: AtomicU64,
}

impl Orchestrator {
    /// Build an orchestrator around an already-resolved backend.
    pub fn new(
        config: BackendConfig,
        backend: Arc<dyn Backend>,
        store: Arc<dyn ContextStore>,
    ) -> Self {
        info!(provider = %config.provider, model = %config.model_name, "orchestrator ready");
        Self {
            active: RwLock::new(ActiveBackend { config, backend }),
            store,
            tools: ToolDispatcher::new(),
            started_at: Instant::now(),
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            latency_total_us: AtomicU64::new(0),
        }
    }

    /// Resolve the backend from settings and build the orchestrator.
    pub fn from_settings(
        settings: &Settings,
        store: Arc<dyn ContextStore>,
    ) -> std::result::Result<Self, palaver_core::ConfigError> {
        let (config, backend) = resolver::resolve(settings)?;
        Ok(Self::new(config, backend, store))
    }

    /// The active backend configuration.
    pub async fn config(&self) -> BackendConfig {
        self.active.read().await.config.clone()
    }

    /// The tool dispatcher, for callers executing tools directly.
    pub fn tools(&self) -> &ToolDispatcher {
        &self.tools
    }

    /// Process one message: fetch context, invoke the active backend with
    /// the windowed history, append the turn pair, persist, and return the
    /// normalized response.
    pub async fn process_message(
        &self,
        message: &str,
        identity: &RequestIdentity,
    ) -> Result<ProcessOutcome> {
        match self.run(message, identity).await {
            Ok(outcome) => {
                self.requests.fetch_add(1, Ordering::Relaxed);
                self.latency_total_us.fetch_add(
                    (outcome.metadata.latency_ms * 1000.0) as u64,
                    Ordering::Relaxed,
                );
                Ok(outcome)
            }
            Err(err) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "message processing failed");
                Err(err)
            }
        }
    }

    async fn run(&self, message: &str, identity: &RequestIdentity) -> Result<ProcessOutcome> {
        if identity.user_id.is_empty() || identity.channel_id.is_empty() {
            return Err(Error::InvalidIdentity(
                "userId and channelId must be non-empty".into(),
            ));
        }

        let backend = self.active.read().await.backend.clone();

        // Fetching
        let mut context = match self
            .store
            .context(&identity.user_id, &identity.channel_id)
            .await?
        {
            Some(context) => context,
            None => {
                debug!(
                    user_id = %identity.user_id,
                    channel_id = %identity.channel_id,
                    "creating new conversation context"
                );
                let mut context =
                    ConversationContext::new(&identity.user_id, &identity.channel_id);
                context.guild_id = identity.guild_id.clone();
                context.interaction_type = identity.interaction_type.clone();
                context
            }
        };
        let user_turn = ConversationTurn::user(message)
            .with_metadata("interactionType", identity.interaction_type.clone().into());

        // Invoking — the window sent to the backend is built from the
        // history as fetched; the new message rides separately and is
        // appended to the wire list exactly once.
        let started = Instant::now();
        let mut response = backend.complete(message, &context).await?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        // The orchestrator's wall-clock measurement is authoritative.
        response.latency_ms = latency_ms;

        // Persisting — the two appends and the store write are one logical
        // unit; if the write fails the owned copy is dropped with them.
        context.push(user_turn);
        context.push(
            ConversationTurn::assistant(&response.content)
                .with_metadata("interactionType", identity.interaction_type.clone().into())
                .with_metadata("tools", serde_json::Value::Array(Vec::new())),
        );
        self.store.save_context(&context).await?;

        let metadata = ResponseMetadata {
            model: response.model_name.clone(),
            token_count: response.token_count,
            latency_ms,
        };
        Ok(ProcessOutcome {
            response,
            context,
            metadata,
        })
    }

    /// Process a batch sequentially. Items share no transactional boundary:
    /// one failure does not affect prior completed items.
    pub async fn process_batch(
        &self,
        items: &[(String, RequestIdentity)],
    ) -> Vec<Result<ProcessOutcome>> {
        let mut outcomes = Vec::with_capacity(items.len());
        for (message, identity) in items {
            outcomes.push(self.process_message(message, identity).await);
        }
        outcomes
    }

    /// A finite, word-chunked echo stream. This is a minimal simulation of
    /// streaming, not per-provider token streaming; the caller dropping the
    /// receiver ends generation.
    pub fn process_message_stream(&self, message: &str) -> ReceiverStream<String> {
        let text = format!(
            "I received your message: {message}. This is a placeholder streaming response."
        );
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        tokio::spawn(async move {
            for word in text.split_whitespace() {
                if tx.send(format!("{word} ")).await.is_err() {
                    // Receiver dropped — stop generating.
                    return;
                }
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        });
        ReceiverStream::new(rx)
    }

    /// Current health and request metrics.
    pub fn status(&self) -> ServiceStatus {
        let requests = self.requests.load(Ordering::Relaxed);
        let total_us = self.latency_total_us.load(Ordering::Relaxed);
        let average_latency_ms = if requests > 0 {
            total_us as f64 / requests as f64 / 1000.0
        } else {
            0.0
        };
        ServiceStatus {
            status: "healthy".into(),
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
            metrics: ServiceMetrics {
                requests_total: requests,
                errors_total: self.errors.load(Ordering::Relaxed),
                average_latency_ms,
            },
        }
    }

    /// Re-resolve the active backend from new settings. On failure the
    /// previous backend stays active.
    pub async fn update_settings(
        &self,
        settings: &Settings,
    ) -> std::result::Result<(), palaver_core::ConfigError> {
        let (config, backend) = resolver::resolve(settings)?;
        info!(provider = %config.provider, model = %config.model_name, "switching backend");
        *self.active.write().await = ActiveBackend { config, backend };
        Ok(())
    }
}
