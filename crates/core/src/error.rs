//! Error types for the Palaver domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; the top-level `Error`
//! aggregates them for callers that cross boundaries.

use thiserror::Error;

/// The top-level error type for all gateway operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A request carried an empty user or channel id. Context keys must
    /// never be empty strings.
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration-time failures.
///
/// All of these are deterministic and occur before any network call or
/// other side effect — a request that hits one is rejected outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Unsupported model provider: {0}")]
    UnsupportedProvider(String),

    #[error("{variable} is required for provider {provider}")]
    MissingCredential {
        provider: &'static str,
        variable: &'static str,
    },

    #[error("SELF_HOSTED_MODEL_URL is required for the self-hosted provider")]
    MissingEndpoint,
}

/// A single backend HTTP call failed or returned a non-2xx status.
///
/// `message` carries the provider's structured error message when one was
/// present in the response body, otherwise a generic fallback. Never retried.
#[derive(Debug, Clone, Error)]
#[error("{provider}: {message}")]
pub struct BackendError {
    pub provider: String,
    pub message: String,
}

impl BackendError {
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Failures at the context-store boundary.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
