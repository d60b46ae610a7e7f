//! Helpers shared by the HTTP backends.

use palaver_core::BackendError;

/// Pull the provider's structured error message out of a response body.
/// All supported providers use the `{"error": {"message": ...}}` shape.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .get("message")?
        .as_str()
        .map(String::from)
}

/// Map a non-2xx response to a `BackendError`, preferring the provider's
/// structured message over the generic fallback.
pub(crate) fn api_error(provider: &str, status: u16, body: &str) -> BackendError {
    let message =
        error_message(body).unwrap_or_else(|| format!("request failed with HTTP {status}"));
    BackendError::new(provider, message)
}

/// Map a transport-level failure to a `BackendError`.
pub(crate) fn network_error(provider: &str, err: reqwest::Error) -> BackendError {
    BackendError::new(provider, format!("network error: {err}"))
}
