//! ContextStore trait — the persistence seam for conversation state.
//!
//! The core never persists anything itself; it reads and writes contexts
//! through this boundary. Implementations must make concurrent
//! read-modify-write on the same (user, channel) key safe; last writer wins,
//! there is no optimistic-concurrency check.

use crate::context::ConversationContext;
use crate::error::StoreError;
use async_trait::async_trait;

#[async_trait]
pub trait ContextStore: Send + Sync {
    /// The store name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Fetch the context for a (user, channel) pair, if one exists.
    async fn context(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> std::result::Result<Option<ConversationContext>, StoreError>;

    /// Persist a context under its (user, channel) key, replacing any
    /// previous value.
    async fn save_context(
        &self,
        context: &ConversationContext,
    ) -> std::result::Result<(), StoreError>;

    /// Delete the context for a (user, channel) pair.
    async fn delete_context(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> std::result::Result<(), StoreError>;

    /// Store an arbitrary value under a key.
    async fn put(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> std::result::Result<(), StoreError>;

    /// Fetch an arbitrary value by key.
    async fn get(&self, key: &str) -> std::result::Result<Option<serde_json::Value>, StoreError>;

    /// Remove an arbitrary value by key.
    async fn remove(&self, key: &str) -> std::result::Result<(), StoreError>;
}
