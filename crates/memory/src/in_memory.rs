//! In-memory context store — the reference implementation.
//!
//! Serializes concurrent access with a `tokio::sync::RwLock`; concurrent
//! writers to the same (user, channel) key race and the last writer wins,
//! matching the store contract.

use async_trait::async_trait;
use palaver_core::{ContextStore, ConversationContext, StoreError};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

pub struct InMemoryStore {
    contexts: RwLock<HashMap<(String, String), ConversationContext>>,
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn context(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<Option<ConversationContext>, StoreError> {
        let contexts = self.contexts.read().await;
        Ok(contexts
            .get(&(user_id.to_string(), channel_id.to_string()))
            .cloned())
    }

    async fn save_context(&self, context: &ConversationContext) -> Result<(), StoreError> {
        debug!(
            user_id = %context.user_id,
            channel_id = %context.channel_id,
            turns = context.history.len(),
            "saving context"
        );
        let key = (context.user_id.clone(), context.channel_id.clone());
        self.contexts.write().await.insert(key, context.clone());
        Ok(())
    }

    async fn delete_context(&self, user_id: &str, channel_id: &str) -> Result<(), StoreError> {
        self.contexts
            .write()
            .await
            .remove(&(user_id.to_string(), channel_id.to_string()));
        Ok(())
    }

    async fn put(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_core::ConversationTurn;

    #[tokio::test]
    async fn missing_context_is_none() {
        let store = InMemoryStore::new();
        assert!(store.context("u", "c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_fetch_preserves_history() {
        let store = InMemoryStore::new();
        let mut ctx = ConversationContext::new("u", "c");
        ctx.push(ConversationTurn::user("hello"));
        ctx.push(ConversationTurn::assistant("hi"));
        store.save_context(&ctx).await.unwrap();

        let fetched = store.context("u", "c").await.unwrap().unwrap();
        assert_eq!(fetched.history.len(), 2);
        assert_eq!(fetched.history[0].content, "hello");
    }

    #[tokio::test]
    async fn contexts_are_keyed_by_user_and_channel() {
        let store = InMemoryStore::new();
        store
            .save_context(&ConversationContext::new("u1", "c1"))
            .await
            .unwrap();

        assert!(store.context("u1", "c1").await.unwrap().is_some());
        assert!(store.context("u1", "c2").await.unwrap().is_none());
        assert!(store.context("u2", "c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn later_save_wins() {
        let store = InMemoryStore::new();
        let mut first = ConversationContext::new("u", "c");
        first.push(ConversationTurn::user("one"));
        store.save_context(&first).await.unwrap();

        let mut second = ConversationContext::new("u", "c");
        second.push(ConversationTurn::user("two"));
        second.push(ConversationTurn::assistant("three"));
        store.save_context(&second).await.unwrap();

        let fetched = store.context("u", "c").await.unwrap().unwrap();
        assert_eq!(fetched.history.len(), 2);
        assert_eq!(fetched.history[0].content, "two");
    }

    #[tokio::test]
    async fn delete_removes_the_context() {
        let store = InMemoryStore::new();
        store
            .save_context(&ConversationContext::new("u", "c"))
            .await
            .unwrap();
        store.delete_context("u", "c").await.unwrap();
        assert!(store.context("u", "c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn generic_key_value_roundtrip() {
        let store = InMemoryStore::new();
        store
            .put("settings:u1", serde_json::json!({"volume": 7}))
            .await
            .unwrap();

        let value = store.get("settings:u1").await.unwrap().unwrap();
        assert_eq!(value["volume"], 7);

        store.remove("settings:u1").await.unwrap();
        assert!(store.get("settings:u1").await.unwrap().is_none());
    }
}
