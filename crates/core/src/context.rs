//! Conversation domain types.
//!
//! A `ConversationContext` is the accumulated state for one (user, channel)
//! pair: an append-only history of turns plus preferences and enabled tools.
//! Field names serialize in camelCase so contexts round-trip unchanged
//! through callers that speak the gateway's JSON shape.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// History turns passed to a backend call are truncated to this many most
/// recent entries. This bound is a hard contract — it caps request payload
/// size and cost — not a tunable default.
pub const HISTORY_WINDOW: usize = 10;

/// Current time as unix seconds, the timestamp representation used on
/// turns and contexts.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message entry in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: unix_now(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attach a metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A role + content pair as sent to a backend. Metadata is stripped at this
/// boundary; only what the provider wire formats carry survives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// The accumulated conversation state for one (user, channel) pair.
///
/// Created on first access with an empty history and default preferences,
/// mutated by the orchestrator (two appends per request), persisted after
/// each request. The core imposes no expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub interaction_type: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub preferences: serde_json::Map<String, serde_json::Value>,
    pub timestamp: f64,
}

impl ConversationContext {
    /// Create a fresh context for a (user, channel) pair.
    ///
    /// Both ids must be non-empty; callers enforce this before reaching the
    /// store.
    pub fn new(user_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            guild_id: None,
            channel_id: channel_id.into(),
            interaction_type: "message".into(),
            history: Vec::new(),
            tools: Vec::new(),
            preferences: default_preferences(),
            timestamp: unix_now(),
        }
    }

    /// Append a turn and refresh the context timestamp.
    pub fn push(&mut self, turn: ConversationTurn) {
        self.timestamp = unix_now();
        self.history.push(turn);
    }

    /// The system prompt configured for this context, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.preferences.get("systemPrompt").and_then(|v| v.as_str())
    }

    /// Build the ordered message list for a backend call: an optional system
    /// turn from preferences, then at most the last `HISTORY_WINDOW` history
    /// turns in original order, then `new_message` as the final user turn.
    pub fn request_messages(&self, new_message: &str) -> Vec<ChatMessage> {
        let start = self.history.len().saturating_sub(HISTORY_WINDOW);
        let mut messages = Vec::with_capacity(self.history.len() - start + 2);

        if let Some(system) = self.system_prompt() {
            messages.push(ChatMessage {
                role: Role::System,
                content: system.to_string(),
            });
        }

        for turn in &self.history[start..] {
            messages.push(ChatMessage {
                role: turn.role,
                content: turn.content.clone(),
            });
        }

        messages.push(ChatMessage {
            role: Role::User,
            content: new_message.to_string(),
        });

        messages
    }
}

fn default_preferences() -> serde_json::Map<String, serde_json::Value> {
    let serde_json::Value::Object(map) = serde_json::json!({
        "language": "en",
        "textModel": "gpt-4",
        "autoJoinVoice": true,
        "notificationSettings": {
            "reminders": true,
            "mentions": true,
            "dms": true
        }
    }) else {
        unreachable!()
    };
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_has_empty_history_and_default_preferences() {
        let ctx = ConversationContext::new("user-1", "channel-1");
        assert!(ctx.history.is_empty());
        assert_eq!(ctx.preferences["language"], "en");
        assert!(ctx.timestamp > 0.0);
    }

    #[test]
    fn push_appends_in_order() {
        let mut ctx = ConversationContext::new("u", "c");
        ctx.push(ConversationTurn::user("first"));
        ctx.push(ConversationTurn::assistant("second"));
        assert_eq!(ctx.history.len(), 2);
        assert_eq!(ctx.history[0].content, "first");
        assert_eq!(ctx.history[1].role, Role::Assistant);
    }

    #[test]
    fn request_messages_appends_new_message_last() {
        let mut ctx = ConversationContext::new("u", "c");
        ctx.push(ConversationTurn::user("hi"));
        ctx.push(ConversationTurn::assistant("hello"));

        let messages = ctx.request_messages("how are you?");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, Role::User);
        assert_eq!(messages[2].content, "how are you?");
    }

    #[test]
    fn request_messages_truncates_to_window() {
        let mut ctx = ConversationContext::new("u", "c");
        for i in 0..25 {
            ctx.push(ConversationTurn::user(format!("turn {i}")));
        }

        let messages = ctx.request_messages("latest");
        // 10 history turns + the new user message
        assert_eq!(messages.len(), HISTORY_WINDOW + 1);
        assert_eq!(messages[0].content, "turn 15");
        assert_eq!(messages[9].content, "turn 24");
        assert_eq!(messages[10].content, "latest");
    }

    #[test]
    fn request_messages_preserves_relative_order() {
        let mut ctx = ConversationContext::new("u", "c");
        for i in 0..12 {
            ctx.push(ConversationTurn::user(format!("{i}")));
        }
        let messages = ctx.request_messages("x");
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "x"]
        );
    }

    #[test]
    fn request_messages_includes_system_prompt_first() {
        let mut ctx = ConversationContext::new("u", "c");
        ctx.preferences
            .insert("systemPrompt".into(), "You are terse.".into());
        ctx.push(ConversationTurn::user("hi"));

        let messages = ctx.request_messages("next");
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "You are terse.");
        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn request_messages_strips_metadata() {
        let mut ctx = ConversationContext::new("u", "c");
        ctx.push(ConversationTurn::user("hi").with_metadata("interactionType", "message".into()));
        // ChatMessage carries role + content only; compiles as the proof,
        // assert the content survived.
        let messages = ctx.request_messages("x");
        assert_eq!(messages[0].content, "hi");
    }

    #[test]
    fn context_serializes_with_camel_case_keys() {
        let ctx = ConversationContext::new("user-1", "channel-9");
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["channelId"], "channel-9");
        assert_eq!(json["interactionType"], "message");
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn role_serializes_lowercase() {
        let turn = ConversationTurn::assistant("ok");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
    }

    #[test]
    fn context_roundtrips_through_json() {
        let mut ctx = ConversationContext::new("u", "c");
        ctx.push(ConversationTurn::user("hello").with_metadata("interactionType", "dm".into()));
        let json = serde_json::to_string(&ctx).unwrap();
        let back: ConversationContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back.history.len(), 1);
        assert_eq!(back.history[0].metadata["interactionType"], "dm");
    }
}
