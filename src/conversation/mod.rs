//! Conversation state and turn transitions
//!
//! A conversation is an append-only sequence of messages with at most one
//! message "in flight": the assistant message whose response stream is still
//! open. The in-flight message is always the last element and always has
//! role `assistant`; its content is replaced wholesale on every stream
//! update, never patched.
//!
//! All mutations are expressed as transitions from an old conversation to a
//! new one (copy-on-write), so renders always see a consistent snapshot and
//! the transitions are testable without any I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a conversation from previously persisted messages.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Start a turn: append the user message and an empty assistant
    /// placeholder that becomes the in-flight message.
    pub fn with_turn_started(&self, user_text: &str) -> Self {
        let mut messages = self.messages.clone();
        messages.push(Message::user(user_text));
        messages.push(Message::assistant(""));
        Self { messages }
    }

    /// Replace the in-flight assistant message's content with the latest
    /// cumulative value from the stream reducer.
    pub fn with_streamed(&self, content: &str) -> Self {
        let mut messages = self.messages.clone();
        if let Some(last) = messages.last_mut() {
            debug_assert_eq!(last.role, Role::Assistant);
            last.content = content.to_string();
        }
        Self { messages }
    }

    /// Abort the turn: discard the in-flight placeholder (partial content
    /// included) and append a fixed error message in its place. The user
    /// message that started the turn is preserved.
    pub fn with_turn_failed(&self, error_text: &str) -> Self {
        let mut messages = self.messages.clone();
        if messages.last().map(|m| m.role) == Some(Role::Assistant) {
            messages.pop();
        }
        messages.push(Message::assistant(error_text));
        Self { messages }
    }

    /// Clear the whole conversation atomically. Individual messages are
    /// never deleted.
    pub fn cleared(&self) -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_start_appends_user_then_placeholder() {
        let conv = Conversation::new().with_turn_started("hello");
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[0].role, Role::User);
        assert_eq!(conv.messages()[0].content, "hello");
        assert_eq!(conv.messages()[1].role, Role::Assistant);
        assert_eq!(conv.messages()[1].content, "");
    }

    #[test]
    fn streamed_content_replaces_in_flight() {
        let conv = Conversation::new().with_turn_started("hi");
        let conv = conv.with_streamed("Hel");
        let conv = conv.with_streamed("Hello");
        assert_eq!(conv.messages()[1].content, "Hello");
        // Earlier messages untouched.
        assert_eq!(conv.messages()[0].content, "hi");
    }

    #[test]
    fn failed_turn_keeps_user_and_replaces_placeholder() {
        let before = Conversation::new().with_turn_started("first");
        let before = before.with_streamed("a full answer");

        let failing = before.with_turn_started("second");
        let failing = failing.with_streamed("partial junk");
        let after = failing.with_turn_failed("something broke");

        assert_eq!(after.len(), before.len() + 2);
        let last = after.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "something broke");
        // No partial content survives.
        assert!(!after.messages().iter().any(|m| m.content == "partial junk"));
        // The user message that started the failed turn is preserved.
        assert_eq!(after.messages()[before.len()].content, "second");
    }

    #[test]
    fn transitions_do_not_mutate_the_source() {
        let original = Conversation::new().with_turn_started("hello");
        let _ = original.with_streamed("Hi");
        let _ = original.with_turn_failed("boom");
        let _ = original.cleared();
        assert_eq!(original.len(), 2);
        assert_eq!(original.messages()[1].content, "");
    }

    #[test]
    fn cleared_is_empty() {
        let conv = Conversation::new().with_turn_started("x").cleared();
        assert!(conv.is_empty());
    }

    #[test]
    fn serde_round_trip_preserves_messages() {
        let conv = Conversation::new()
            .with_turn_started("hello")
            .with_streamed("world");
        let json = serde_json::to_string(&conv).unwrap();
        let restored: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, conv);
    }
}
