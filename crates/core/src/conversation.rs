//! Conversation-related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vugasu_chat_model::ChatMessage;

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    /// The person using the widget.
    #[serde(rename = "user")]
    User,
    /// The assistant. Stored as `"bot"`.
    #[serde(rename = "bot")]
    Assistant,
}

impl Sender {
    /// Returns the label shown next to messages from this sender.
    #[inline]
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Assistant",
        }
    }
}

/// How a message was produced by the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// Typed by the user.
    Text,
    /// Sent from a quick reply suggestion.
    QuickReply,
}

/// A message in the conversation.
///
/// Messages are immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    id: String,
    content: String,
    sender: Sender,
    timestamp: DateTime<Utc>,
    kind: Option<MessageKind>,
}

impl Message {
    /// Creates a message.
    #[inline]
    pub fn new<I: Into<String>, C: Into<String>>(
        id: I,
        content: C,
        sender: Sender,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            sender,
            timestamp,
            kind: None,
        }
    }

    /// Attaches a kind to the message.
    #[inline]
    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Returns the unique identifier of this message.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display text.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the author.
    #[inline]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns the creation instant.
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the kind, if one was recorded.
    #[inline]
    pub fn kind(&self) -> Option<MessageKind> {
        self.kind
    }

    /// Maps this message into a transcript entry.
    pub fn to_chat_message(&self) -> ChatMessage {
        let content = self.content.clone();
        match self.sender {
            Sender::User => ChatMessage::User(content),
            Sender::Assistant => ChatMessage::Assistant(content),
        }
    }
}

/// Issues message ids.
///
/// Ids are seeded from the wall clock in milliseconds and always move
/// forward, so two messages created within the same millisecond still
/// get distinct ids.
#[derive(Clone, Debug, Default)]
pub(crate) struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn next(&mut self, now: DateTime<Utc>) -> String {
        let id = now.timestamp_millis().max(self.last.saturating_add(1));
        self.last = id;
        id.to_string()
    }

    /// Makes sure future ids sort after `id` if it is numeric.
    pub fn observe(&mut self, id: &str) {
        if let Ok(value) = id.parse::<i64>() {
            self.last = self.last.max(value);
        }
    }
}
