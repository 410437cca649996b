use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// A request to be sent to the chat provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatRequest {
    /// The transcript, oldest entry first.
    pub messages: Vec<ChatMessage>,
}

/// The role of a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions for the model, never shown to the user.
    System,
    /// Text written by the user.
    User,
    /// Text written by the assistant.
    Assistant,
}

impl ChatRole {
    /// Returns the wire name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl Display for ChatRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete transcript entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
}

impl ChatMessage {
    /// Returns the role of this entry.
    #[inline]
    pub fn role(&self) -> ChatRole {
        match self {
            ChatMessage::System(_) => ChatRole::System,
            ChatMessage::User(_) => ChatRole::User,
            ChatMessage::Assistant(_) => ChatRole::Assistant,
        }
    }

    /// Returns the text of this entry.
    #[inline]
    pub fn content(&self) -> &str {
        match self {
            ChatMessage::System(content)
            | ChatMessage::User(content)
            | ChatMessage::Assistant(content) => content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_and_content() {
        let msg = ChatMessage::Assistant("Woof".to_owned());
        assert_eq!(msg.role(), ChatRole::Assistant);
        assert_eq!(msg.content(), "Woof");
        assert_eq!(ChatMessage::System(String::new()).role().as_str(), "system");
    }
}
