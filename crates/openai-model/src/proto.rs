use serde::{Deserialize, Serialize};
use vugasu_chat_model::{ChatMessage, ChatRequest, FinishReason};

use crate::OpenAIConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Choice {
    pub message: Option<ChoiceMessage>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ChatRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    }
}

#[inline]
fn create_message(msg: &ChatMessage) -> Message {
    match msg {
        ChatMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ChatMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ChatMessage::Assistant(content) => Message::Assistant {
            content: content.clone(),
        },
    }
}

pub fn parse_finish_reason(reason: Option<&str>) -> Option<FinishReason> {
    reason.map(|reason| match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Other,
    })
}
