use serde::{Deserialize, Serialize};

/// The reason why the model stopped generating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinishReason {
    /// The model has finished generating text.
    Stop,
    /// The reply hit the maximum length bound.
    Length,
    /// The reply was cut by the provider's content filter.
    ContentFilter,
    /// The provider reported something else, or nothing at all.
    Other,
}

/// A complete reply from the chat provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Text of the first completion, unmodified.
    pub content: String,
    /// Why the completion ended, if the provider said so.
    pub finish_reason: Option<FinishReason>,
}

impl ChatResponse {
    /// Creates a response that finished normally.
    #[inline]
    pub fn with_content<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            finish_reason: Some(FinishReason::Stop),
        }
    }
}
