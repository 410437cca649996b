use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::pin::Pin;
use std::sync::Arc;

use tracing::Instrument;
use vugasu_chat_model::{
    ChatMessage, ChatProvider, ChatProviderError, ChatRequest, ChatResponse,
    ErrorKind, FinishReason,
};

type SendRequestResult = Result<ChatResponse, Box<dyn ChatProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ChatRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// The assistant could not produce a reply.
///
/// Every failure of the chat provider collapses into this one error. The
/// display text is the same for all of them; [`ChatError::cause`] and
/// [`ChatError::kind`] keep the details for logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatError {
    kind: ErrorKind,
    cause: String,
}

impl ChatError {
    fn from_provider(err: &dyn ChatProviderError) -> Self {
        Self {
            kind: err.kind(),
            cause: err.to_string(),
        }
    }

    /// Returns what went wrong underneath.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the provider's description of the failure.
    #[inline]
    pub fn cause(&self) -> &str {
        &self.cause
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Failed to get response from AI service")
    }
}

impl Error for ChatError {}

/// A wrapper around a chat provider that provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub struct ChatClient {
    handler_fn: HandlerFn,
}

impl ChatClient {
    /// Wraps `provider`.
    #[inline]
    pub fn new<P: ChatProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ChatClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| -> BoxedSendRequestFuture {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("sending {} transcript entries", req.messages.len());
                    fut.await
                        .map_err(|err| Box::new(err) as Box<dyn ChatProviderError>)
                }
                .instrument(trace_span!("chat client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends `transcript` and returns the assistant's reply.
    ///
    /// Exactly one request is made per call.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. Dropping the future abandons the
    /// request without any other effect.
    pub async fn chat(
        &self,
        transcript: Vec<ChatMessage>,
    ) -> Result<String, ChatError> {
        let req = ChatRequest {
            messages: transcript,
        };
        match (self.handler_fn)(req).await {
            Ok(resp) if resp.content.trim().is_empty() => {
                error!("got an empty reply");
                Err(ChatError {
                    kind: ErrorKind::MalformedResponse,
                    cause: "the reply is empty".to_owned(),
                })
            }
            Ok(resp) => {
                if resp.finish_reason == Some(FinishReason::Length) {
                    warn!("reply was cut at the length limit");
                }
                Ok(resp.content)
            }
            Err(err) => {
                error!("got an error ({}): {err}", err.kind());
                Err(ChatError::from_provider(err.as_ref()))
            }
        }
    }
}

impl Debug for ChatClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient").finish_non_exhaustive()
    }
}
