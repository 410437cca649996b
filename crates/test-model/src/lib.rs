//! A local fake chat provider for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::sleep;
use vugasu_chat_model::{
    ChatProvider, ChatProviderError, ChatRequest, ChatResponse, ErrorKind,
};

pub use preset::*;

/// The error returned for a scripted failure.
#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl StdError for Error {}

impl ChatProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<PresetFailure> for Error {
    fn from(failure: PresetFailure) -> Self {
        let (message, kind) = match failure {
            PresetFailure::Network => ("network is unreachable", ErrorKind::Transport),
            PresetFailure::Status => {
                ("API request failed: 500 Internal Server Error", ErrorKind::Status)
            }
            PresetFailure::RateLimited => {
                ("API request failed: 429 Too Many Requests", ErrorKind::RateLimitExceeded)
            }
            PresetFailure::Malformed => {
                ("response contains no choices", ErrorKind::MalformedResponse)
            }
        };
        Self { message, kind }
    }
}

#[derive(Default)]
struct Script {
    replies: VecDeque<PresetReply>,
    requests: Vec<ChatRequest>,
    delay: Option<Duration>,
}

/// A local fake chat provider for testing purpose.
///
/// Replies are consumed in the order they were added, one per request.
/// When the script runs out, requests fail with [`ErrorKind::Other`].
/// Every request is recorded, so tests can inspect what was sent after the
/// provider has been handed over to the code under test. Clones share the
/// same script.
#[derive(Clone, Default)]
pub struct TestChatProvider {
    script: Arc<Mutex<Script>>,
}

impl TestChatProvider {
    /// Queues a successful reply with `text` as content.
    #[inline]
    pub fn add_reply<S: Into<String>>(&self, text: S) {
        self.script()
            .replies
            .push_back(PresetReply::Text(text.into()));
    }

    /// Queues a failed reply.
    #[inline]
    pub fn add_failure(&self, failure: PresetFailure) {
        self.script()
            .replies
            .push_back(PresetReply::Failure(failure));
    }

    /// Delays every reply by `duration`.
    #[inline]
    pub fn set_delay(&self, duration: Duration) {
        self.script().delay = Some(duration);
    }

    /// Returns all requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.script().requests.clone()
    }

    /// Returns how many requests were received so far.
    #[inline]
    pub fn request_count(&self) -> usize {
        self.script().requests.len()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for TestChatProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let script = self.script();
        f.debug_struct("TestChatProvider")
            .field("pending_replies", &script.replies.len())
            .field("requests", &script.requests.len())
            .finish()
    }
}

impl ChatProvider for TestChatProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + 'static
    {
        let (reply, delay) = {
            let mut script = self.script();
            script.requests.push(req.clone());
            (script.replies.pop_front(), script.delay)
        };

        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            match reply {
                Some(PresetReply::Text(text)) => Ok(ChatResponse::with_content(text)),
                Some(PresetReply::Failure(failure)) => Err(failure.into()),
                None => Err(Error {
                    message: "no enough replies",
                    kind: ErrorKind::Other,
                }),
            }
        }
    }
}
