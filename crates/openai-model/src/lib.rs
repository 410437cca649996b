//! A chat provider for OpenAI-compatible APIs.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use reqwest::{Client, StatusCode, header};
use vugasu_chat_model::{
    ChatProvider, ChatProviderError, ChatRequest, ChatResponse, ErrorKind,
};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};
use proto::ChatCompletion;

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ChatProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// OpenAI-compatible chat provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ChatProvider for OpenAIProvider {
    type Error = Error;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        let resp_fut = self
            .client
            .post(self.config.endpoint())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .json(&openai_req)
            .send();

        async move {
            let resp = resp_fut
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Transport))?;

            let status = resp.status();
            if !status.is_success() {
                let kind = if status == StatusCode::TOO_MANY_REQUESTS {
                    ErrorKind::RateLimitExceeded
                } else {
                    ErrorKind::Status
                };
                let reason = status.canonical_reason().unwrap_or("unknown");
                return Err(Error::new(
                    format!("API request failed: {} {reason}", status.as_u16()),
                    kind,
                ));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            let is_json = content_type
                .as_deref()
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype() == mime::JSON)
                .unwrap_or(false);
            if !is_json {
                warn!("unexpected content type {content_type:?}, parsing anyway");
            }

            let body = resp
                .bytes()
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Transport))?;
            parse_completion(&body)
        }
    }
}

fn parse_completion(body: &[u8]) -> Result<ChatResponse, Error> {
    let completion = serde_json::from_slice::<ChatCompletion>(body)
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::MalformedResponse))?;

    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(Error::new(
            "response contains no choices",
            ErrorKind::MalformedResponse,
        ));
    };
    let finish_reason = proto::parse_finish_reason(choice.finish_reason.as_deref());
    let content = choice
        .message
        .and_then(|msg| msg.content)
        .filter(|content| !content.trim().is_empty());
    let Some(content) = content else {
        return Err(Error::new(
            "first choice has no content",
            ErrorKind::MalformedResponse,
        ));
    };

    trace!("got a completion, finish reason: {finish_reason:?}");
    Ok(ChatResponse {
        content,
        finish_reason,
    })
}
