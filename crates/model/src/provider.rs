use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ChatRequest;
use crate::response::ChatResponse;

/// The error type for a chat provider.
pub trait ChatProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a chat completion provider.
///
/// Once the provider is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the provider should be prepared for being dropped anytime.
///
/// Every call to [`ChatProvider::send_request`] must result in at most one
/// attempt against the underlying service. Retrying is up to the caller.
pub trait ChatProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ChatProviderError;

    /// Sends a request and resolves to the complete reply.
    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + 'static;
}
