use std::fmt::{self, Display, Formatter};

/// The kind of error that occurred.
///
/// Callers of a provider are not expected to branch on this value for
/// user-facing behavior. It exists so that failures can be told apart in
/// logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request never got a response (connection, DNS, TLS, etc).
    Transport,
    /// The service answered with a non-success status.
    Status,
    /// The service is rate limited.
    RateLimitExceeded,
    /// The response body does not contain a usable completion.
    MalformedResponse,
    /// Any other errors.
    Other,
}

impl ErrorKind {
    /// Returns a short, stable name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Status => "status",
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::Other => "other",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
