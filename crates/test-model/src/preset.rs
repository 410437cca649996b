use serde::{Deserialize, Serialize};

/// The kind of a preset failure, mirroring the provider error kinds that
/// matter to tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetFailure {
    /// The request never reached the service.
    Network,
    /// The service answered with an error status.
    Status,
    /// The service is rate limited.
    RateLimited,
    /// The body had no usable completion.
    Malformed,
}

/// One scripted answer of the fake provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetReply {
    /// The provider replies with this text.
    #[serde(rename = "text")]
    Text(String),
    /// The provider fails.
    #[serde(rename = "failure")]
    Failure(PresetFailure),
}
