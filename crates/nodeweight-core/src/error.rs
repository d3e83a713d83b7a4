//! Error types for config loading and event decoding.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for event stream decoding.
pub type EventResult<T> = Result<T, EventError>;

/// Errors raised while loading `nodeweight.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised while decoding a recorded event stream.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed event json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("object has no \"kind\" field")]
    MissingKind,

    #[error("failed to decode {kind}: {reason}")]
    Decode { kind: String, reason: String },

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("event is missing field \"{0}\"")]
    MissingField(&'static str),
}
