//! Error types for pomidoras-core.

use thiserror::Error;

/// Errors raised while encoding or decoding protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The bytes on the wire were not a valid message.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The peer closed the connection without sending a message.
    #[error("connection closed before a message was received")]
    Empty,

    /// An `add_duration` request carried no payload.
    #[error("missing payload for {kind} request")]
    MissingPayload { kind: &'static str },

    /// An `add_duration` payload was not a signed integer.
    #[error("invalid seconds value '{payload}'")]
    InvalidPayload { payload: String },
}

/// Errors raised while parsing a duration argument such as `90s` or `1h30m`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("duration is empty")]
    Empty,

    #[error("negative durations are not allowed: '{0}'")]
    Negative(String),

    /// A number was not followed by a unit (and was not a bare integer).
    #[error("missing unit in duration '{0}'")]
    MissingUnit(String),

    #[error("unknown unit '{unit}' in duration '{input}'; expected h, m or s")]
    UnknownUnit { unit: String, input: String },

    #[error("invalid number in duration '{0}'")]
    InvalidNumber(String),

    #[error("duration '{0}' is too large")]
    Overflow(String),
}
