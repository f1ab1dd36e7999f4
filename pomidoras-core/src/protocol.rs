//! Request/response messages exchanged between `pomidorasctl` and the daemon.
//!
//! Each connection carries exactly one JSON request followed by exactly one
//! JSON response. Messages are written newline-terminated, but a reader takes
//! the first complete JSON value and does not wait for the newline. The schema
//! is transport independent; the daemon's dispatcher consumes [`Request`]
//! values directly.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::types::TimerStatus;

/// Closed set of operations a client may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Status,
    #[serde(alias = "add_seconds")]
    AddDuration,
    Reset,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Status => "status",
            RequestKind::AddDuration => "add_duration",
            RequestKind::Reset => "reset",
        }
    }
}

/// A single client request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    /// Decimal payload; for `add_duration` the signed number of seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl Request {
    pub fn status() -> Self {
        Self {
            kind: RequestKind::Status,
            payload: None,
        }
    }

    pub fn add_seconds(seconds: i64) -> Self {
        Self {
            kind: RequestKind::AddDuration,
            payload: Some(seconds.to_string()),
        }
    }

    pub fn reset() -> Self {
        Self {
            kind: RequestKind::Reset,
            payload: None,
        }
    }

    /// Parse the payload as a signed count of seconds.
    pub fn seconds(&self) -> Result<i64, ProtocolError> {
        let payload = self
            .payload
            .as_deref()
            .ok_or(ProtocolError::MissingPayload {
                kind: self.kind.as_str(),
            })?;
        payload
            .parse::<i64>()
            .map_err(|_| ProtocolError::InvalidPayload {
                payload: payload.to_string(),
            })
    }
}

/// A single daemon response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Present only on a successful `status` response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TimerStatus>,
}

impl Response {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            status: None,
        }
    }

    pub fn status(status: TimerStatus) -> Self {
        Self {
            success: true,
            message: None,
            status: Some(status),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            status: None,
        }
    }
}

/// Encode a message as one newline-terminated JSON line.
pub fn encode_line<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    let mut bytes = serde_json::to_vec(message)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode one message from a received line. Surrounding whitespace is ignored.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Decode the first complete message at the start of `bytes`.
///
/// Returns `Ok(None)` while the message is still incomplete. Anything after
/// the first value is ignored. Once `at_eof` is set no more bytes will
/// arrive, so an incomplete or absent message is an error.
pub fn decode_first<T: DeserializeOwned>(
    bytes: &[u8],
    at_eof: bool,
) -> Result<Option<T>, ProtocolError> {
    let mut values = serde_json::Deserializer::from_slice(bytes).into_iter::<T>();
    match values.next() {
        Some(Ok(message)) => Ok(Some(message)),
        Some(Err(err)) if err.is_eof() && !at_eof => Ok(None),
        Some(Err(err)) => Err(err.into()),
        None if at_eof => Err(ProtocolError::Empty),
        None => Ok(None),
    }
}
