//! Pomidoras core library — timer domain types, wire protocol, errors.
//!
//! Public API surface:
//! - [`types`] — [`Phase`] and [`TimerStatus`]
//! - [`protocol`] — [`Request`] / [`Response`] messages and their line codec
//! - [`duration`] — parsing of the daemon's initial-duration argument
//! - [`error`] — [`ProtocolError`] and [`DurationParseError`]

pub mod duration;
pub mod error;
pub mod protocol;
pub mod types;

pub use duration::parse_duration_secs;
pub use error::{DurationParseError, ProtocolError};
pub use protocol::{Request, RequestKind, Response};
pub use types::{format_clock, Phase, TimerStatus};
