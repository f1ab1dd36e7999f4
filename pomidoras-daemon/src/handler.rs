//! Request dispatch, independent of the socket transport.

use pomidoras_core::{format_clock, Phase, Request, RequestKind, Response};

use crate::engine::TimerEngine;
use crate::error::DaemonError;

/// Apply one decoded request to the engine and build its response.
pub async fn dispatch(engine: &TimerEngine, request: Request) -> Response {
    match request.kind {
        RequestKind::Status => Response::status(engine.snapshot().await),
        RequestKind::AddDuration => match request.seconds() {
            Ok(seconds) => {
                engine.add_duration(seconds).await;
                Response::ok(format!("Added {seconds} seconds."))
            }
            Err(err) => Response::error(err.to_string()),
        },
        RequestKind::Reset => {
            let status = engine.reset().await;
            match status.phase {
                Phase::Counting => Response::ok(format!(
                    "Timer reset to {}.",
                    format_clock(status.remaining_secs)
                )),
                Phase::Idle => Response::ok("Timer reset to Idle."),
            }
        }
    }
}

/// Dispatch a request read off the wire. Read and decode failures become
/// failure responses.
pub async fn handle_request(
    engine: &TimerEngine,
    request: Result<Request, DaemonError>,
) -> Response {
    match request {
        Ok(request) => dispatch(engine, request).await,
        Err(err) => {
            tracing::debug!(error = %err, "rejecting malformed request");
            Response::error(format!("invalid request format: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomidoras_core::protocol::decode_first;
    use pomidoras_core::TimerStatus;

    use crate::notify::testing::RecordingNotifier;

    async fn engine(initial: u64) -> TimerEngine {
        let (notifier, _rx) = RecordingNotifier::channel();
        TimerEngine::start(initial, notifier).await
    }

    async fn handle_bytes(engine: &TimerEngine, bytes: &[u8]) -> Response {
        let request = decode_first::<Request>(bytes, true)
            .map_err(DaemonError::from)
            .and_then(|request| request.ok_or_else(|| DaemonError::Protocol("no request".into())));
        handle_request(engine, request).await
    }

    #[tokio::test(start_paused = true)]
    async fn status_reports_snapshot() {
        let engine = engine(90).await;
        let response = dispatch(&engine, Request::status()).await;
        assert!(response.success);
        assert_eq!(response.status, Some(TimerStatus::counting(90)));
    }

    #[tokio::test(start_paused = true)]
    async fn add_acknowledges_and_mutates() {
        let engine = engine(0).await;
        let response = dispatch(&engine, Request::add_seconds(30)).await;
        assert!(response.success);
        assert_eq!(response.message.as_deref(), Some("Added 30 seconds."));
        assert!(response.status.is_none());
        assert_eq!(engine.snapshot().await, TimerStatus::counting(30));
    }

    #[tokio::test(start_paused = true)]
    async fn bad_payload_fails_without_mutating() {
        let engine = engine(45).await;
        for payload in [Some("ten"), Some(""), Some("1.5"), Some(" 12 "), None] {
            let request = Request {
                kind: RequestKind::AddDuration,
                payload: payload.map(str::to_string),
            };
            let response = dispatch(&engine, request).await;
            assert!(!response.success, "payload {payload:?} should fail");
            assert!(response.message.as_deref().is_some_and(|m| !m.is_empty()));
        }
        assert_eq!(engine.snapshot().await, TimerStatus::counting(45));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_message_names_target() {
        let response = dispatch(&engine(90).await, Request::reset()).await;
        assert_eq!(response.message.as_deref(), Some("Timer reset to 01:30."));

        let response = dispatch(&engine(0).await, Request::reset()).await;
        assert_eq!(response.message.as_deref(), Some("Timer reset to Idle."));
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_lines_get_failure_responses() {
        let engine = engine(10).await;
        for line in ["", "garbage", "{\"type\":\"explode\"}", "{\"payload\":\"1\"}", "[1,2]"] {
            let response = handle_bytes(&engine, line.as_bytes()).await;
            assert!(!response.success, "line {line:?} should fail");
            let message = response.message.unwrap_or_default();
            assert!(message.starts_with("invalid request format"), "{message}");
        }
        assert_eq!(engine.snapshot().await, TimerStatus::counting(10));
    }

    #[tokio::test(start_paused = true)]
    async fn legacy_line_is_dispatched() {
        let engine = engine(0).await;
        let response =
            handle_bytes(&engine, b"{\"type\":\"add_seconds\",\"payload\":\"-5\"}\n").await;
        assert!(response.success);
        assert_eq!(engine.snapshot().await, TimerStatus::idle());
    }
}
