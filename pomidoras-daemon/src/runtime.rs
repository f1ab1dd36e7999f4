use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::broadcast;

use pomidoras_core::protocol::{decode_first, encode_line};
use pomidoras_core::{format_clock, ProtocolError, Request, Response};

use crate::engine::TimerEngine;
use crate::error::{io_err, DaemonError};
use crate::handler;
use crate::notify::{DesktopNotifier, Notifier};
use crate::paths::{
    socket_path, ACCEPT_BACKOFF, LOG_FORMAT_ENV, MAX_REQUEST_BYTES, REQUEST_TIMEOUT,
    SHUTDOWN_GRACE,
};

/// Seconds added by `SIGUSR1`.
pub const SIGUSR1_ADD_SECS: i64 = 30;
/// Minutes added by `SIGUSR2`.
pub const SIGUSR2_ADD_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub socket: PathBuf,
    pub initial_secs: u64,
}

impl DaemonConfig {
    /// Socket from `POMIDORAS_SOCKET` or the well-known default.
    pub fn from_env(initial_secs: u64) -> Self {
        Self {
            socket: socket_path(),
            initial_secs,
        }
    }
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(config: DaemonConfig) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    let result = runtime.block_on(run(config, Arc::new(DesktopNotifier::default())));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

/// Run the daemon: bind the socket, then serve until SIGTERM/SIGINT.
pub async fn run(config: DaemonConfig, notifier: Arc<dyn Notifier>) -> Result<(), DaemonError> {
    // Install handlers before the socket answers so no signal hits its default action.
    let control_signals = ControlSignals::register()?;
    let termination_signals = TerminationSignals::register()?;
    let listener = bind_socket(&config.socket)?;
    tracing::info!(socket = %config.socket.display(), "daemon listening");

    let engine = TimerEngine::start(config.initial_secs, notifier).await;
    let (shutdown_tx, _) = broadcast::channel::<()>(4);

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let shutdown_rx = shutdown.subscribe();
        let engine = engine.clone();
        let socket = config.socket.clone();
        tokio::spawn(async move {
            let result = socket_server_task(listener, socket, engine, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let control_handle = {
        let shutdown = shutdown_tx.clone();
        let shutdown_rx = shutdown.subscribe();
        let engine = engine.clone();
        tokio::spawn(async move {
            let result = control_signal_task(engine, control_signals, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            termination_signal_task(termination_signals, shutdown, shutdown_rx).await
        })
    };

    let (socket_result, control_result, signal_result) =
        tokio::join!(socket_handle, control_handle, signal_handle);

    handle_join("socket_server", socket_result)?;
    handle_join("control_signals", control_result)?;
    handle_join("signal_handler", signal_result)?;
    tracing::info!("daemon stopped");
    Ok(())
}

/// Bind the daemon socket, clearing a stale socket file left by a dead daemon.
pub fn bind_socket(socket: &Path) -> Result<UnixListener, DaemonError> {
    if let Some(parent) = socket.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }
    prepare_socket_for_bind(socket)?;

    let listener = UnixListener::bind(socket).map_err(|e| io_err(socket, e))?;
    set_socket_permissions(socket)?;
    Ok(listener)
}

/// Accept connections until a shutdown message arrives. Each connection is
/// served on its own task.
pub async fn serve(
    listener: UnixListener,
    engine: TimerEngine,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                tracing::info!("stopping accept loop");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let engine = engine.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_socket_client(stream, &engine).await {
                            tracing::error!(error = %err, "socket client error");
                        }
                    });
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
    Ok(())
}

async fn socket_server_task(
    listener: UnixListener,
    socket: PathBuf,
    engine: TimerEngine,
    shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let result = serve(listener, engine, shutdown_rx).await;
    match fs::remove_file(&socket) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(socket = %socket.display(), error = %err, "failed to remove socket"),
    }
    result
}

async fn handle_socket_client(stream: UnixStream, engine: &TimerEngine) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();

    let response = match tokio::time::timeout(REQUEST_TIMEOUT, read_request(reader)).await {
        Ok(request) => handler::handle_request(engine, request).await,
        Err(_) => Response::error("timed out waiting for request"),
    };

    write_response(&mut writer, &response).await?;
    writer
        .shutdown()
        .await
        .map_err(|e| io_err("daemon socket shutdown", e))
}

/// Read until the first JSON value is complete. A trailing newline is not
/// required, and bytes after the value are ignored.
async fn read_request(mut reader: OwnedReadHalf) -> Result<Request, DaemonError> {
    let mut bytes = Vec::new();
    let mut chunk = [0u8; 512];
    loop {
        let read = reader
            .read(&mut chunk)
            .await
            .map_err(|e| io_err("daemon socket read", e))?;
        bytes.extend_from_slice(&chunk[..read]);

        let oversized = bytes.len() > MAX_REQUEST_BYTES;
        let window = &bytes[..bytes.len().min(MAX_REQUEST_BYTES)];
        if let Some(request) = decode_first(window, read == 0 && !oversized)? {
            return Ok(request);
        }
        if oversized {
            return Err(DaemonError::Protocol(format!(
                "request exceeds {MAX_REQUEST_BYTES} bytes"
            )));
        }
        if read == 0 {
            return Err(ProtocolError::Empty.into());
        }
    }
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &Response,
) -> Result<(), DaemonError> {
    let payload = encode_line(response)?;
    writer
        .write_all(&payload)
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

struct ControlSignals {
    usr1: Signal,
    usr2: Signal,
    hangup: Signal,
}

impl ControlSignals {
    fn register() -> Result<Self, DaemonError> {
        Ok(Self {
            usr1: signal(SignalKind::user_defined1()).map_err(|e| io_err("SIGUSR1 handler", e))?,
            usr2: signal(SignalKind::user_defined2()).map_err(|e| io_err("SIGUSR2 handler", e))?,
            hangup: signal(SignalKind::hangup()).map_err(|e| io_err("SIGHUP handler", e))?,
        })
    }
}

struct TerminationSignals {
    sigterm: Signal,
    sigint: Signal,
}

impl TerminationSignals {
    fn register() -> Result<Self, DaemonError> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate()).map_err(|e| io_err("SIGTERM handler", e))?,
            sigint: signal(SignalKind::interrupt()).map_err(|e| io_err("SIGINT handler", e))?,
        })
    }
}

/// `SIGUSR1` adds 30 seconds, `SIGUSR2` adds 10 minutes, `SIGHUP` resets.
async fn control_signal_task(
    engine: TimerEngine,
    mut signals: ControlSignals,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            Some(()) = signals.usr1.recv() => {
                let status = engine.add_duration(SIGUSR1_ADD_SECS).await;
                tracing::info!(remaining = %format_clock(status.remaining_secs), "SIGUSR1: added {SIGUSR1_ADD_SECS} seconds");
            }
            Some(()) = signals.usr2.recv() => {
                let status = engine.add_minutes(SIGUSR2_ADD_MINUTES).await;
                tracing::info!(remaining = %format_clock(status.remaining_secs), "SIGUSR2: added {SIGUSR2_ADD_MINUTES} minutes");
            }
            Some(()) = signals.hangup.recv() => {
                engine.reset().await;
            }
        }
    }
    Ok(())
}

async fn termination_signal_task(
    mut signals: TerminationSignals,
    shutdown: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    tokio::select! {
        _ = shutdown_rx.recv() => {}
        _ = signals.sigterm.recv() => {
            tracing::info!("received SIGTERM, shutting down daemon");
            let _ = shutdown.send(());
        }
        _ = signals.sigint.recv() => {
            tracing::info!("received SIGINT, shutting down daemon");
            let _ = shutdown.send(());
        }
    }
    Ok(())
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::SocketInUse {
                socket: socket.to_path_buf(),
            });
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = std::env::var(LOG_FORMAT_ENV).ok();
    if json_logs_requested(format.as_deref()) {
        let _ = fmt().json().with_env_filter(filter).with_target(false).try_init();
    } else {
        let _ = fmt().with_env_filter(filter).with_target(false).try_init();
    }
}

fn json_logs_requested(format: Option<&str>) -> bool {
    format.is_some_and(|value| value.trim().eq_ignore_ascii_case("json"))
}

fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader as StdBufReader, Write};

    use pomidoras_core::protocol::decode_line;
    use pomidoras_core::TimerStatus;
    use tempfile::TempDir;

    use crate::notify::testing::RecordingNotifier;

    fn raw_exchange(socket: &Path, bytes: &[u8]) -> Response {
        let mut stream = StdUnixStream::connect(socket).expect("connect");
        stream.write_all(bytes).expect("write");
        let mut line = String::new();
        StdBufReader::new(stream)
            .read_line(&mut line)
            .expect("read response");
        decode_line(&line).expect("decode response")
    }

    #[test]
    fn stale_socket_is_removed_before_bind() {
        let dir = TempDir::new().expect("tempdir");
        let socket = dir.path().join("stale.sock");
        drop(std::os::unix::net::UnixListener::bind(&socket).expect("bind stale"));
        assert!(socket.exists(), "stale socket file should linger");

        prepare_socket_for_bind(&socket).expect("stale socket cleared");
        assert!(!socket.exists());
    }

    #[test]
    fn live_socket_refuses_second_bind() {
        let dir = TempDir::new().expect("tempdir");
        let socket = dir.path().join("live.sock");
        let _live = std::os::unix::net::UnixListener::bind(&socket).expect("bind live");

        let err = prepare_socket_for_bind(&socket).expect_err("live socket must be kept");
        assert!(matches!(err, DaemonError::SocketInUse { .. }));
        assert!(socket.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn oversized_and_non_utf8_requests_fail_softly() {
        let dir = TempDir::new().expect("tempdir");
        let socket = dir.path().join("limits.sock");
        let listener = bind_socket(&socket).expect("bind");
        let (notifier, _rx) = RecordingNotifier::channel();
        let engine = TimerEngine::start(0, notifier).await;
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let server = tokio::spawn(serve(listener, engine, shutdown_rx));

        let probe = socket.clone();
        let (oversized, binary, next) = tokio::task::spawn_blocking(move || {
            let mut big = br#"{"type":"add_duration","payload":""#.to_vec();
            big.extend(std::iter::repeat(b'1').take(MAX_REQUEST_BYTES));
            big.extend_from_slice(b"\"}\n");
            (
                raw_exchange(&probe, &big),
                raw_exchange(&probe, b"\xff\xfe\xfd\n"),
                raw_exchange(&probe, b"{\"type\":\"status\"}\n"),
            )
        })
        .await
        .expect("client thread");

        assert!(!oversized.success);
        assert!(oversized.message.unwrap_or_default().contains("exceeds"));
        assert!(!binary.success);
        assert!(binary.message.is_some_and(|m| !m.is_empty()));
        assert!(next.success);
        assert_eq!(next.status, Some(TimerStatus::idle()));

        shutdown_tx.send(()).expect("shutdown");
        server.await.expect("join").expect("serve");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn server_task_removes_socket_on_shutdown() {
        let dir = TempDir::new().expect("tempdir");
        let socket = dir.path().join("cleanup.sock");
        let listener = bind_socket(&socket).expect("bind");
        let (notifier, _rx) = RecordingNotifier::channel();
        let engine = TimerEngine::start(0, notifier).await;
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(socket_server_task(
            listener,
            socket.clone(),
            engine,
            shutdown_rx,
        ));
        shutdown_tx.send(()).expect("shutdown");
        task.await.expect("join").expect("server task");
        assert!(!socket.exists(), "socket should be removed on shutdown");
    }

    #[test]
    fn log_format_env_selects_json() {
        for value in ["json", "JSON", " json\n"] {
            assert!(json_logs_requested(Some(value)), "{value:?} should select json");
        }
        for value in [None, Some(""), Some("text"), Some("jsonl")] {
            assert!(!json_logs_requested(value), "{value:?} should keep text logs");
        }
    }

    #[test]
    fn bound_socket_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let dir = TempDir::new().expect("tempdir");
        let socket = dir.path().join("nested").join("perm.sock");
        let _listener = runtime
            .block_on(async { bind_socket(&socket) })
            .expect("bind");
        let mode = fs::metadata(&socket).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
