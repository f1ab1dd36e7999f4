use std::path::PathBuf;

use thiserror::Error;

use pomidoras_core::ProtocolError;

/// Error surface for the timer daemon, its socket server, and the client.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Codec(#[from] ProtocolError),

    #[error("daemon protocol error: {0}")]
    Protocol(String),

    #[error("daemon is not running (socket missing: {socket})")]
    DaemonNotRunning { socket: PathBuf },

    #[error("daemon socket already in use: {socket}")]
    SocketInUse { socket: PathBuf },

    #[error("notification failed: {0}")]
    Notify(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
