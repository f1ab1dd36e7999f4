use std::path::PathBuf;
use std::time::Duration;

/// Well-known socket path shared by the daemon and `pomidorasctl`.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/pomidoras.sock";

/// Environment override for [`DEFAULT_SOCKET_PATH`].
pub const SOCKET_ENV: &str = "POMIDORAS_SOCKET";

/// Set to `json` to emit daemon logs as JSON lines.
pub const LOG_FORMAT_ENV: &str = "POMIDORAS_LOG_FORMAT";

/// One base unit of countdown: each tick removes one second.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_REQUEST_BYTES: usize = 4 * 1024;

/// How long in-flight connections may run after the accept loop stops.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

pub fn socket_path() -> PathBuf {
    std::env::var_os(SOCKET_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET_PATH))
}
