//! Desktop notification sink fired when a countdown reaches zero.

use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::error::{io_err, DaemonError};

pub const NOTIFY_TITLE: &str = "Pomidoras";
pub const NOTIFY_MESSAGE: &str = "Time's up!";

/// Something that can show the user a short message.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, title: &str, message: &str) -> Result<(), DaemonError>;
}

/// Shells out to `notify-send` (or another program with the same arguments).
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: String,
}

impl DesktopNotifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("notify-send")
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), DaemonError> {
        let output = Command::new(&self.program)
            .arg(title)
            .arg(message)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| io_err(&self.program, e))?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(DaemonError::Notify(format!(
            "{} exited with {}: {}",
            self.program,
            output.status,
            stderr.trim()
        )))
    }
}

/// Fire-and-forget: runs the notifier on the blocking pool and logs failures.
pub(crate) fn dispatch(notifier: Arc<dyn Notifier>, title: &'static str, message: &'static str) {
    tokio::task::spawn_blocking(move || {
        if let Err(err) = notifier.notify(title, message) {
            tracing::warn!(error = %err, "desktop notification failed");
        }
    });
}
