use anyhow::{bail, Context, Result};

use pomidoras_core::{RequestKind, Response};

/// Turn a daemon response into the line printed for the operator.
pub fn render(kind: RequestKind, response: &Response) -> Result<String> {
    if !response.success {
        bail!(
            "Server error: {}",
            response.message.as_deref().unwrap_or("unknown daemon error")
        );
    }

    match kind {
        RequestKind::Status => response
            .status
            .map(|status| status.render())
            .context("daemon status response carried no status"),
        RequestKind::AddDuration | RequestKind::Reset => {
            Ok(response.message.clone().unwrap_or_default())
        }
    }
}
