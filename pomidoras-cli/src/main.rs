//! pomidorasctl — control client for the pomidoras countdown daemon.
//!
//! # Usage
//!
//! ```text
//! pomidorasctl            # print remaining time (MM:SS) or "Idle"
//! pomidorasctl -a <secs>  # add (or with a negative value, remove) seconds
//! pomidorasctl -r         # reset to the daemon's starting duration
//! ```

mod render;

use anyhow::{Context, Result};
use clap::Parser;

use pomidoras_core::Request;
use pomidoras_daemon::paths::socket_path;
use pomidoras_daemon::send_request;

#[derive(Parser, Debug)]
#[command(
    name = "pomidorasctl",
    version,
    about = "Query and adjust the pomidoras countdown daemon",
    long_about = None,
)]
struct Cli {
    /// Add this many seconds; negative values subtract.
    #[arg(
        short = 'a',
        value_name = "SECONDS",
        allow_negative_numbers = true,
        conflicts_with = "reset"
    )]
    add: Option<i64>,

    /// Reset the countdown to its starting duration.
    #[arg(short = 'r')]
    reset: bool,
}

impl Cli {
    fn request(&self) -> Request {
        match (self.add, self.reset) {
            (Some(seconds), _) => Request::add_seconds(seconds),
            (None, true) => Request::reset(),
            (None, false) => Request::status(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let request = cli.request();
    let socket = socket_path();

    let response = send_request(&socket, &request)
        .with_context(|| format!("failed to talk to daemon at {}", socket.display()))?;
    println!("{}", render::render(request.kind, &response)?);
    Ok(())
}
