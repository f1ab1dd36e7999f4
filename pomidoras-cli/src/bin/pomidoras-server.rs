//! pomidoras-server — runs the countdown daemon in the foreground.
//!
//! ```text
//! pomidoras-server [DURATION]   # e.g. 1500, 90s, 25m, 1h30m; default idle
//! ```
//!
//! Signals: SIGUSR1 adds 30 s, SIGUSR2 adds 10 min, SIGHUP resets,
//! SIGTERM/SIGINT shut down.

use anyhow::{Context, Result};
use clap::Parser;

use pomidoras_core::parse_duration_secs;
use pomidoras_daemon::{start_blocking, DaemonConfig};

#[derive(Parser, Debug)]
#[command(
    name = "pomidoras-server",
    version,
    about = "Background countdown timer controlled over a Unix socket",
    long_about = None,
)]
struct Args {
    /// Starting duration: whole seconds (`90`) or a duration string (`90s`, `25m`, `1h30m`).
    #[arg(value_name = "DURATION", value_parser = parse_initial_duration)]
    duration: Option<u64>,
}

fn parse_initial_duration(value: &str) -> Result<u64, String> {
    parse_duration_secs(value).map_err(|err| err.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = DaemonConfig::from_env(args.duration.unwrap_or(0));
    start_blocking(config).context("daemon exited with error")
}
