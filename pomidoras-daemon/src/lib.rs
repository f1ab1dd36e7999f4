//! Countdown daemon: timer engine, request dispatch, and Unix socket server.

pub mod client;
pub mod engine;
mod error;
pub mod handler;
pub mod notify;
pub mod paths;
mod runtime;

pub use client::send_request;
pub use engine::TimerEngine;
pub use error::DaemonError;
pub use notify::{DesktopNotifier, Notifier};
pub use runtime::{
    bind_socket, run, serve, start_blocking, DaemonConfig, SIGUSR1_ADD_SECS, SIGUSR2_ADD_MINUTES,
};
