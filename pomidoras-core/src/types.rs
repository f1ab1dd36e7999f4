//! Domain types for the countdown timer.
//!
//! Durations are carried as whole seconds; a second is the timer's base unit.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Coarse mode of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Not counting: either nothing remains or no tick loop is running.
    #[default]
    Idle,
    /// A tick loop is active and `remaining > 0`.
    Counting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Counting => write!(f, "counting"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// An atomically observed `(phase, remaining)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimerStatus {
    pub phase: Phase,
    pub remaining_secs: u64,
}

impl TimerStatus {
    pub fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            remaining_secs: 0,
        }
    }

    pub fn counting(remaining_secs: u64) -> Self {
        Self {
            phase: Phase::Counting,
            remaining_secs,
        }
    }

    /// Human rendering used by the client: `MM:SS` while counting, `Idle` otherwise.
    pub fn render(&self) -> String {
        match self.phase {
            Phase::Counting => format_clock(self.remaining_secs),
            Phase::Idle => "Idle".to_string(),
        }
    }
}

/// Format seconds as zero-padded `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
