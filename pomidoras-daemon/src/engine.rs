//! Countdown state machine shared by every connection handler.
//!
//! State lives behind one `RwLock`; every mutation is a single
//! read-modify-write under the write guard. At most one tick loop advances
//! the countdown: each loop is tagged with the generation current when it
//! was spawned and exits without touching state once the generation moves on.

use std::sync::{Arc, Weak};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use pomidoras_core::{format_clock, Phase, TimerStatus};

use crate::notify::{self, Notifier, NOTIFY_MESSAGE, NOTIFY_TITLE};
use crate::paths::TICK_PERIOD;

/// Cheap-to-clone handle to the daemon's single countdown.
#[derive(Clone)]
pub struct TimerEngine {
    shared: Arc<Shared>,
}

struct Shared {
    initial_secs: u64,
    state: RwLock<TimerState>,
    notifier: Arc<dyn Notifier>,
}

#[derive(Debug)]
struct TimerState {
    remaining_secs: u64,
    phase: Phase,
    generation: u64,
    ticker: Option<JoinHandle<()>>,
}

impl TimerState {
    fn snapshot(&self) -> TimerStatus {
        TimerStatus {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
        }
    }

    /// Invalidate the active tick loop, if any, and go idle.
    fn stop_ticker(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        self.phase = Phase::Idle;
    }

    fn start_ticker(&mut self, shared: &Arc<Shared>) {
        self.stop_ticker();
        let generation = self.generation;
        self.phase = Phase::Counting;
        self.ticker = Some(tokio::spawn(tick_loop(Arc::downgrade(shared), generation)));
    }
}

impl TimerEngine {
    /// Create the countdown and, if `initial_secs > 0`, start ticking.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(initial_secs: u64, notifier: Arc<dyn Notifier>) -> Self {
        let engine = Self {
            shared: Arc::new(Shared {
                initial_secs,
                state: RwLock::new(TimerState {
                    remaining_secs: initial_secs,
                    phase: Phase::Idle,
                    generation: 0,
                    ticker: None,
                }),
                notifier,
            }),
        };

        if initial_secs > 0 {
            let mut state = engine.shared.state.write().await;
            state.start_ticker(&engine.shared);
        }
        tracing::info!(initial = %format_clock(initial_secs), "timer started");
        engine
    }

    pub fn initial_secs(&self) -> u64 {
        self.shared.initial_secs
    }

    pub async fn snapshot(&self) -> TimerStatus {
        self.shared.state.read().await.snapshot()
    }

    /// Add a signed number of seconds. The result is clamped at zero; hitting
    /// zero stops the countdown, leaving idle with a positive value starts it.
    pub async fn add_duration(&self, delta_secs: i64) -> TimerStatus {
        let mut state = self.shared.state.write().await;
        let updated = (i128::from(state.remaining_secs) + i128::from(delta_secs))
            .clamp(0, i128::from(u64::MAX)) as u64;
        state.remaining_secs = updated;

        match state.phase {
            Phase::Counting if updated == 0 => {
                state.stop_ticker();
                tracing::info!(delta = delta_secs, "countdown clamped to zero");
            }
            Phase::Idle if updated > 0 => {
                state.start_ticker(&self.shared);
                tracing::info!(
                    delta = delta_secs,
                    remaining = %format_clock(updated),
                    "countdown started"
                );
            }
            _ => {
                tracing::info!(
                    delta = delta_secs,
                    remaining = %format_clock(updated),
                    "countdown adjusted"
                );
            }
        }
        state.snapshot()
    }

    pub async fn add_minutes(&self, minutes: i64) -> TimerStatus {
        self.add_duration(minutes.saturating_mul(60)).await
    }

    /// Restore the initial duration, restarting the countdown when it is positive.
    pub async fn reset(&self) -> TimerStatus {
        let mut state = self.shared.state.write().await;
        state.stop_ticker();
        state.remaining_secs = self.shared.initial_secs;
        if self.shared.initial_secs > 0 {
            state.start_ticker(&self.shared);
        }
        tracing::info!(phase = %state.phase, remaining = %format_clock(state.remaining_secs), "timer reset");
        state.snapshot()
    }
}

async fn tick_loop(shared: Weak<Shared>, generation: u64) {
    let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let Some(shared) = shared.upgrade() else {
            return;
        };

        let finished = {
            let mut state = shared.state.write().await;
            if state.generation != generation {
                return;
            }
            state.remaining_secs = state.remaining_secs.saturating_sub(1);
            if state.remaining_secs > 0 {
                tracing::debug!(remaining = %format_clock(state.remaining_secs), "tick");
                false
            } else {
                // Our own handle; dropping it detaches rather than aborts.
                state.ticker = None;
                state.phase = Phase::Idle;
                true
            }
        };

        if finished {
            tracing::info!("countdown finished");
            notify::dispatch(Arc::clone(&shared.notifier), NOTIFY_TITLE, NOTIFY_MESSAGE);
            return;
        }
    }
}
