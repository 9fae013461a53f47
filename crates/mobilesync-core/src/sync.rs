//! Background resync loop with pluggable event sinks.
//!
//! [`SyncClock::run`] counts down to each boundary and emits a
//! [`SyncEvent::Resync`] when it is reached, forever, until the shutdown
//! signal flips to `true`. The loop keeps no virtual time of its own: every
//! second it re-reads the wall clock through its [`TimeSource`], so a late
//! wake-up, a suspended laptop or a stepped clock is corrected at the very
//! next iteration instead of accumulating.
//!
//! Side effects go through a [`SyncSink`]. [`TracingSink`] writes the
//! familiar `resync in 20s` / `resyncing now` lines; tests plug in a
//! recording sink instead.
//!
//! # Lifecycle
//!
//! - `Inactive`: image content. [`start_for_session`] returns `None` and no
//!   task is spawned.
//! - `Running`: the loop, re-entering itself on every boundary. It leaves
//!   only through the shutdown channel, at its next wake point.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::{self, CountdownLevel, Period, TimeSource};
use crate::session::SessionConfig;

/// Something observable the clock did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// The startup delay is over and the first boundary is known.
    Started {
        /// Resync period in seconds.
        period: u64,
        /// The boundary the clock is counting down to.
        first_boundary: i64,
    },
    /// An announced second of the countdown.
    Countdown {
        /// Whole seconds left until `boundary`.
        remaining: u64,
        /// The boundary being counted down to.
        boundary: i64,
        /// Announcement cadence this second falls under.
        level: CountdownLevel,
    },
    /// A boundary was reached; devices should reload now.
    Resync {
        /// The boundary that was reached.
        boundary: i64,
    },
    /// The loop observed the shutdown signal and exited.
    Stopped {
        /// Resync events emitted over the clock's lifetime.
        resyncs: u64,
    },
}

/// Receiver of clock events.
///
/// Called inline from the clock loop; implementations must not block.
pub trait SyncSink: Send {
    /// Called for every event, in order.
    fn on_event(&mut self, event: &SyncEvent);
}

/// Writes every event as a `tracing` line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl SyncSink for TracingSink {
    fn on_event(&mut self, event: &SyncEvent) {
        match *event {
            SyncEvent::Started {
                period,
                first_boundary,
            } => info!(period, first_boundary, "resync clock running"),
            SyncEvent::Countdown {
                remaining,
                boundary,
                level,
            } => info!(remaining, boundary, level = ?level, "resync in {remaining}s"),
            SyncEvent::Resync { boundary } => info!(boundary, "resyncing now"),
            SyncEvent::Stopped { resyncs } => info!(resyncs, "resync clock stopped"),
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl SyncSink for NoOpSink {
    fn on_event(&mut self, _event: &SyncEvent) {}
}

/// Summary returned when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Number of resync events emitted.
    pub resyncs: u64,
    /// The most recently announced boundary, if any.
    pub last_boundary: Option<i64>,
}

/// Everything the loop remembers between boundaries.
#[derive(Debug, Default)]
struct ClockState {
    /// Epoch second of the most recently announced resync.
    current_boundary: Option<i64>,
    resyncs: u64,
}

impl ClockState {
    const fn record(&mut self, boundary: i64) {
        self.current_boundary = Some(boundary);
        self.resyncs = self.resyncs.saturating_add(1);
    }

    fn stop(&self, sink: &mut dyn SyncSink) -> SyncReport {
        sink.on_event(&SyncEvent::Stopped {
            resyncs: self.resyncs,
        });
        SyncReport {
            resyncs: self.resyncs,
            last_boundary: self.current_boundary,
        }
    }
}

/// Why a sleep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Elapsed,
    Shutdown,
}

/// The resync clock.
pub struct SyncClock {
    period: Period,
    startup_delay: Duration,
    time: Arc<dyn TimeSource>,
}

impl SyncClock {
    /// Create a clock. Nothing runs until [`start`](Self::start) or
    /// [`run`](Self::run).
    ///
    /// `startup_delay` is waited out before the first boundary is computed;
    /// it never shifts the boundaries themselves.
    pub fn new(period: Period, startup_delay: Duration, time: Arc<dyn TimeSource>) -> Self {
        Self {
            period,
            startup_delay,
            time,
        }
    }

    /// Spawn the loop on the current tokio runtime and return immediately.
    pub fn start<S>(self, mut sink: S, shutdown: watch::Receiver<bool>) -> JoinHandle<SyncReport>
    where
        S: SyncSink + 'static,
    {
        tokio::spawn(async move { self.run(&mut sink, shutdown).await })
    }

    /// Run the loop on the current task until `shutdown` becomes `true`.
    ///
    /// If the sender is dropped without ever sending `true`, the loop runs
    /// for the rest of the process.
    pub async fn run(
        &self,
        sink: &mut dyn SyncSink,
        mut shutdown: watch::Receiver<bool>,
    ) -> SyncReport {
        let mut state = ClockState::default();

        if !self.startup_delay.is_zero() {
            debug!(
                delay_ms = self.startup_delay.as_millis(),
                "waiting before first boundary computation"
            );
            if sleep_or_shutdown(self.startup_delay, &mut shutdown).await == Wake::Shutdown {
                return state.stop(sink);
            }
        }

        let mut started = false;
        loop {
            let boundary = self.upcoming_boundary(&state);
            if !started {
                sink.on_event(&SyncEvent::Started {
                    period: self.period.as_secs(),
                    first_boundary: boundary,
                });
                started = true;
            }

            let Some(boundary) = self.count_down(boundary, &state, sink, &mut shutdown).await
            else {
                return state.stop(sink);
            };

            state.record(boundary);
            sink.on_event(&SyncEvent::Resync { boundary });
        }
    }

    /// Next boundary from the current wall-clock reading.
    fn upcoming_boundary(&self, state: &ClockState) -> i64 {
        let boundary = clock::next_boundary(self.time.epoch_seconds(), self.period);
        // A clock stepped backwards can land on the boundary just announced.
        if state.current_boundary == Some(boundary) {
            boundary.saturating_add(self.period.as_secs_i64())
        } else {
            boundary
        }
    }

    /// Sleep second by second until the wall clock reaches the boundary
    /// and return the boundary reached, or `None` on shutdown.
    ///
    /// Remaining time is re-read on every wake. A wall clock stepped back
    /// by more than a period re-aligns to the nearest boundary ahead, so
    /// `remaining` never exceeds the period for long.
    async fn count_down(
        &self,
        mut boundary: i64,
        state: &ClockState,
        sink: &mut dyn SyncSink,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<i64> {
        let mut last_seen = u64::MAX;
        loop {
            let now = self.time.now();
            let now_secs = now.timestamp();
            if now_secs >= boundary {
                return Some(boundary);
            }

            if boundary.saturating_sub(now_secs) > self.period.as_secs_i64() {
                let realigned = self.upcoming_boundary(state);
                if realigned != boundary {
                    debug!(
                        from = boundary,
                        to = realigned,
                        "wall clock stepped back, re-aligning"
                    );
                    boundary = realigned;
                    last_seen = u64::MAX;
                }
            }

            let remaining = boundary.saturating_sub(now_secs).unsigned_abs();
            if remaining < last_seen {
                last_seen = remaining;
                if let Some(level) = clock::countdown_level(remaining) {
                    sink.on_event(&SyncEvent::Countdown {
                        remaining,
                        boundary,
                        level,
                    });
                }
            }

            let next_second = clock::duration_until(now, now_secs.saturating_add(1));
            if sleep_or_shutdown(next_second, shutdown).await == Wake::Shutdown {
                return None;
            }
        }
    }
}

/// Sleep for `duration` unless the shutdown flag is (or becomes) `true`.
async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> Wake {
    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);

    loop {
        if *shutdown.borrow_and_update() {
            return Wake::Shutdown;
        }
        tokio::select! {
            () = &mut sleep => return Wake::Elapsed,
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Sender dropped: nobody can stop us any more.
                    (&mut sleep).await;
                    return Wake::Elapsed;
                }
            }
        }
    }
}

/// Start the clock if the session's content needs it.
///
/// Returns `None` for image content: no task is spawned and nothing is
/// ever logged by the clock. Otherwise spawns the loop with the session's
/// period and returns its handle.
pub fn start_for_session<S>(
    session: &SessionConfig,
    startup_delay: Duration,
    time: Arc<dyn TimeSource>,
    sink: S,
    shutdown: watch::Receiver<bool>,
) -> Option<JoinHandle<SyncReport>>
where
    S: SyncSink + 'static,
{
    let mode = session.content_mode();
    if !mode.needs_resync() {
        info!(content_mode = %mode, "resync clock inactive");
        return None;
    }

    info!(
        content_mode = %mode,
        period = session.period().as_secs(),
        startup_delay_ms = startup_delay.as_millis(),
        "starting resync clock"
    );
    Some(SyncClock::new(session.period(), startup_delay, time).start(sink, shutdown))
}
