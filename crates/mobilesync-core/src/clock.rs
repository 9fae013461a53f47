//! Boundary arithmetic and time sources for the resync clock.
//!
//! A *boundary* is an epoch second `t` with `t mod period == 0`. Every
//! process (and every device) that knows the period agrees on the same
//! boundaries without talking to each other, which is what keeps the wall
//! in lock-step.
//!
//! # Design Principles
//!
//! - Everything here is a pure function of `(now, period)`. The clock loop
//!   in [`crate::sync`] recomputes from the current reading each time and
//!   never keeps a running counter, so a late wake-up cannot accumulate
//!   drift.
//! - An exact boundary waits a full period: [`seconds_until_boundary`]
//!   always returns a value in `1..=period`, and the next boundary is
//!   strictly in the future.
//! - Epoch seconds use Euclidean remainder so instants before 1970 still
//!   land on the correct boundary.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Remaining seconds at or below which every second is announced.
pub const FINAL_COUNTDOWN_SECS: u64 = 3;

/// Above [`FINAL_COUNTDOWN_SECS`], announce only multiples of this.
pub const STATUS_INTERVAL_SECS: u64 = 10;

/// A validated resync period of at least one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    secs: i64,
}

impl Period {
    /// Build a period, or `None` if `secs` is below 1.
    pub const fn from_secs(secs: i64) -> Option<Self> {
        if secs < 1 {
            None
        } else {
            Some(Self { secs })
        }
    }

    /// Length in seconds.
    pub const fn as_secs(self) -> u64 {
        self.secs.unsigned_abs()
    }

    /// Length in seconds, signed for epoch arithmetic.
    pub const fn as_secs_i64(self) -> i64 {
        self.secs
    }

    /// Length as a [`Duration`].
    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.as_secs())
    }
}

/// Seconds from `now` until the next boundary: `period - (now mod period)`.
///
/// Always in `1..=period`. When `now` is itself a boundary the result is a
/// full period.
pub const fn seconds_until_boundary(now: i64, period: Period) -> u64 {
    let offset = now.rem_euclid(period.secs);
    period.secs.saturating_sub(offset).unsigned_abs()
}

/// The first boundary strictly after `now`.
pub const fn next_boundary(now: i64, period: Period) -> i64 {
    previous_boundary(now, period).saturating_add(period.secs)
}

/// The last boundary at or before `now`.
pub const fn previous_boundary(now: i64, period: Period) -> i64 {
    now.saturating_sub(now.rem_euclid(period.secs))
}

/// Wall-clock time from `now` until epoch second `epoch_secs`.
///
/// Keeps sub-second precision so the loop wakes on the boundary itself, not
/// on `now`'s fractional offset. Returns zero for instants in the past.
pub fn duration_until(now: DateTime<Utc>, epoch_secs: i64) -> Duration {
    DateTime::from_timestamp(epoch_secs, 0)
        .and_then(|target| target.signed_duration_since(now).to_std().ok())
        .unwrap_or(Duration::ZERO)
}

/// How loudly a countdown second is announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownLevel {
    /// Periodic status line (every ten seconds).
    Status,
    /// One of the last few seconds before a resync.
    Final,
}

/// Which remaining seconds get a countdown line.
///
/// Every second at or below [`FINAL_COUNTDOWN_SECS`], and every multiple of
/// [`STATUS_INTERVAL_SECS`] above it. Zero is never announced; that moment
/// is the resync itself.
pub fn countdown_level(remaining: u64) -> Option<CountdownLevel> {
    if remaining == 0 {
        None
    } else if remaining <= FINAL_COUNTDOWN_SECS {
        Some(CountdownLevel::Final)
    } else if remaining.checked_rem(STATUS_INTERVAL_SECS) == Some(0) {
        Some(CountdownLevel::Status)
    } else {
        None
    }
}

/// Point-in-time view of the schedule, served to clients that want to
/// check their own countdown against the server's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// Epoch second the status was computed at.
    pub now: i64,
    /// Resync period in seconds.
    pub period: u64,
    /// Seconds until [`next_boundary`](Self::next_boundary).
    pub seconds_until_next: u64,
    /// The upcoming boundary.
    pub next_boundary: i64,
    /// The most recent boundary at or before `now`.
    pub previous_boundary: i64,
}

impl SyncStatus {
    /// Compute the status at epoch second `now`.
    pub const fn at(now: i64, period: Period) -> Self {
        Self {
            now,
            period: period.as_secs(),
            seconds_until_next: seconds_until_boundary(now, period),
            next_boundary: next_boundary(now, period),
            previous_boundary: previous_boundary(now, period),
        }
    }
}

/// Source of wall-clock time.
///
/// The clock loop and the sync-status endpoint read time only through this
/// trait so tests can run against a controlled clock.
pub trait TimeSource: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Current time in whole epoch seconds.
    fn epoch_seconds(&self) -> i64 {
        self.now().timestamp()
    }
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    at: DateTime<Utc>,
}

impl FixedTimeSource {
    /// Freeze at the given instant.
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }

    /// Freeze at a whole epoch second. `None` if out of chrono's range.
    pub fn at_epoch(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self::new)
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}

/// Wall clock driven by the tokio clock.
///
/// Reports `base + elapsed`, where `elapsed` is measured with
/// [`tokio::time::Instant`]. Under a paused runtime
/// (`#[tokio::test(start_paused = true)]`) wall time then advances exactly
/// as far as the sleeps in the code under test.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct ManualTimeSource {
    base: DateTime<Utc>,
    anchor: tokio::time::Instant,
}

#[cfg(test)]
impl ManualTimeSource {
    /// Start at `base`, anchored to the current tokio instant.
    pub fn starting_at(base: DateTime<Utc>) -> Self {
        Self {
            base,
            anchor: tokio::time::Instant::now(),
        }
    }

    /// Start at a whole epoch second. `None` if out of chrono's range.
    pub fn at_epoch(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self::starting_at)
    }
}

#[cfg(test)]
impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        chrono::TimeDelta::from_std(self.anchor.elapsed())
            .ok()
            .and_then(|elapsed| self.base.checked_add_signed(elapsed))
            .unwrap_or(self.base)
    }
}
