//! Timer-or-never beat scheduling for the session keeper.
//!
//! A [`BeatScheduler`] is either disabled, in which case
//! [`wait_for_beat`](BeatScheduler::wait_for_beat) never resolves, or armed
//! with a period, in which case it fires once per period. Because the
//! disabled wait simply pends, the same `tokio::select!` arm stays valid in
//! every state and callers never special-case "no timer".
//!
//! The keeper owns two of these: a probe pacer that is armed for as long as
//! the keeper runs, and a heartbeat that is armed only while a session is
//! live. Both are re-armed in place whenever the portal dictates a new
//! cadence.

use std::time::Duration;

use tokio::time::Instant as TokioInstant;
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// BeatInfo
// ---------------------------------------------------------------------------

/// Snapshot describing one beat, returned by
/// [`wait_for_beat`](BeatScheduler::wait_for_beat).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatInfo {
    /// Monotonic ordinal of this beat, starting at 1 and counting across
    /// re-arms.
    pub beat: u64,
    /// Period the scheduler was armed with when this beat fired.
    pub period: Duration,
    /// How far past the deadline the wake actually happened.
    pub late_by: Duration,
}

// ---------------------------------------------------------------------------
// BeatScheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum BeatState {
    /// No deadline; the wait future pends forever.
    Disabled,
    /// Next beat due at `next`, repeating every `period`.
    Armed { period: Duration, next: TokioInstant },
}

/// A repeating timer that can be switched off without leaving the select
/// loop.
///
/// `rearm` replaces whatever cadence was in effect and schedules the next
/// beat a full period from now. `disarm` clears the deadline entirely. A
/// period too large to turn into a deadline (`Duration::MAX` is the "never
/// retry" normalization) behaves exactly like `disarm`.
#[derive(Debug)]
pub struct BeatScheduler {
    label: &'static str,
    state: BeatState,
    beat_count: u64,
}

impl BeatScheduler {
    /// Creates a scheduler with no deadline. `label` names it in logs.
    pub fn disabled(label: &'static str) -> Self {
        Self {
            label,
            state: BeatState::Disabled,
            beat_count: 0,
        }
    }

    /// Creates a scheduler already armed with `period`.
    pub fn armed(label: &'static str, period: Duration) -> Self {
        let mut scheduler = Self::disabled(label);
        scheduler.rearm(period);
        scheduler
    }

    /// Schedules the next beat at `now + period`, repeating every `period`
    /// thereafter.
    ///
    /// A zero period would spin the loop, so it disarms instead, as does a
    /// period too large to schedule.
    pub fn rearm(&mut self, period: Duration) {
        if period.is_zero() {
            warn!(label = self.label, "zero beat period requested, disarming");
            self.state = BeatState::Disabled;
            return;
        }
        match TokioInstant::now().checked_add(period) {
            Some(next) => {
                trace!(
                    label = self.label,
                    period_ms = period.as_millis() as u64,
                    "beat scheduler armed"
                );
                self.state = BeatState::Armed { period, next };
            }
            None => {
                debug!(
                    label = self.label,
                    "beat period exceeds the schedulable range, disarming"
                );
                self.state = BeatState::Disabled;
            }
        }
    }

    /// Convenience for portal-advertised intervals, which arrive in seconds.
    pub fn rearm_secs(&mut self, secs: u64) {
        self.rearm(Duration::from_secs(secs));
    }

    /// Clears the deadline; the wait future pends until the next `rearm`.
    pub fn disarm(&mut self) {
        if self.is_armed() {
            debug!(label = self.label, "beat scheduler disarmed");
        }
        self.state = BeatState::Disabled;
    }

    /// Resolves at the next beat, or never while the scheduler is disabled.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the
    /// deadline in place, so a `tokio::select!` that takes another arm does
    /// not lose the beat. After firing, the next beat is scheduled from the
    /// wake time rather than the missed deadline, so a slow handler or a
    /// suspended host produces one late beat, not a burst of catch-up beats.
    pub async fn wait_for_beat(&mut self) -> BeatInfo {
        let (period, next) = match self.state {
            BeatState::Disabled => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved");
            }
            BeatState::Armed { period, next } => (period, next),
        };

        tokio::time::sleep_until(next).await;

        let now = TokioInstant::now();
        let late_by = now.saturating_duration_since(next);
        self.beat_count += 1;

        self.state = match now.checked_add(period) {
            Some(next) => BeatState::Armed { period, next },
            None => {
                debug!(
                    label = self.label,
                    "beat period exceeds the schedulable range, disarming"
                );
                BeatState::Disabled
            }
        };

        if late_by >= period {
            warn!(
                label = self.label,
                beat = self.beat_count,
                late_ms = late_by.as_millis() as u64,
                "beat overdue, rescheduling from now"
            );
        } else {
            trace!(label = self.label, beat = self.beat_count, "beat");
        }

        BeatInfo {
            beat: self.beat_count,
            period,
            late_by,
        }
    }

    /// True while a deadline is scheduled.
    pub fn is_armed(&self) -> bool {
        matches!(self.state, BeatState::Armed { .. })
    }

    /// Period currently in effect, or `None` while disabled.
    pub fn period(&self) -> Option<Duration> {
        match self.state {
            BeatState::Disabled => None,
            BeatState::Armed { period, .. } => Some(period),
        }
    }

    /// Total beats fired since creation, across re-arms.
    pub fn beat_count(&self) -> u64 {
        self.beat_count
    }
}
