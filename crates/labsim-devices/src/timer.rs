//! Lab timer
//!
//! Elapsed time is `banked + (now - resumed_at)` while running and `banked`
//! while paused, never a sum of tick deltas:
//! - resume: `resumed_at = now`
//! - pause: `banked += now - resumed_at`, resume point dropped
//!
//! A countdown clamps at zero and latches EXPIRED; a countup is uncapped.
//! Dropped ticks cannot skew the reading because nothing accumulates.

use std::time::Duration;

use labsim_core::{LabTime, TimerMode};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerPhase {
    /// Never started or reset
    Idle,
    Running,
    Paused,
    /// Countdown reached zero
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerCommand {
    Pause,
    Resume,
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimerDisplay {
    pub phase: TimerPhase,
    pub mode: TimerMode,
    pub elapsed_secs: f64,
    /// Countdown remaining; equals the configured duration for a countup
    pub remaining_secs: f64,
    /// Value on the face: remaining for countdown, elapsed for countup
    pub shown_secs: f64,
    /// Countdown progress in [0, 1]
    pub progress: f64,
    pub is_running: bool,
    pub is_expired: bool,
}

/// Anchor-based stopwatch
#[derive(Clone, Debug, Default)]
pub struct TimerSimulator {
    /// Start of the current running span
    resumed_at: Option<LabTime>,
    /// Elapsed time of all closed spans
    banked: Duration,
    expired: bool,
    started: bool,
}

fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

impl TimerSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.resumed_at.is_some()
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn elapsed(&self, now: LabTime) -> Duration {
        match self.resumed_at {
            Some(resumed_at) => self.banked + now.since(resumed_at),
            None => self.banked,
        }
    }

    pub fn remaining(&self, now: LabTime, duration_secs: f64) -> Duration {
        secs_to_duration(duration_secs).saturating_sub(self.elapsed(now))
    }

    pub fn resume(&mut self, now: LabTime) {
        if self.resumed_at.is_some() || self.expired {
            return;
        }
        self.resumed_at = Some(now);
        self.started = true;
        debug!(?now, banked = ?self.banked, "timer resumed");
    }

    pub fn pause(&mut self, now: LabTime) {
        if let Some(resumed_at) = self.resumed_at.take() {
            self.banked += now.since(resumed_at);
            debug!(?now, banked = ?self.banked, "timer paused");
        }
    }

    /// Stop and clear elapsed time and the expired latch
    pub fn reset(&mut self) {
        *self = TimerSimulator::default();
    }

    /// Set the elapsed time outright, keeping the run state
    fn set_elapsed(&mut self, now: LabTime, elapsed: Duration) {
        self.banked = elapsed;
        self.expired = false;
        if self.resumed_at.is_some() {
            self.resumed_at = Some(now);
        }
        self.started = self.started || !elapsed.is_zero();
    }

    /// Place the timer so that `remaining_secs` are left on a countdown of
    /// `duration_secs`, or `remaining_secs` have elapsed on a countup
    pub fn seek(&mut self, now: LabTime, mode: TimerMode, duration_secs: f64, remaining_secs: f64) {
        let elapsed = match mode {
            TimerMode::Countdown => {
                secs_to_duration(duration_secs).saturating_sub(secs_to_duration(remaining_secs))
            }
            TimerMode::Countup => secs_to_duration(remaining_secs),
        };
        self.set_elapsed(now, elapsed);
    }

    /// New dial value: a countdown shows the full duration again and a
    /// countup starts from zero
    pub fn reload(&mut self, now: LabTime) {
        self.set_elapsed(now, Duration::ZERO);
    }

    pub fn apply(&mut self, command: TimerCommand, now: LabTime) {
        match command {
            TimerCommand::Pause => self.pause(now),
            TimerCommand::Resume => self.resume(now),
            TimerCommand::Reset => self.reset(),
        }
    }

    /// Latch expiry for a countdown that reached zero
    pub fn tick(&mut self, now: LabTime, mode: TimerMode, duration_secs: f64) {
        if mode == TimerMode::Countdown
            && self.is_running()
            && self.remaining(now, duration_secs).is_zero()
        {
            self.banked = secs_to_duration(duration_secs);
            self.resumed_at = None;
            self.expired = true;
            info!(?now, "timer expired");
        }
    }

    pub fn phase(&self) -> TimerPhase {
        if self.expired {
            TimerPhase::Expired
        } else if self.resumed_at.is_some() {
            TimerPhase::Running
        } else if self.started {
            TimerPhase::Paused
        } else {
            TimerPhase::Idle
        }
    }

    pub fn snapshot(&self, now: LabTime, mode: TimerMode, duration_secs: f64) -> TimerDisplay {
        let duration = secs_to_duration(duration_secs);
        let elapsed = self.elapsed(now);
        let remaining = duration.saturating_sub(elapsed);
        let is_expired =
            self.expired || (mode == TimerMode::Countdown && self.is_running() && remaining.is_zero());

        let progress = if duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
        };

        TimerDisplay {
            phase: if is_expired {
                TimerPhase::Expired
            } else {
                self.phase()
            },
            mode,
            elapsed_secs: elapsed.as_secs_f64(),
            remaining_secs: remaining.as_secs_f64(),
            shown_secs: match mode {
                TimerMode::Countdown => remaining.as_secs_f64(),
                TimerMode::Countup => elapsed.as_secs_f64(),
            },
            progress,
            is_running: self.is_running() && !is_expired,
            is_expired,
        }
    }
}
