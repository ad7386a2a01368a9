//! Phase timers
//!
//! Fixed-delay transitions (calibration windows, lid motion, settling) are
//! evaluated against the clock on each tick instead of sleeping.

use std::time::Duration;

use labsim_core::LabTime;

/// A fixed-length window started at some instant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseTimer {
    started: LabTime,
    duration: Duration,
}

impl PhaseTimer {
    pub fn start(now: LabTime, duration: Duration) -> Self {
        PhaseTimer {
            started: now,
            duration,
        }
    }

    #[inline]
    pub fn started_at(&self) -> LabTime {
        self.started
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn deadline(&self) -> LabTime {
        self.started + self.duration
    }

    pub fn elapsed(&self, now: LabTime) -> Duration {
        now.since(self.started)
    }

    pub fn remaining(&self, now: LabTime) -> Duration {
        self.duration.saturating_sub(self.elapsed(now))
    }

    #[inline]
    pub fn is_done(&self, now: LabTime) -> bool {
        self.elapsed(now) >= self.duration
    }

    /// Fraction of the window elapsed, in [0, 1]
    pub fn progress(&self, now: LabTime) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed(now).as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

/// A state machine phase paired with the timer of the window it entered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Phased<P> {
    phase: P,
    timer: PhaseTimer,
}

impl<P: Copy + PartialEq> Phased<P> {
    pub fn new(phase: P, now: LabTime, duration: Duration) -> Self {
        Phased {
            phase,
            timer: PhaseTimer::start(now, duration),
        }
    }

    #[inline]
    pub fn phase(&self) -> P {
        self.phase
    }

    #[inline]
    pub fn timer(&self) -> &PhaseTimer {
        &self.timer
    }

    #[inline]
    pub fn is(&self, phase: P) -> bool {
        self.phase == phase
    }

    /// Enter `phase` at `now` with a fresh window
    pub fn enter(&mut self, phase: P, now: LabTime, duration: Duration) {
        self.phase = phase;
        self.timer = PhaseTimer::start(now, duration);
    }

    /// Move to `next` once the current window has elapsed. Returns whether
    /// the transition happened.
    pub fn advance_when_done(&mut self, now: LabTime, next: P, next_duration: Duration) -> bool {
        if self.timer.is_done(now) {
            self.enter(next, now, next_duration);
            true
        } else {
            false
        }
    }
}
