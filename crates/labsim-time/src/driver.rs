//! Tick driver - the single source of simulation ticks
//!
//! The host calls [`TickDriver::poll`] as often as it likes (frame callback,
//! timer thread). The driver hands out at most one tick per interval and
//! none while the host is hidden. A long gap yields one tick carrying the
//! whole gap as `dt`; missed intervals are never replayed.

use std::time::Duration;

use labsim_core::LabTime;
use tracing::debug;

/// Lower bound on the tick interval (one 60 Hz frame)
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Tick driver configuration
#[derive(Clone, Debug, PartialEq)]
pub struct TickConfig {
    /// Target interval between ticks
    pub interval: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        TickConfig {
            interval: Duration::from_millis(100),
        }
    }
}

impl TickConfig {
    /// Frame-rate ticking for smooth animation hosts
    pub fn smooth() -> Self {
        TickConfig {
            interval: MIN_TICK_INTERVAL,
        }
    }

    pub fn with_interval(interval: Duration) -> Self {
        TickConfig { interval }
    }

    /// Interval actually used, never below [`MIN_TICK_INTERVAL`]
    #[inline]
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_TICK_INTERVAL)
    }
}

/// One delivered tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub seq: u64,
    pub now: LabTime,
    /// Time since the previous delivered tick (zero for the first)
    pub dt: Duration,
}

/// Driver counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub delivered: u64,
    pub dropped_hidden: u64,
    pub too_early: u64,
}

/// Bounded-rate tick source with visibility suspension
#[derive(Debug)]
pub struct TickDriver {
    config: TickConfig,
    visible: bool,
    last_tick: Option<LabTime>,
    seq: u64,
    stats: TickStats,
}

impl TickDriver {
    pub fn new() -> Self {
        Self::with_config(TickConfig::default())
    }

    pub fn with_config(config: TickConfig) -> Self {
        TickDriver {
            config,
            visible: true,
            last_tick: None,
            seq: 0,
            stats: TickStats::default(),
        }
    }

    /// Deliver a tick if one is due at `now`
    pub fn poll(&mut self, now: LabTime) -> Option<Tick> {
        if !self.visible {
            self.stats.dropped_hidden += 1;
            debug!(?now, "tick dropped while hidden");
            return None;
        }

        let dt = match self.last_tick {
            None => Duration::ZERO,
            Some(last) => {
                let gap = now.since(last);
                if gap < self.config.effective_interval() {
                    self.stats.too_early += 1;
                    return None;
                }
                gap
            }
        };

        self.last_tick = Some(now);
        self.seq += 1;
        self.stats.delivered += 1;
        Some(Tick {
            seq: self.seq,
            now,
            dt,
        })
    }

    /// Deliver a tick now regardless of rate, still honoring visibility
    pub fn force(&mut self, now: LabTime) -> Option<Tick> {
        if !self.visible {
            self.stats.dropped_hidden += 1;
            return None;
        }
        let dt = self.last_tick.map_or(Duration::ZERO, |last| now.since(last));
        self.last_tick = Some(now);
        self.seq += 1;
        self.stats.delivered += 1;
        Some(Tick {
            seq: self.seq,
            now,
            dt,
        })
    }

    /// Host visibility signal. Becoming visible restarts the dt baseline.
    pub fn set_visible(&mut self, visible: bool) {
        if visible && !self.visible {
            self.last_tick = None;
        }
        if visible != self.visible {
            debug!(visible, "tick driver visibility changed");
        }
        self.visible = visible;
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    pub fn last_tick(&self) -> Option<LabTime> {
        self.last_tick
    }
}

impl Default for TickDriver {
    fn default() -> Self {
        Self::new()
    }
}
