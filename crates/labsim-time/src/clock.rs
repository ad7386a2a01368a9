//! Clock implementations for the lab engine

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use labsim_core::LabTime;

/// Source of lab time. Monotonic: `now` never goes backwards.
pub trait Clock: Send {
    fn now(&self) -> LabTime;
}

/// Wall clock anchored at construction
#[derive(Debug)]
pub struct SystemClock {
    reference: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            reference: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> LabTime {
        let micros = self.reference.elapsed().as_micros();
        LabTime::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
    }
}

/// Hand-driven clock. Clones share the same time, so a test can keep one
/// handle while the session owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(t: LabTime) -> Self {
        ManualClock {
            micros: Arc::new(AtomicU64::new(t.as_micros())),
        }
    }

    /// Move time forward
    pub fn advance(&self, dt: Duration) -> LabTime {
        let step = u64::try_from(dt.as_micros()).unwrap_or(u64::MAX);
        let prev = self
            .micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |us| {
                Some(us.saturating_add(step))
            })
            .unwrap_or_else(|us| us);
        LabTime::from_micros(prev.saturating_add(step))
    }

    pub fn advance_millis(&self, ms: u64) -> LabTime {
        self.advance(Duration::from_millis(ms))
    }

    /// Jump to `t`. Only moves forward.
    pub fn set(&self, t: LabTime) {
        self.micros.fetch_max(t.as_micros(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> LabTime {
        LabTime::from_micros(self.micros.load(Ordering::SeqCst))
    }
}
