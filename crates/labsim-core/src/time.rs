//! Time primitives for lab sessions
//!
//! All simulator arithmetic runs on `LabTime`, a monotonic timestamp in
//! microseconds since the session epoch. Elapsed durations are always
//! derived by subtracting two timestamps, never by summing tick deltas.

use std::ops::{Add, Sub};
use std::time::Duration;

/// Monotonic lab timestamp (microseconds since session epoch)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LabTime(pub u64);

impl LabTime {
    pub const ZERO: LabTime = LabTime(0);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        LabTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        LabTime(millis.saturating_mul(1000))
    }

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            LabTime((secs * 1_000_000.0) as u64)
        } else {
            LabTime::ZERO
        }
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0 / 1000
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        LabTime(self.0.saturating_add(duration.as_micros() as u64))
    }

    /// Subtract a duration, stopping at the epoch
    #[inline]
    pub fn saturating_sub(self, duration: Duration) -> Self {
        LabTime(self.0.saturating_sub(duration.as_micros() as u64))
    }

    /// Duration since an earlier timestamp (zero if `earlier` is later)
    #[inline]
    pub fn since(self, earlier: LabTime) -> Duration {
        self - earlier
    }
}

impl Add<Duration> for LabTime {
    type Output = LabTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<Duration> for LabTime {
    type Output = LabTime;

    #[inline]
    fn sub(self, rhs: Duration) -> Self::Output {
        self.saturating_sub(rhs)
    }
}

impl Sub<LabTime> for LabTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: LabTime) -> Self::Output {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

impl std::fmt::Debug for LabTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({:.3}s)", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lab_time_difference() {
        let t1 = LabTime::from_millis(1_000);
        let t2 = t1 + Duration::from_millis(250);

        assert!(t2 > t1);
        assert_eq!(t2 - t1, Duration::from_millis(250));
        // Reversed subtraction saturates instead of wrapping
        assert_eq!(t1 - t2, Duration::ZERO);
    }

    #[test]
    fn test_saturating_sub_stops_at_epoch() {
        let t = LabTime::from_millis(10);
        assert_eq!(t - Duration::from_secs(5), LabTime::ZERO);
    }

    #[test]
    fn test_from_secs_rejects_non_finite() {
        assert_eq!(LabTime::from_secs_f64(f64::NAN), LabTime::ZERO);
        assert_eq!(LabTime::from_secs_f64(-3.0), LabTime::ZERO);
        assert_eq!(LabTime::from_secs_f64(1.5).as_millis(), 1_500);
    }
}
