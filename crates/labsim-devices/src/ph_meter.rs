//! pH meter

use labsim_core::LabTime;
use labsim_quantities::PhCategory;
use rand::rngs::StdRng;

use crate::{ProbeConfig, ProbePhase, ProbeSettler};

/// Readings at or below this (and above 0) raise the warning light
pub const ACID_WARNING: f64 = 2.0;
/// Readings at or above this raise the warning light
pub const BASE_WARNING: f64 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhMeterDisplay {
    pub phase: ProbePhase,
    /// Shown value; `None` while calibrating or for an empty vessel
    pub value: Option<f64>,
    pub category: Option<PhCategory>,
    /// Extreme reading once stable
    pub warning: bool,
}

/// Whether a stable pH reading is extreme enough to warn about
pub fn ph_warning(ph: f64) -> bool {
    (ph > 0.0 && ph <= ACID_WARNING) || ph >= BASE_WARNING
}

#[derive(Clone, Debug)]
pub struct PhMeterSimulator {
    probe: ProbeSettler,
}

impl PhMeterSimulator {
    pub fn new(now: LabTime, config: ProbeConfig, rng: StdRng) -> Self {
        PhMeterSimulator {
            probe: ProbeSettler::new(now, config, rng),
        }
    }

    pub fn recalibrate(&mut self, now: LabTime) {
        self.probe.recalibrate(now);
    }

    /// `ph` is `None` for an empty vessel
    pub fn tick(&mut self, now: LabTime, ph: Option<f64>) {
        self.probe.tick(now, ph);
    }

    pub fn snapshot(&self, ph: Option<f64>) -> PhMeterDisplay {
        let phase = self.probe.phase();
        let value = self.probe.displayed(ph).map(|v| v.clamp(0.0, 14.0));
        PhMeterDisplay {
            phase,
            value,
            category: value.map(PhCategory::of),
            warning: phase == ProbePhase::Stable && value.is_some_and(ph_warning),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_warning_bands() {
        assert!(!ph_warning(0.0));
        assert!(ph_warning(1.0));
        assert!(ph_warning(2.0));
        assert!(!ph_warning(7.0));
        assert!(ph_warning(12.0));
        assert!(ph_warning(14.0));
    }

    #[test]
    fn test_stable_acid_warns() {
        let mut meter = PhMeterSimulator::new(
            LabTime::ZERO,
            ProbeConfig::ph(),
            StdRng::seed_from_u64(3),
        );
        meter.tick(LabTime::from_millis(200), Some(1.0));
        assert!(!meter.snapshot(Some(1.0)).warning);

        meter.tick(LabTime::from_millis(1_000), Some(1.0));
        let shown = meter.snapshot(Some(1.0));
        assert_eq!(shown.phase, ProbePhase::Stable);
        assert_eq!(shown.value, Some(1.0));
        assert_eq!(shown.category, Some(PhCategory::StronglyAcidic));
        assert!(shown.warning);
    }
}
