//! Analytical balance
//!
//! After calibration the display chases the net weight through a first
//! order lag: `display += (target - display) * damping`, where
//! `target = true weight - tare offset`. A net weight above capacity shows
//! overload; the check is repeated every tick.

use labsim_core::LabTime;
use labsim_time::Phased;
use tracing::{debug, warn};

use crate::BalanceConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BalancePhase {
    Cal,
    Reading,
    Overload,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BalanceDisplay {
    pub phase: BalancePhase,
    /// Shown weight; `None` while calibrating or overloaded
    pub value: Option<f64>,
    /// Net weight the display settles on
    pub target: f64,
    pub tare_offset: f64,
    pub stable: bool,
}

/// Net weight on the pan
#[inline]
pub fn net_weight(true_weight: f64, tare_offset: f64) -> f64 {
    let net = true_weight - tare_offset;
    if net.is_finite() {
        net
    } else {
        0.0
    }
}

#[derive(Clone, Debug)]
pub struct BalanceSimulator {
    config: BalanceConfig,
    phase: Phased<BalancePhase>,
    display: f64,
}

impl BalanceSimulator {
    pub fn new(now: LabTime, config: BalanceConfig) -> Self {
        BalanceSimulator {
            config,
            phase: Phased::new(BalancePhase::Cal, now, config.calibration),
            display: 0.0,
        }
    }

    #[inline]
    pub fn phase(&self) -> BalancePhase {
        self.phase.phase()
    }

    pub fn recalibrate(&mut self, now: LabTime) {
        self.phase
            .enter(BalancePhase::Cal, now, self.config.calibration);
        self.display = 0.0;
    }

    fn classify(&self, target: f64) -> BalancePhase {
        if target > self.config.max_weight {
            BalancePhase::Overload
        } else {
            BalancePhase::Reading
        }
    }

    /// Advance one tick toward `target`
    pub fn tick(&mut self, now: LabTime, target: f64) {
        let before = self.phase.phase();
        if before == BalancePhase::Cal && !self.phase.timer().is_done(now) {
            return;
        }

        let next = self.classify(target);
        if next != before {
            self.phase.enter(next, now, std::time::Duration::ZERO);
            match next {
                BalancePhase::Overload => warn!(net = target, "balance overloaded"),
                _ => debug!(from = ?before, to = ?next, "balance phase"),
            }
        }

        if next == BalancePhase::Reading {
            self.display += (target - self.display) * self.config.damping;
        }
    }

    /// Raw filter state
    #[inline]
    pub fn display(&self) -> f64 {
        self.display
    }

    pub fn is_stable(&self, target: f64) -> bool {
        self.phase.is(BalancePhase::Reading)
            && (self.display - target).abs() < self.config.stable_epsilon
    }

    pub fn snapshot(&self, true_weight: f64, tare_offset: f64) -> BalanceDisplay {
        let target = net_weight(true_weight, tare_offset);
        let phase = self.phase.phase();
        BalanceDisplay {
            phase,
            value: (phase == BalancePhase::Reading).then_some(self.display),
            target,
            tare_offset,
            stable: self.is_stable(target),
        }
    }
}
