//! Measurement probe settling
//!
//! Shared by the pH meter and the thermometer:
//!
//! ```text
//! activate -> CAL --(calibration)--> READING --(settle)--> STABLE
//!                                       ^                     |
//!                                       +--- value changed ---+
//! ```
//!
//! During READING the displayed value is the true value plus uniform jitter
//! whose bound decays linearly to zero over the settle window. A change of
//! the true value restarts READING; calibration is only repeated after a
//! reactivation.

use labsim_core::LabTime;
use labsim_time::Phased;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use crate::ProbeConfig;

/// Values closer than this count as unchanged
const CHANGE_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProbePhase {
    Cal,
    Reading,
    Stable,
}

fn changed(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => (x - y).abs() > CHANGE_EPSILON,
        (None, None) => false,
        _ => true,
    }
}

/// CAL / READING / STABLE sequencer with decaying jitter
#[derive(Clone, Debug)]
pub struct ProbeSettler {
    config: ProbeConfig,
    phase: Phased<ProbePhase>,
    /// True value the current READING window settles on
    target: Option<f64>,
    /// Offset sampled on the last tick
    jitter: f64,
    rng: StdRng,
}

impl ProbeSettler {
    pub fn new(now: LabTime, config: ProbeConfig, rng: StdRng) -> Self {
        ProbeSettler {
            config,
            phase: Phased::new(ProbePhase::Cal, now, config.calibration),
            target: None,
            jitter: 0.0,
            rng,
        }
    }

    #[inline]
    pub fn phase(&self) -> ProbePhase {
        self.phase.phase()
    }

    /// Start over from CAL
    pub fn recalibrate(&mut self, now: LabTime) {
        self.phase.enter(ProbePhase::Cal, now, self.config.calibration);
        self.target = None;
        self.jitter = 0.0;
    }

    fn start_reading(&mut self, now: LabTime, value: Option<f64>) {
        self.phase.enter(ProbePhase::Reading, now, self.config.settle);
        self.target = value;
    }

    /// Advance with the current true value
    pub fn tick(&mut self, now: LabTime, value: Option<f64>) {
        let before = self.phase.phase();
        match before {
            ProbePhase::Cal => {
                if self.phase.timer().is_done(now) {
                    self.start_reading(now, value);
                }
            }
            ProbePhase::Reading | ProbePhase::Stable if changed(self.target, value) => {
                self.start_reading(now, value);
            }
            ProbePhase::Reading => {
                self.phase
                    .advance_when_done(now, ProbePhase::Stable, std::time::Duration::ZERO);
            }
            ProbePhase::Stable => {}
        }

        // A zero-length settle window goes straight through
        if self.phase.is(ProbePhase::Reading) && self.phase.timer().is_done(now) {
            self.phase
                .advance_when_done(now, ProbePhase::Stable, std::time::Duration::ZERO);
        }

        self.jitter = if self.phase.is(ProbePhase::Reading) {
            let bound = self.jitter_bound(now);
            if bound > 0.0 {
                self.rng.gen_range(-bound..=bound)
            } else {
                0.0
            }
        } else {
            0.0
        };

        if before != self.phase.phase() {
            debug!(from = ?before, to = ?self.phase.phase(), "probe phase");
        }
    }

    /// Jitter bound at `now`: full amplitude when READING starts, zero at
    /// the end of the settle window
    pub fn jitter_bound(&self, now: LabTime) -> f64 {
        if !self.phase.is(ProbePhase::Reading) {
            return 0.0;
        }
        self.config.jitter_amplitude * (1.0 - self.phase.timer().progress(now))
    }

    /// Displayed value for `value`. `None` while calibrating or when there is
    /// nothing to measure.
    pub fn displayed(&self, value: Option<f64>) -> Option<f64> {
        match self.phase.phase() {
            ProbePhase::Cal => None,
            ProbePhase::Reading => value.map(|v| v + self.jitter),
            ProbePhase::Stable => value,
        }
    }

    /// Offset applied on the last tick
    #[inline]
    pub fn jitter(&self) -> f64 {
        self.jitter
    }
}
