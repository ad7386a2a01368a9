//! Mercury thermometer
//!
//! The column works between the freezing (-39 °C) and boiling (357 °C)
//! points of mercury. Outside that range the sensor degrades instead of
//! reporting a number.

use labsim_core::LabTime;
use rand::rngs::StdRng;

use crate::{ProbeConfig, ProbePhase, ProbeSettler};

pub const MERCURY_FREEZE: f64 = -39.0;
pub const MERCURY_BOIL: f64 = 357.0;
pub const OVERHEAT_WARNING: f64 = 300.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SensorState {
    Frozen,
    Normal,
    Overheating,
    /// Mercury boiled; no numeric reading
    Failure,
}

impl SensorState {
    pub fn classify(celsius: f64) -> Self {
        if celsius < MERCURY_FREEZE {
            SensorState::Frozen
        } else if celsius >= MERCURY_BOIL {
            SensorState::Failure
        } else if celsius >= OVERHEAT_WARNING {
            SensorState::Overheating
        } else {
            SensorState::Normal
        }
    }

    #[inline]
    pub fn is_degraded(self) -> bool {
        self != SensorState::Normal
    }
}

/// Height of the mercury column as a fraction of the working range
pub fn mercury_fraction(celsius: f64) -> f64 {
    match SensorState::classify(celsius) {
        SensorState::Frozen | SensorState::Failure => 0.0,
        _ => {
            (celsius.clamp(MERCURY_FREEZE, MERCURY_BOIL) - MERCURY_FREEZE)
                / (MERCURY_BOIL - MERCURY_FREEZE)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThermometerDisplay {
    pub phase: ProbePhase,
    /// `None` while calibrating, for an empty vessel, or on sensor failure
    pub reading: Option<f64>,
    /// `None` for an empty vessel
    pub sensor: Option<SensorState>,
    pub mercury: f64,
}

#[derive(Clone, Debug)]
pub struct ThermometerSimulator {
    probe: ProbeSettler,
}

impl ThermometerSimulator {
    pub fn new(now: LabTime, config: ProbeConfig, rng: StdRng) -> Self {
        ThermometerSimulator {
            probe: ProbeSettler::new(now, config, rng),
        }
    }

    pub fn recalibrate(&mut self, now: LabTime) {
        self.probe.recalibrate(now);
    }

    /// `celsius` is `None` for an empty vessel
    pub fn tick(&mut self, now: LabTime, celsius: Option<f64>) {
        self.probe.tick(now, celsius);
    }

    pub fn snapshot(&self, celsius: Option<f64>) -> ThermometerDisplay {
        let sensor = celsius.map(SensorState::classify);
        let reading = match sensor {
            Some(SensorState::Failure) => None,
            _ => self.probe.displayed(celsius),
        };
        ThermometerDisplay {
            phase: self.probe.phase(),
            reading,
            sensor,
            mercury: celsius.map_or(0.0, mercury_fraction),
        }
    }
}
