//! Per-attachment simulator dispatch
//!
//! One [`DeviceSimulator`] lives beside each attachment. It holds only the
//! transient animation state of its instrument; readings and settings come
//! in through [`DeviceInputs`] on every call.

use labsim_core::{AttachmentId, EquipmentClass, LabTime, LiquidLayer, Settings, TimerMode};
use labsim_quantities::DerivedQuantities;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{
    heating_display, net_weight, stirrer_display, BalanceSimulator, CentrifugeSimulator,
    DeviceConfig, DisplayState, PhMeterSimulator, ThermometerSimulator, TimerSimulator,
};

/// Fresh inputs for one evaluation
#[derive(Clone, Copy, Debug)]
pub struct DeviceInputs<'a> {
    pub now: LabTime,
    /// Readings of the attachment's vessel
    pub quantities: DerivedQuantities,
    pub settings: &'a Settings,
    pub layers: &'a [LiquidLayer],
}

impl<'a> DeviceInputs<'a> {
    fn setpoint(&self) -> f64 {
        self.settings.setpoint().unwrap_or(0.0)
    }

    fn timer_params(&self) -> (TimerMode, f64) {
        match self.settings {
            Settings::Timer {
                mode,
                duration_secs,
                ..
            } => (*mode, *duration_secs),
            _ => (TimerMode::Countdown, 0.0),
        }
    }
}

/// Jitter source for one attachment
pub fn jitter_rng(seed: Option<u64>, id: AttachmentId) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ id.0),
        None => StdRng::from_entropy(),
    }
}

#[derive(Clone, Debug)]
pub enum DeviceSimulator {
    Heating { class: EquipmentClass },
    Stirrer { min_period: f64 },
    Centrifuge(CentrifugeSimulator),
    PhMeter(PhMeterSimulator),
    Thermometer(ThermometerSimulator),
    Balance(BalanceSimulator),
    Timer(TimerSimulator),
}

impl DeviceSimulator {
    pub fn new(class: EquipmentClass, id: AttachmentId, now: LabTime, config: &DeviceConfig) -> Self {
        match class {
            EquipmentClass::BunsenBurner | EquipmentClass::HotPlate => {
                DeviceSimulator::Heating { class }
            }
            EquipmentClass::MagneticStirrer => DeviceSimulator::Stirrer {
                min_period: config.stirrer_min_period,
            },
            EquipmentClass::Centrifuge => {
                DeviceSimulator::Centrifuge(CentrifugeSimulator::new(now, config.centrifuge))
            }
            EquipmentClass::PhMeter => DeviceSimulator::PhMeter(PhMeterSimulator::new(
                now,
                config.ph_probe,
                jitter_rng(config.jitter_seed, id),
            )),
            EquipmentClass::Thermometer => DeviceSimulator::Thermometer(ThermometerSimulator::new(
                now,
                config.thermometer,
                jitter_rng(config.jitter_seed, id),
            )),
            EquipmentClass::AnalyticalBalance => {
                DeviceSimulator::Balance(BalanceSimulator::new(now, config.balance))
            }
            EquipmentClass::Timer => DeviceSimulator::Timer(TimerSimulator::new()),
        }
    }

    pub fn class(&self) -> EquipmentClass {
        match self {
            DeviceSimulator::Heating { class } => *class,
            DeviceSimulator::Stirrer { .. } => EquipmentClass::MagneticStirrer,
            DeviceSimulator::Centrifuge(_) => EquipmentClass::Centrifuge,
            DeviceSimulator::PhMeter(_) => EquipmentClass::PhMeter,
            DeviceSimulator::Thermometer(_) => EquipmentClass::Thermometer,
            DeviceSimulator::Balance(_) => EquipmentClass::AnalyticalBalance,
            DeviceSimulator::Timer(_) => EquipmentClass::Timer,
        }
    }

    /// Switched back on: measurement instruments calibrate again
    pub fn activate(&mut self, now: LabTime) {
        match self {
            DeviceSimulator::PhMeter(sim) => sim.recalibrate(now),
            DeviceSimulator::Thermometer(sim) => sim.recalibrate(now),
            DeviceSimulator::Balance(sim) => sim.recalibrate(now),
            _ => {}
        }
    }

    /// Switched off: move to the idle state
    pub fn deactivate(&mut self, now: LabTime) {
        match self {
            DeviceSimulator::Centrifuge(sim) => sim.stop(now),
            DeviceSimulator::Timer(sim) => sim.reset(),
            _ => {}
        }
    }

    /// Advance one tick. Inactive centrifuges still tick to finish opening.
    pub fn tick(&mut self, inputs: &DeviceInputs<'_>, active: bool) {
        let now = inputs.now;
        let q = &inputs.quantities;
        match self {
            DeviceSimulator::Centrifuge(sim) => sim.tick(now, active && inputs.setpoint() > 0.0),
            _ if !active => {}
            DeviceSimulator::PhMeter(sim) => sim.tick(now, q.ph_reading()),
            DeviceSimulator::Thermometer(sim) => sim.tick(now, q.temperature.celsius()),
            DeviceSimulator::Balance(sim) => {
                let tare = inputs.settings.tare_offset().unwrap_or(0.0);
                sim.tick(now, net_weight(q.weight, tare));
            }
            DeviceSimulator::Timer(sim) => {
                let (mode, duration) = inputs.timer_params();
                sim.tick(now, mode, duration);
            }
            DeviceSimulator::Heating { .. } | DeviceSimulator::Stirrer { .. } => {}
        }
    }

    /// Current display. A centrifuge that is still opening is shown even
    /// after being switched off.
    pub fn snapshot(&self, inputs: &DeviceInputs<'_>, active: bool) -> DisplayState {
        let now = inputs.now;
        let q = &inputs.quantities;
        match self {
            DeviceSimulator::Centrifuge(sim)
                if active || sim.phase() != crate::CentrifugePhase::Open =>
            {
                let rpm = if active { inputs.setpoint() } else { 0.0 };
                DisplayState::Centrifuge(sim.snapshot(now, rpm, inputs.layers))
            }
            _ if !active => DisplayState::Inactive {
                class: self.class(),
            },
            DeviceSimulator::Heating { class } => {
                DisplayState::Heating(heating_display(*class, inputs.setpoint()))
            }
            DeviceSimulator::Stirrer { min_period } => {
                DisplayState::Stirrer(stirrer_display(inputs.setpoint(), *min_period))
            }
            DeviceSimulator::Centrifuge(sim) => {
                DisplayState::Centrifuge(sim.snapshot(now, inputs.setpoint(), inputs.layers))
            }
            DeviceSimulator::PhMeter(sim) => DisplayState::PhMeter(sim.snapshot(q.ph_reading())),
            DeviceSimulator::Thermometer(sim) => {
                DisplayState::Thermometer(sim.snapshot(q.temperature.celsius()))
            }
            DeviceSimulator::Balance(sim) => DisplayState::Balance(
                sim.snapshot(q.weight, inputs.settings.tare_offset().unwrap_or(0.0)),
            ),
            DeviceSimulator::Timer(sim) => {
                let (mode, duration) = inputs.timer_params();
                DisplayState::Timer(sim.snapshot(now, mode, duration))
            }
        }
    }

    pub fn timer_mut(&mut self) -> Option<&mut TimerSimulator> {
        match self {
            DeviceSimulator::Timer(sim) => Some(sim),
            _ => None,
        }
    }

    pub fn timer(&self) -> Option<&TimerSimulator> {
        match self {
            DeviceSimulator::Timer(sim) => Some(sim),
            _ => None,
        }
    }
}
