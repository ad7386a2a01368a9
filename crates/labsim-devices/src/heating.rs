//! Heating devices (bunsen burner, hot plate)
//!
//! Stateless: the output is the dial setpoint.

use labsim_core::EquipmentClass;

use crate::{intensity, Intensity, IntensityLevel};

/// Setpoint at which the vessel visibly boils (°C)
pub const BOILING_POINT: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatingDisplay {
    pub class: EquipmentClass,
    pub setpoint: f64,
    pub intensity: Intensity,
    /// Vapor rising from the vessel
    pub vapor: bool,
}

pub fn heating_display(class: EquipmentClass, setpoint: f64) -> HeatingDisplay {
    let setpoint = if setpoint.is_finite() { setpoint } else { 0.0 };
    HeatingDisplay {
        class,
        setpoint,
        intensity: intensity(class, setpoint).unwrap_or(Intensity {
            level: IntensityLevel::Minimal,
            percent: 0.0,
        }),
        vapor: setpoint >= BOILING_POINT,
    }
}
