//! Magnetic stirrer

use labsim_core::EquipmentClass;

use crate::{intensity, Intensity, IntensityLevel};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StirrerDisplay {
    pub rpm: f64,
    /// Seconds per stir bar revolution, `None` when stopped
    pub period: Option<f64>,
    pub intensity: Intensity,
}

/// Rotation period `max(min_period, 60 / rpm)`. Stopped at or below 0 RPM.
pub fn rotation_period(rpm: f64, min_period: f64) -> Option<f64> {
    if rpm.is_finite() && rpm > 0.0 {
        Some((60.0 / rpm).max(min_period))
    } else {
        None
    }
}

pub fn stirrer_display(rpm: f64, min_period: f64) -> StirrerDisplay {
    let rpm = if rpm.is_finite() { rpm.max(0.0) } else { 0.0 };
    StirrerDisplay {
        rpm,
        period: rotation_period(rpm, min_period),
        intensity: intensity(EquipmentClass::MagneticStirrer, rpm).unwrap_or(Intensity {
            level: IntensityLevel::Minimal,
            percent: 0.0,
        }),
    }
}
