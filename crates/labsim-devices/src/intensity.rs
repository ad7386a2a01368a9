//! Intensity scale for actuator dials
//!
//! Maps a heater or motor setpoint to a coarse level and a percentage of
//! full scale, for flame height, plate glow and motion blur.

use labsim_core::EquipmentClass;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntensityLevel {
    Minimal,
    Low,
    Medium,
    High,
    /// Bunsen burner only
    Extreme,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intensity {
    pub level: IntensityLevel,
    /// Percent of full scale
    pub percent: f64,
}

fn band(value: f64, bands: [f64; 3], top: IntensityLevel) -> IntensityLevel {
    if value < bands[0] {
        IntensityLevel::Minimal
    } else if value < bands[1] {
        IntensityLevel::Low
    } else if value < bands[2] {
        IntensityLevel::Medium
    } else {
        top
    }
}

/// Intensity of an actuator setpoint. `None` for instruments without a dial
/// driven effect.
pub fn intensity(class: EquipmentClass, setpoint: f64) -> Option<Intensity> {
    let v = if setpoint.is_finite() { setpoint } else { 0.0 };
    let (level, percent) = match class {
        EquipmentClass::BunsenBurner => {
            let level = if v >= 1500.0 {
                IntensityLevel::Extreme
            } else {
                band(v, [100.0, 500.0, 1000.0], IntensityLevel::High)
            };
            (level, v / 1500.0 * 100.0)
        }
        EquipmentClass::HotPlate => (
            band(v, [100.0, 200.0, 300.0], IntensityLevel::High),
            (v - 25.0) / 375.0 * 100.0,
        ),
        EquipmentClass::MagneticStirrer => (
            band(v, [300.0, 800.0, 1200.0], IntensityLevel::High),
            v / 1500.0 * 100.0,
        ),
        EquipmentClass::Centrifuge => (
            band(v, [1000.0, 2500.0, 4000.0], IntensityLevel::High),
            v / 5000.0 * 100.0,
        ),
        _ => return None,
    };
    Some(Intensity { level, percent })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burner_bands() {
        let at = |v| intensity(EquipmentClass::BunsenBurner, v).unwrap().level;
        assert_eq!(at(0.0), IntensityLevel::Minimal);
        assert_eq!(at(400.0), IntensityLevel::Low);
        assert_eq!(at(999.0), IntensityLevel::Medium);
        assert_eq!(at(1000.0), IntensityLevel::High);
        assert_eq!(at(1500.0), IntensityLevel::Extreme);
    }

    #[test]
    fn test_percent_of_scale() {
        let plate = intensity(EquipmentClass::HotPlate, 400.0).unwrap();
        assert_eq!(plate.level, IntensityLevel::High);
        assert!((plate.percent - 100.0).abs() < 1e-9);

        let spin = intensity(EquipmentClass::Centrifuge, 2500.0).unwrap();
        assert_eq!(spin.level, IntensityLevel::Medium);
        assert!((spin.percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_measurement_has_no_intensity() {
        assert!(intensity(EquipmentClass::PhMeter, 7.0).is_none());
        assert!(intensity(EquipmentClass::Timer, 5.0).is_none());
    }
}
