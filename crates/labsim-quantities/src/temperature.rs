//! Vessel temperature
//!
//! Base is room temperature. A live bunsen burner maps its dial linearly
//! onto the flame temperature; a live hot plate raises the base to its
//! setpoint; a live magnetic stirrer adds up to 2 °C of frictional heating.

use labsim_core::{EquipmentAttachment, EquipmentClass, Vessel};

use crate::round1;

/// Reserved reading for a vessel with no contents
pub const EMPTY_SENTINEL: f64 = -999.0;

pub const ROOM_TEMPERATURE: f64 = 25.0;

/// Derived temperature of a vessel
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Temperature {
    /// No contents, nothing to measure
    Empty,
    Celsius(f64),
}

impl Temperature {
    /// Decode a raw reading, mapping the sentinel back to `Empty`
    pub fn from_raw(raw: f64) -> Self {
        if raw == EMPTY_SENTINEL {
            Temperature::Empty
        } else {
            Temperature::Celsius(raw)
        }
    }

    /// Raw reading with `Empty` encoded as the sentinel
    pub fn raw(self) -> f64 {
        match self {
            Temperature::Empty => EMPTY_SENTINEL,
            Temperature::Celsius(c) => c,
        }
    }

    pub fn celsius(self) -> Option<f64> {
        match self {
            Temperature::Empty => None,
            Temperature::Celsius(c) => Some(c),
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, Temperature::Empty)
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Temperature of `vessel` given the attachments on the table. Only
/// attachments live on this vessel are considered.
pub fn temperature<'a, I>(vessel: &Vessel, attachments: I) -> Temperature
where
    I: IntoIterator<Item = &'a EquipmentAttachment>,
{
    if vessel.is_empty() {
        return Temperature::Empty;
    }

    let mut burner = None;
    let mut plate = None;
    let mut stirrer = None;
    for att in attachments.into_iter().filter(|a| a.is_live_on(vessel.id)) {
        let setpoint = att.settings.setpoint().map(finite_or_zero);
        match att.class {
            EquipmentClass::BunsenBurner => burner = setpoint,
            EquipmentClass::HotPlate => plate = setpoint,
            EquipmentClass::MagneticStirrer => stirrer = setpoint,
            _ => {}
        }
    }

    let mut base = ROOM_TEMPERATURE;
    if let Some(setpoint) = burner {
        base = ROOM_TEMPERATURE + (setpoint / 1000.0) * 275.0;
    } else if let Some(setpoint) = plate {
        base = base.max(setpoint);
    }
    if let Some(rpm) = stirrer {
        base += (rpm / 1500.0) * 2.0;
    }

    Temperature::Celsius(round1(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use labsim_core::{AttachmentId, ContentEntry, Settings, Unit, VesselId};

    fn filled() -> Vessel {
        let mut vessel = Vessel::new(VesselId::new(1));
        vessel.add_content(ContentEntry::new("water", 10.0, Unit::Ml));
        vessel
    }

    fn live(class: EquipmentClass, setpoint: f64) -> EquipmentAttachment {
        let mut att = EquipmentAttachment::new(AttachmentId::new(1), class, VesselId::new(1));
        att.settings = match class {
            EquipmentClass::MagneticStirrer | EquipmentClass::Centrifuge => {
                Settings::Motion { setpoint }
            }
            _ => Settings::Heating { setpoint },
        };
        att
    }

    #[test]
    fn test_room_temperature() {
        let none: [&EquipmentAttachment; 0] = [];
        assert_eq!(temperature(&filled(), none), Temperature::Celsius(25.0));
    }

    #[test]
    fn test_bunsen_formula() {
        let burner = live(EquipmentClass::BunsenBurner, 400.0);
        assert_eq!(temperature(&filled(), [&burner]), Temperature::Celsius(135.0));
    }

    #[test]
    fn test_hot_plate_never_cools() {
        let plate = live(EquipmentClass::HotPlate, 180.0);
        assert_eq!(temperature(&filled(), [&plate]), Temperature::Celsius(180.0));
    }

    #[test]
    fn test_stirrer_friction() {
        let plate = live(EquipmentClass::HotPlate, 100.0);
        let stirrer = live(EquipmentClass::MagneticStirrer, 750.0);
        assert_eq!(
            temperature(&filled(), [&plate, &stirrer]),
            Temperature::Celsius(101.0)
        );
    }

    #[test]
    fn test_inactive_or_foreign_heater_ignored() {
        let mut burner = live(EquipmentClass::BunsenBurner, 1000.0);
        burner.active = false;
        let mut elsewhere = live(EquipmentClass::HotPlate, 300.0);
        elsewhere.vessel = VesselId::new(2);

        assert_eq!(
            temperature(&filled(), [&burner, &elsewhere]),
            Temperature::Celsius(25.0)
        );
    }

    #[test]
    fn test_empty_vessel_is_sentinel() {
        let burner = live(EquipmentClass::BunsenBurner, 1500.0);
        let empty = Vessel::new(VesselId::new(1));
        let t = temperature(&empty, [&burner]);
        assert!(t.is_empty());
        assert_eq!(t.raw(), EMPTY_SENTINEL);
        assert_eq!(Temperature::from_raw(t.raw()), Temperature::Empty);
    }
}
