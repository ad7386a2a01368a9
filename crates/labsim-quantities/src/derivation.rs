//! Combined derivation of a vessel's readings

use labsim_core::{EquipmentAttachment, Vessel};

use crate::{ph, temperature, weight, PhCalculator, Temperature};

/// Instantaneous readings of one vessel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedQuantities {
    pub temperature: Temperature,
    /// Grams
    pub weight: f64,
    /// 0 for an empty vessel
    pub ph: f64,
}

impl DerivedQuantities {
    /// Readings of a vessel with no contents
    pub const EMPTY: DerivedQuantities = DerivedQuantities {
        temperature: Temperature::Empty,
        weight: 0.0,
        ph: 0.0,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }

    /// pH as mirrored into probe settings, `None` for an empty vessel
    pub fn ph_reading(&self) -> Option<f64> {
        (!self.is_empty()).then_some(self.ph)
    }
}

/// Derive all readings of `vessel`
pub fn derive<'a, I>(vessel: &Vessel, attachments: I, calculator: &dyn PhCalculator) -> DerivedQuantities
where
    I: IntoIterator<Item = &'a EquipmentAttachment>,
{
    DerivedQuantities {
        temperature: temperature(vessel, attachments),
        weight: weight(vessel.contents()),
        ph: ph(vessel.contents(), calculator),
    }
}
