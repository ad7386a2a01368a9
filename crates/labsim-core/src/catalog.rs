//! Equipment catalog
//!
//! Every instrument belongs to one class. The class determines its category,
//! dial range, settings shape and which exclusivity group it competes in:
//! - Heating: bunsen burner, hot plate - one live heat source per vessel
//! - Motion: magnetic stirrer, centrifuge - one live motion source per vessel
//! - Measurement: pH meter, thermometer, analytical balance - read-only
//! - Timer: lab timer

use std::fmt;

/// Instrument class
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EquipmentClass {
    BunsenBurner,
    HotPlate,
    MagneticStirrer,
    Centrifuge,
    PhMeter,
    Thermometer,
    AnalyticalBalance,
    Timer,
}

impl EquipmentClass {
    /// All classes in catalog order
    pub fn all() -> &'static [EquipmentClass] {
        &[
            EquipmentClass::BunsenBurner,
            EquipmentClass::HotPlate,
            EquipmentClass::MagneticStirrer,
            EquipmentClass::Centrifuge,
            EquipmentClass::PhMeter,
            EquipmentClass::Thermometer,
            EquipmentClass::AnalyticalBalance,
            EquipmentClass::Timer,
        ]
    }

    /// Parse from the class id used by the UI layer
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "bunsen-burner" => Some(EquipmentClass::BunsenBurner),
            "hot-plate" => Some(EquipmentClass::HotPlate),
            "magnetic-stirrer" => Some(EquipmentClass::MagneticStirrer),
            "centrifuge" => Some(EquipmentClass::Centrifuge),
            "ph-meter" => Some(EquipmentClass::PhMeter),
            "thermometer" => Some(EquipmentClass::Thermometer),
            "analytical-balance" => Some(EquipmentClass::AnalyticalBalance),
            "timer" => Some(EquipmentClass::Timer),
            _ => None,
        }
    }

    /// Class id used by the UI layer
    pub fn id(self) -> &'static str {
        match self {
            EquipmentClass::BunsenBurner => "bunsen-burner",
            EquipmentClass::HotPlate => "hot-plate",
            EquipmentClass::MagneticStirrer => "magnetic-stirrer",
            EquipmentClass::Centrifuge => "centrifuge",
            EquipmentClass::PhMeter => "ph-meter",
            EquipmentClass::Thermometer => "thermometer",
            EquipmentClass::AnalyticalBalance => "analytical-balance",
            EquipmentClass::Timer => "timer",
        }
    }

    #[inline]
    pub fn category(self) -> Category {
        self.config().category
    }

    /// Exclusivity group this class competes in, if any
    pub fn group(self) -> Option<ExclusivityGroup> {
        match self {
            EquipmentClass::BunsenBurner | EquipmentClass::HotPlate => {
                Some(ExclusivityGroup::Heating)
            }
            EquipmentClass::MagneticStirrer | EquipmentClass::Centrifuge => {
                Some(ExclusivityGroup::Motion)
            }
            _ => None,
        }
    }

    /// Static catalog row for this class
    pub fn config(self) -> &'static ClassConfig {
        // CATALOG is laid out in the same order as `all()`
        &CATALOG[self as usize]
    }
}

impl fmt::Display for EquipmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Equipment category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Heating,
    Motion,
    Measurement,
    Timer,
}

/// Groups of classes of which at most one may be active per vessel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExclusivityGroup {
    Heating,
    Motion,
}

impl ExclusivityGroup {
    pub fn members(self) -> &'static [EquipmentClass] {
        match self {
            ExclusivityGroup::Heating => &[EquipmentClass::BunsenBurner, EquipmentClass::HotPlate],
            ExclusivityGroup::Motion => {
                &[EquipmentClass::MagneticStirrer, EquipmentClass::Centrifuge]
            }
        }
    }
}

/// Catalog row - immutable per-class dial configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassConfig {
    pub class: EquipmentClass,
    pub name: &'static str,
    pub category: Category,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub unit: &'static str,
    /// Dial position when first attached
    pub default_value: f64,
}

impl ClassConfig {
    /// Clamp a dial value to the physical stops. NaN lands on `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// The equipment catalog
pub static CATALOG: [ClassConfig; 8] = [
    ClassConfig {
        class: EquipmentClass::BunsenBurner,
        name: "Bunsen Burner",
        category: Category::Heating,
        min: 0.0,
        max: 1500.0,
        step: 50.0,
        unit: "°C",
        default_value: 0.0,
    },
    ClassConfig {
        class: EquipmentClass::HotPlate,
        name: "Hot Plate",
        category: Category::Heating,
        min: 25.0,
        max: 400.0,
        step: 25.0,
        unit: "°C",
        default_value: 25.0,
    },
    ClassConfig {
        class: EquipmentClass::MagneticStirrer,
        name: "Magnetic Stirrer",
        category: Category::Motion,
        min: 0.0,
        max: 1500.0,
        step: 100.0,
        unit: "RPM",
        default_value: 0.0,
    },
    ClassConfig {
        class: EquipmentClass::Centrifuge,
        name: "Centrifuge",
        category: Category::Motion,
        min: 0.0,
        max: 5000.0,
        step: 500.0,
        unit: "RPM",
        default_value: 0.0,
    },
    ClassConfig {
        class: EquipmentClass::PhMeter,
        name: "pH Meter",
        category: Category::Measurement,
        min: 0.0,
        max: 14.0,
        step: 0.1,
        unit: "pH",
        default_value: 7.0,
    },
    ClassConfig {
        class: EquipmentClass::Thermometer,
        name: "Digital Thermometer",
        category: Category::Measurement,
        min: -50.0,
        max: 300.0,
        step: 5.0,
        unit: "°C",
        default_value: 25.0,
    },
    ClassConfig {
        class: EquipmentClass::AnalyticalBalance,
        name: "Analytical Balance",
        category: Category::Measurement,
        min: 0.0,
        max: 200.0,
        step: 0.1,
        unit: "g",
        default_value: 0.0,
    },
    ClassConfig {
        class: EquipmentClass::Timer,
        name: "Lab Timer",
        category: Category::Timer,
        min: 0.0,
        max: 120.0,
        step: 5.0,
        unit: "min",
        default_value: 5.0,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_classes() {
        for &class in EquipmentClass::all() {
            assert_eq!(class.config().class, class);
        }
    }

    #[test]
    fn test_id_roundtrip() {
        for &class in EquipmentClass::all() {
            assert_eq!(EquipmentClass::from_id(class.id()), Some(class));
        }
        assert_eq!(EquipmentClass::from_id("laser"), None);
    }

    #[test]
    fn test_groups() {
        assert_eq!(EquipmentClass::HotPlate.group(), Some(ExclusivityGroup::Heating));
        assert_eq!(EquipmentClass::Centrifuge.group(), Some(ExclusivityGroup::Motion));
        assert_eq!(EquipmentClass::Timer.group(), None);
        assert_eq!(EquipmentClass::Centrifuge.category(), Category::Motion);
    }

    #[test]
    fn test_clamp_to_physical_stops() {
        let plate = EquipmentClass::HotPlate.config();
        assert_eq!(plate.clamp(10.0), 25.0);
        assert_eq!(plate.clamp(900.0), 400.0);
        assert_eq!(plate.clamp(f64::NAN), 25.0);
        assert_eq!(plate.clamp(f64::INFINITY), 400.0);
    }

    proptest::proptest! {
        #[test]
        fn prop_clamp_lands_on_dial(value in proptest::num::f64::ANY) {
            for &class in EquipmentClass::all() {
                let config = class.config();
                proptest::prop_assert!(config.contains(config.clamp(value)));
            }
        }
    }
}
