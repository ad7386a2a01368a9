//! pH derivation
//!
//! The engine only fixes the contract (0 for an empty vessel, one decimal,
//! inside [0, 14]); the chemistry lives behind [`PhCalculator`].
//! [`AcidBaseCalculator`] is the stock implementation:
//!
//! 1. Convert every known entry to moles (`ml`/`drops` through its molarity)
//! 2. Neutralize strong acid against strong base equivalents
//! 3. Otherwise solve the weak acid / weak base system
//! 4. Nothing acidic or basic left means neutral water

use std::collections::HashMap;

use labsim_core::{ContentEntry, Phase, Unit};

use crate::{round1, DROP_ML};

pub const NEUTRAL_PH: f64 = 7.0;

/// Molarity assumed for solutions that do not state one
pub const DEFAULT_MOLARITY: f64 = 0.1;

/// Smallest volume used for concentrations (1 ml)
const MIN_VOLUME_L: f64 = 0.001;

/// pH from a vessel's content list
pub trait PhCalculator: Send {
    /// pH of a non-empty content list
    fn calculate(&self, contents: &[ContentEntry]) -> f64;
}

impl<F> PhCalculator for F
where
    F: Fn(&[ContentEntry]) -> f64 + Send,
{
    fn calculate(&self, contents: &[ContentEntry]) -> f64 {
        self(contents)
    }
}

/// Derived pH: 0 when empty, otherwise the calculator's value clamped and
/// rounded to one decimal
pub fn ph(contents: &[ContentEntry], calculator: &dyn PhCalculator) -> f64 {
    if contents.is_empty() {
        return 0.0;
    }
    round1(clamp_ph(calculator.calculate(contents)))
}

/// Clamp into [0, 14]. Non-finite values read as neutral.
pub fn clamp_ph(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 14.0)
    } else {
        NEUTRAL_PH
    }
}

/// Display band of a pH value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhCategory {
    StronglyAcidic,
    WeaklyAcidic,
    Neutral,
    WeaklyBasic,
    StronglyBasic,
}

impl PhCategory {
    pub fn of(ph: f64) -> Self {
        if ph < 3.0 {
            PhCategory::StronglyAcidic
        } else if ph < 6.0 {
            PhCategory::WeaklyAcidic
        } else if ph < 8.0 {
            PhCategory::Neutral
        } else if ph < 11.0 {
            PhCategory::WeaklyBasic
        } else {
            PhCategory::StronglyBasic
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PhCategory::StronglyAcidic => "Strongly Acidic",
            PhCategory::WeaklyAcidic => "Weakly Acidic",
            PhCategory::Neutral => "Neutral",
            PhCategory::WeaklyBasic => "Weakly Basic",
            PhCategory::StronglyBasic => "Strongly Basic",
        }
    }
}

/// Acid/base behavior of a substance in water
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dissociation {
    StrongAcid,
    StrongBase,
    /// Weak acids and acidic salts
    WeakAcid { ka: f64 },
    /// Weak bases and basic salts
    WeakBase { kb: f64 },
    /// Neutral salts and liquids
    Inert,
}

/// Chemistry table row
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubstanceProps {
    pub dissociation: Dissociation,
    /// g/mol
    pub molar_mass: f64,
    /// H+ or OH- released per mole
    pub equivalents: f64,
}

impl SubstanceProps {
    const fn new(dissociation: Dissociation, molar_mass: f64, equivalents: f64) -> Self {
        SubstanceProps {
            dissociation,
            molar_mass,
            equivalents,
        }
    }
}

use Dissociation::*;

/// Stock substance table, keyed by chemical shelf id
pub static SUBSTANCES: &[(&str, SubstanceProps)] = &[
    ("hcl", SubstanceProps::new(StrongAcid, 36.46, 1.0)),
    ("h2so4", SubstanceProps::new(StrongAcid, 98.08, 2.0)),
    ("hno3", SubstanceProps::new(StrongAcid, 63.01, 1.0)),
    ("ch3cooh", SubstanceProps::new(WeakAcid { ka: 1.8e-5 }, 60.05, 1.0)),
    ("h3po4", SubstanceProps::new(WeakAcid { ka: 7.5e-3 }, 98.00, 1.0)),
    ("h2o2", SubstanceProps::new(WeakAcid { ka: 2.4e-12 }, 34.01, 1.0)),
    ("naoh", SubstanceProps::new(StrongBase, 40.00, 1.0)),
    ("koh", SubstanceProps::new(StrongBase, 56.11, 1.0)),
    ("ca_oh_2", SubstanceProps::new(StrongBase, 74.09, 2.0)),
    ("nh4oh", SubstanceProps::new(WeakBase { kb: 1.8e-5 }, 35.05, 1.0)),
    ("nacl", SubstanceProps::new(Inert, 58.44, 1.0)),
    ("kcl", SubstanceProps::new(Inert, 74.55, 1.0)),
    ("cacl2", SubstanceProps::new(Inert, 110.98, 1.0)),
    ("mgso4", SubstanceProps::new(Inert, 120.37, 1.0)),
    ("na2so4", SubstanceProps::new(Inert, 142.04, 1.0)),
    ("znso4", SubstanceProps::new(Inert, 161.47, 1.0)),
    ("kmno4", SubstanceProps::new(Inert, 158.03, 1.0)),
    ("nh4cl", SubstanceProps::new(WeakAcid { ka: 5.6e-10 }, 53.49, 1.0)),
    ("alum", SubstanceProps::new(WeakAcid { ka: 1.4e-5 }, 474.39, 1.0)),
    ("cuso4", SubstanceProps::new(WeakAcid { ka: 1.0e-7 }, 249.68, 1.0)),
    ("fecl3", SubstanceProps::new(WeakAcid { ka: 6.3e-3 }, 162.20, 1.0)),
    ("feso4", SubstanceProps::new(WeakAcid { ka: 1.0e-7 }, 278.01, 1.0)),
    ("zncl2", SubstanceProps::new(WeakAcid { ka: 2.5e-10 }, 136.30, 1.0)),
    ("k2cr2o7", SubstanceProps::new(WeakAcid { ka: 1.0e-7 }, 294.18, 1.0)),
    ("na2co3", SubstanceProps::new(WeakBase { kb: 2.1e-4 }, 105.99, 1.0)),
    ("nahco3", SubstanceProps::new(WeakBase { kb: 2.3e-8 }, 84.01, 1.0)),
    ("k2co3", SubstanceProps::new(WeakBase { kb: 2.1e-4 }, 138.21, 1.0)),
    ("na3po4", SubstanceProps::new(WeakBase { kb: 2.4e-2 }, 163.94, 1.0)),
    ("ethanol", SubstanceProps::new(Inert, 46.07, 1.0)),
    ("glucose", SubstanceProps::new(Inert, 180.16, 1.0)),
    ("phenolphthalein", SubstanceProps::new(Inert, 318.32, 1.0)),
    ("methyl_orange", SubstanceProps::new(Inert, 327.33, 1.0)),
    ("litmus", SubstanceProps::new(Inert, 300.0, 1.0)),
];

/// Moles and dissociation constant of one weak species
#[derive(Clone, Copy, Debug)]
struct WeakSpecies {
    moles: f64,
    k: f64,
}

/// Equivalence-based acid/base calculator
#[derive(Clone, Debug)]
pub struct AcidBaseCalculator {
    table: HashMap<String, SubstanceProps>,
}

impl Default for AcidBaseCalculator {
    fn default() -> Self {
        AcidBaseCalculator {
            table: SUBSTANCES
                .iter()
                .map(|(id, props)| (id.to_string(), *props))
                .collect(),
        }
    }
}

impl AcidBaseCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a substance
    pub fn with_substance(mut self, id: impl Into<String>, props: SubstanceProps) -> Self {
        self.table.insert(id.into(), props);
        self
    }

    pub fn props(&self, id: &str) -> Option<&SubstanceProps> {
        self.table.get(id)
    }

    fn moles(entry: &ContentEntry, props: &SubstanceProps) -> f64 {
        let amount = entry.effective_amount();
        let molarity = entry
            .concentration
            .filter(|c| c.is_finite() && *c > 0.0)
            .unwrap_or(DEFAULT_MOLARITY);
        match entry.unit {
            Unit::Mol => amount,
            Unit::G => amount / props.molar_mass,
            Unit::Ml => amount / 1000.0 * molarity,
            Unit::Drops => amount * DROP_ML / 1000.0 * molarity,
        }
    }

    /// Solution volume in litres, never below 1 ml
    fn volume_l(contents: &[ContentEntry]) -> f64 {
        let total: f64 = contents
            .iter()
            .map(|entry| {
                let amount = entry.effective_amount();
                match entry.unit {
                    Unit::Ml => amount / 1000.0,
                    Unit::Drops => amount * DROP_ML / 1000.0,
                    Unit::G if entry.phase == Some(Phase::Solid) => amount / 1000.0 * 0.1,
                    Unit::G => 0.0,
                    Unit::Mol => 0.1,
                }
            })
            .sum();
        total.max(MIN_VOLUME_L)
    }

    fn weak_acid_ph(acids: &[WeakSpecies], volume: f64) -> f64 {
        let h: f64 = acids.iter().map(|a| (a.k * a.moles / volume).sqrt()).sum();
        clamp_ph(-h.log10())
    }

    fn weak_base_ph(bases: &[WeakSpecies], volume: f64) -> f64 {
        let oh: f64 = bases.iter().map(|b| (b.k * b.moles / volume).sqrt()).sum();
        clamp_ph(14.0 + oh.log10())
    }

    fn mixed_ph(acids: &[WeakSpecies], bases: &[WeakSpecies], volume: f64) -> f64 {
        let acid_strength: f64 = acids.iter().map(|a| a.moles * a.k).sum();
        let base_strength: f64 = bases.iter().map(|b| b.moles * b.k).sum();

        if acid_strength > base_strength * 10.0 {
            Self::weak_acid_ph(acids, volume)
        } else if base_strength > acid_strength * 10.0 {
            Self::weak_base_ph(bases, volume)
        } else if acid_strength > base_strength {
            6.5
        } else if acid_strength < base_strength {
            7.5
        } else {
            NEUTRAL_PH
        }
    }
}

impl PhCalculator for AcidBaseCalculator {
    fn calculate(&self, contents: &[ContentEntry]) -> f64 {
        if contents.is_empty() {
            return NEUTRAL_PH;
        }

        let volume = Self::volume_l(contents);
        let mut acid_eq = 0.0;
        let mut base_eq = 0.0;
        let mut acids = Vec::new();
        let mut bases = Vec::new();

        for entry in contents {
            let Some(props) = self.table.get(entry.substance.as_str()) else {
                continue;
            };
            let moles = Self::moles(entry, props) * props.equivalents;
            match props.dissociation {
                StrongAcid => acid_eq += moles,
                StrongBase => base_eq += moles,
                WeakAcid { ka } => acids.push(WeakSpecies { moles, k: ka }),
                WeakBase { kb } => bases.push(WeakSpecies { moles, k: kb }),
                Inert => {}
            }
        }

        let net_acid = acid_eq - base_eq;
        if net_acid.abs() > 1e-10 {
            let concentration = net_acid.abs() / volume;
            return if net_acid > 0.0 {
                clamp_ph(-concentration.log10())
            } else {
                clamp_ph(14.0 + concentration.log10())
            };
        }

        match (acids.is_empty(), bases.is_empty()) {
            (false, true) => Self::weak_acid_ph(&acids, volume),
            (true, false) => Self::weak_base_ph(&bases, volume),
            (false, false) => Self::mixed_ph(&acids, &bases, volume),
            (true, true) => NEUTRAL_PH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(id: &str, ml: f64) -> ContentEntry {
        ContentEntry::new(id, ml, Unit::Ml)
    }

    #[test]
    fn test_strong_acid_and_base() {
        let calc = AcidBaseCalculator::new();
        assert_eq!(ph(&[solution("hcl", 10.0)], &calc), 1.0);
        assert_eq!(ph(&[solution("naoh", 10.0)], &calc), 13.0);
    }

    #[test]
    fn test_neutralization() {
        let calc = AcidBaseCalculator::new();
        let contents = [solution("hcl", 10.0), solution("naoh", 10.0)];
        assert_eq!(ph(&contents, &calc), 7.0);

        // 2:1 acid excess: 0.001 mol over 30 ml
        let contents = [solution("hcl", 20.0), solution("naoh", 10.0)];
        assert_eq!(ph(&contents, &calc), 1.5);
    }

    #[test]
    fn test_diprotic_acid_uses_equivalents() {
        let calc = AcidBaseCalculator::new();
        let contents = [solution("h2so4", 10.0).with_concentration(0.05)];
        assert_eq!(ph(&contents, &calc), 1.0);
    }

    #[test]
    fn test_weak_acid() {
        let calc = AcidBaseCalculator::new();
        // sqrt(1.8e-5 * 0.1) = 1.34e-3 -> 2.87
        assert_eq!(ph(&[solution("ch3cooh", 10.0)], &calc), 2.9);
    }

    #[test]
    fn test_weak_base() {
        let calc = AcidBaseCalculator::new();
        assert_eq!(ph(&[solution("nh4oh", 10.0)], &calc), 11.1);
    }

    #[test]
    fn test_neutral_and_unknown() {
        let calc = AcidBaseCalculator::new();
        assert_eq!(ph(&[solution("water", 10.0)], &calc), 7.0);
        assert_eq!(ph(&[solution("nacl", 10.0)], &calc), 7.0);
        assert_eq!(ph(&[], &calc), 0.0);
    }

    #[test]
    fn test_grams_use_molar_mass() {
        let calc = AcidBaseCalculator::new();
        // 0.4 g NaOH = 0.01 mol in 100 ml -> pOH 1
        let contents = [
            ContentEntry::new("naoh", 0.4, Unit::G).with_phase(Phase::Solid),
            solution("water", 100.0),
        ];
        assert_eq!(ph(&contents, &calc), 13.0);
    }

    #[test]
    fn test_closure_calculator() {
        let fixed = |_: &[ContentEntry]| 42.0;
        assert_eq!(ph(&[solution("x", 1.0)], &fixed), 14.0);
        let broken = |_: &[ContentEntry]| f64::NAN;
        assert_eq!(ph(&[solution("x", 1.0)], &broken), 7.0);
    }

    #[test]
    fn test_categories() {
        assert_eq!(PhCategory::of(1.0), PhCategory::StronglyAcidic);
        assert_eq!(PhCategory::of(7.0).label(), "Neutral");
        assert_eq!(PhCategory::of(13.0), PhCategory::StronglyBasic);
    }

    proptest::proptest! {
        #[test]
        fn prop_ph_stays_in_range(
            amounts in proptest::collection::vec((0usize..SUBSTANCES.len(), 0.0f64..500.0), 1..6)
        ) {
            let calc = AcidBaseCalculator::new();
            let contents: Vec<ContentEntry> = amounts
                .iter()
                .map(|&(i, amount)| ContentEntry::new(SUBSTANCES[i].0, amount, Unit::Ml))
                .collect();
            let value = ph(&contents, &calc);
            proptest::prop_assert!((0.0..=14.0).contains(&value));
        }
    }
}
