//! Vessel weight

use labsim_core::{ContentEntry, Unit};

/// Volume of one drop in ml
pub const DROP_ML: f64 = 0.05;

/// Grams contributed by one content entry (density taken as 1 g/ml)
#[inline]
pub fn entry_weight(entry: &ContentEntry) -> f64 {
    let amount = entry.effective_amount();
    match entry.unit {
        Unit::G | Unit::Ml => amount,
        Unit::Drops => amount * DROP_ML,
        Unit::Mol => 0.0,
    }
}

/// Total weight in grams. Zero for an empty vessel.
pub fn weight(contents: &[ContentEntry]) -> f64 {
    contents.iter().map(entry_weight).sum()
}
