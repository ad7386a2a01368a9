//! Lab Quantities - derivation of vessel readings from contents
//!
//! Every function here is pure. Readings are recomputed on each call from
//! the vessel's content list and its live attachments; nothing is cached.
//!
//! - Weight: mass balance over the content list
//! - Temperature: room temperature shifted by live heaters and stirrers
//! - pH: delegated to a pluggable `PhCalculator`

pub mod weight;
pub mod temperature;
pub mod ph;
pub mod derivation;

pub use weight::*;
pub use temperature::*;
pub use ph::*;
pub use derivation::*;

/// Round to one decimal place
#[inline]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
