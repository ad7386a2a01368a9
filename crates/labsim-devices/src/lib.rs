//! Lab Devices - per-instrument physical simulation
//!
//! Each instrument class owns a small state machine layered on top of the
//! derived vessel readings:
//! - Heaters and stirrer: stateless, output follows the dial
//! - Centrifuge: lid sequence and time-based layer separation
//! - pH meter and thermometer: calibration, jittering settle, stable reading
//! - Analytical balance: calibration, damped reading, overload detection
//! - Timer: elapsed time banked across running spans, immune to pause drift
//!
//! Simulators never read vessels or stores directly. The session hands them
//! freshly derived values on every evaluation through [`DeviceInputs`].

pub mod config;
pub mod intensity;
pub mod heating;
pub mod stirrer;
pub mod centrifuge;
pub mod probe;
pub mod ph_meter;
pub mod thermometer;
pub mod balance;
pub mod timer;
pub mod display;
pub mod simulator;

pub use config::*;
pub use intensity::*;
pub use heating::*;
pub use stirrer::*;
pub use centrifuge::*;
pub use probe::*;
pub use ph_meter::*;
pub use thermometer::*;
pub use balance::*;
pub use timer::*;
pub use display::*;
pub use simulator::*;
