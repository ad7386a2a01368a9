//! Lab Time - clocks and scheduling for the equipment simulators
//!
//! This crate implements:
//! - The `Clock` seam (system clock for hosts, manual clock for tests)
//! - `TickDriver`: one bounded-rate tick source, suspended while hidden
//! - Phase timers for fixed-delay transitions (calibration, lid motion)

pub mod clock;
pub mod driver;
pub mod phase;

pub use clock::*;
pub use driver::*;
pub use phase::*;
