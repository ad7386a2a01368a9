//! LabSim Test Harness - Scenario scripting and command fuzzing
//!
//! This crate provides:
//! - A manual-clock harness around a lab session
//! - Scripted scenarios with per-step invariant checks
//! - Randomized command fuzzing
//! - End-to-end bench scenarios

pub mod scenario;
pub mod fuzzer;
pub mod integration;

pub use scenario::*;
pub use fuzzer::*;
pub use integration::*;
