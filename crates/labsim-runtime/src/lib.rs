//! Lab Runtime - sessions and the tick loop
//!
//! This crate implements:
//! - `LabSession`: the command surface (attach, detach, dial, tare, timer)
//! - `LabConfig`: serde-loadable configuration with presets
//! - Tracing setup for embedding hosts
//! - `SharedLab`: a locked handle plus an optional driver thread

pub mod config;
pub mod session;
pub mod shared;
pub mod telemetry;

pub use config::*;
pub use session::*;
pub use shared::*;
pub use telemetry::*;
