//! Lab State - the mutable registries of a lab session
//!
//! This crate implements:
//! - Vessel registry (the single source of truth for contents)
//! - Exclusivity validation (pure, rule-ordered)
//! - Attachment store (validate-then-commit, monotonic ids)

pub mod vessels;
pub mod exclusivity;
pub mod attachments;

pub use vessels::*;
pub use exclusivity::*;
pub use attachments::*;
