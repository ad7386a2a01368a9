//! Lab Core - Fundamental types for the equipment simulation engine
//!
//! This crate defines the types shared by every layer:
//! - Identifiers (VesselId, AttachmentId)
//! - Lab time (LabTime)
//! - The static equipment catalog (EquipmentClass, Category, ClassConfig)
//! - Vessels and their chemical contents
//! - Attachments with class-tagged settings
//! - The error taxonomy and the attachment invariants

pub mod id;
pub mod time;
pub mod catalog;
pub mod vessel;
pub mod settings;
pub mod attachment;
pub mod error;
pub mod invariants;

pub use id::*;
pub use time::*;
pub use catalog::*;
pub use vessel::*;
pub use settings::*;
pub use attachment::*;
pub use error::*;
