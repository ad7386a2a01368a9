//! Error types for the lab simulation engine
//!
//! Every failure here is recoverable: commands return these values instead of
//! panicking, and the store is left untouched whenever one is returned.

use std::fmt;

use thiserror::Error;

use crate::{AttachmentId, EquipmentAttachment, EquipmentClass, VesselId};

/// Why an attachment was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConflictReason {
    /// The other heating-group device is already live on the vessel
    HeatingDeviceConflict,
    /// The other motion-group device is already live on the vessel
    MotionDeviceConflict,
    /// Centrifuge and a heater on the same vessel (opt-in policy)
    CentrifugeHeatingConflict,
    /// Same class already live on the vessel
    AlreadyAttached,
}

impl ConflictReason {
    pub fn message(self) -> &'static str {
        match self {
            ConflictReason::HeatingDeviceConflict => "heating device conflict",
            ConflictReason::MotionDeviceConflict => "motion device conflict",
            ConflictReason::CentrifugeHeatingConflict => "centrifuge heating conflict",
            ConflictReason::AlreadyAttached => "already attached",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Exclusivity violation returned by an attach
#[derive(Error, Clone, Debug, PartialEq)]
#[error("cannot attach {class} to {vessel}: {reason}")]
pub struct ConflictError {
    pub class: EquipmentClass,
    pub vessel: VesselId,
    pub reason: ConflictReason,
    /// The live attachment standing in the way
    pub conflicting: Option<EquipmentAttachment>,
}

impl ConflictError {
    pub fn conflicting_id(&self) -> Option<AttachmentId> {
        self.conflicting.as_ref().map(|a| a.id)
    }
}

/// Lab engine errors
#[derive(Error, Clone, Debug, PartialEq)]
pub enum LabError {
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("Attachment not found: {0}")]
    UnknownAttachment(AttachmentId),

    #[error("Vessel not found: {0}")]
    UnknownVessel(VesselId),

    #[error("Command {command} is not supported by {class}")]
    UnsupportedCommand {
        command: &'static str,
        class: EquipmentClass,
    },

    #[error("Setting {field} is not defined for {class}")]
    SettingsMismatch {
        class: EquipmentClass,
        field: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LabError {
    /// Conflict details, if this is an exclusivity rejection
    pub fn as_conflict(&self) -> Option<&ConflictError> {
        match self {
            LabError::Conflict(conflict) => Some(conflict),
            _ => None,
        }
    }
}

/// Result type for lab operations
pub type LabResult<T> = Result<T, LabError>;
