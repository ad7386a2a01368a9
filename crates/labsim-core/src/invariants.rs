//! Attachment invariants
//!
//! Laws every attachment list must satisfy after any sequence of commands:
//!
//! 1. **Single Heater** - at most one active heating device per vessel
//! 2. **Single Motion** - at most one active motion device per vessel
//! 3. **Single Class Instance** - a class is active at most once per vessel
//! 4. **Settings Match Class** - settings carry exactly their class's fields
//! 5. **Transient Reset When Inactive** - inactive attachments hold no tare
//!    and a stopped timer at its full duration
//!
//! ```rust
//! use labsim_core::invariants::check_attachments;
//!
//! assert!(check_attachments(&[]).is_empty());
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::{Category, EquipmentAttachment, EquipmentClass, VesselId};

/// One law of the attachment store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentInvariant {
    SingleHeater,
    SingleMotion,
    SingleClassInstance,
    SettingsMatchClass,
    TransientResetWhenInactive,
}

impl AttachmentInvariant {
    pub fn name(&self) -> &'static str {
        match self {
            AttachmentInvariant::SingleHeater => "Single Heater",
            AttachmentInvariant::SingleMotion => "Single Motion",
            AttachmentInvariant::SingleClassInstance => "Single Class Instance",
            AttachmentInvariant::SettingsMatchClass => "Settings Match Class",
            AttachmentInvariant::TransientResetWhenInactive => "Transient Reset When Inactive",
        }
    }

    pub fn all() -> &'static [AttachmentInvariant] {
        &[
            AttachmentInvariant::SingleHeater,
            AttachmentInvariant::SingleMotion,
            AttachmentInvariant::SingleClassInstance,
            AttachmentInvariant::SettingsMatchClass,
            AttachmentInvariant::TransientResetWhenInactive,
        ]
    }
}

impl fmt::Display for AttachmentInvariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Invariant violation
#[derive(Debug, Clone, PartialEq)]
pub struct InvariantViolation {
    pub invariant: AttachmentInvariant,
    pub context: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attachment invariant violated: {} - {}", self.invariant, self.context)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check one invariant against an attachment list
pub fn check_invariant(
    invariant: AttachmentInvariant,
    attachments: &[EquipmentAttachment],
) -> Result<(), String> {
    match invariant {
        AttachmentInvariant::SingleHeater => at_most_one_active(attachments, |a| {
            (a.category() == Category::Heating).then_some(0)
        }),
        AttachmentInvariant::SingleMotion => at_most_one_active(attachments, |a| {
            (a.category() == Category::Motion).then_some(0)
        }),
        AttachmentInvariant::SingleClassInstance => {
            at_most_one_active(attachments, |a| Some(a.class as u8))
        }
        AttachmentInvariant::SettingsMatchClass => attachments
            .iter()
            .find(|a| !a.settings.matches(a.class))
            .map_or(Ok(()), |a| {
                Err(format!("{} carries settings of another class", a.id))
            }),
        AttachmentInvariant::TransientResetWhenInactive => attachments
            .iter()
            .find(|a| !a.active && !a.settings.transient_is_default(a.class))
            .map_or(Ok(()), |a| {
                Err(format!("{} is inactive with live transient settings", a.id))
            }),
    }
}

/// Count active attachments per (vessel, key) and reject any key seen twice
fn at_most_one_active<F>(attachments: &[EquipmentAttachment], key: F) -> Result<(), String>
where
    F: Fn(&EquipmentAttachment) -> Option<u8>,
{
    let mut seen: HashMap<(VesselId, u8), &EquipmentAttachment> = HashMap::new();
    for att in attachments.iter().filter(|a| a.active) {
        let Some(k) = key(att) else { continue };
        if let Some(first) = seen.insert((att.vessel, k), att) {
            return Err(format!(
                "{} and {} are both active on {}",
                first.class, att.class, att.vessel
            ));
        }
    }
    Ok(())
}

/// Check every invariant. Returns the violated ones.
pub fn check_attachments(attachments: &[EquipmentAttachment]) -> Vec<InvariantViolation> {
    AttachmentInvariant::all()
        .iter()
        .filter_map(|&invariant| {
            check_invariant(invariant, attachments)
                .err()
                .map(|context| InvariantViolation { invariant, context })
        })
        .collect()
}

/// Panic on the first violated invariant. Meant for tests and fuzzers.
#[track_caller]
pub fn assert_attachments(attachments: &[EquipmentAttachment]) {
    if let Some(violation) = check_attachments(attachments).into_iter().next() {
        panic!("{}", violation);
    }
}

/// Whether two classes may be live together under the fixed group rules
pub fn classes_compatible(a: EquipmentClass, b: EquipmentClass) -> bool {
    a != b && (a.group().is_none() || a.group() != b.group())
}
