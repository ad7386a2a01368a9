//! Exclusivity validation
//!
//! Decides whether an instrument may go live on a vessel given the
//! attachments already there. Rules are evaluated in order, first match wins:
//!
//! 1. Heating group: the other heater is live on the vessel
//! 2. Motion group: the other motion device is live on the vessel
//! 3. (policy) Centrifuge and a heater on the same vessel
//! 4. The same class is already live on the vessel
//!
//! Anything else is accepted. Validation never mutates.

use labsim_core::{
    Category, ConflictError, ConflictReason, EquipmentAttachment, EquipmentClass, VesselId,
};

/// Optional rules on top of the group rules
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExclusivityPolicy {
    /// Refuse a centrifuge on a heated vessel and a heater on a vessel with a
    /// centrifuge
    pub centrifuge_blocks_heating: bool,
}

impl ExclusivityPolicy {
    /// Group rules plus the centrifuge/heating rule
    pub fn strict() -> Self {
        ExclusivityPolicy {
            centrifuge_blocks_heating: true,
        }
    }
}

/// Outcome of an exclusivity check
#[derive(Clone, Debug, PartialEq)]
pub enum AttachDecision {
    Allowed,
    Rejected {
        reason: ConflictReason,
        conflicting: Option<EquipmentAttachment>,
    },
}

impl AttachDecision {
    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, AttachDecision::Allowed)
    }

    pub fn reason(&self) -> Option<ConflictReason> {
        match self {
            AttachDecision::Allowed => None,
            AttachDecision::Rejected { reason, .. } => Some(*reason),
        }
    }

    /// Turn a rejection into the error returned to callers
    pub fn into_result(self, class: EquipmentClass, vessel: VesselId) -> Result<(), ConflictError> {
        match self {
            AttachDecision::Allowed => Ok(()),
            AttachDecision::Rejected {
                reason,
                conflicting,
            } => Err(ConflictError {
                class,
                vessel,
                reason,
                conflicting,
            }),
        }
    }
}

/// Rule-ordered exclusivity validator
#[derive(Clone, Copy, Debug, Default)]
pub struct ExclusivityValidator {
    policy: ExclusivityPolicy,
}

impl ExclusivityValidator {
    pub fn new(policy: ExclusivityPolicy) -> Self {
        ExclusivityValidator { policy }
    }

    pub fn policy(&self) -> ExclusivityPolicy {
        self.policy
    }

    /// Check whether `class` may go live on `vessel`
    pub fn can_attach<'a, I>(&self, class: EquipmentClass, vessel: VesselId, current: I) -> AttachDecision
    where
        I: IntoIterator<Item = &'a EquipmentAttachment>,
    {
        let live: Vec<&EquipmentAttachment> = current
            .into_iter()
            .filter(|a| a.is_live_on(vessel))
            .collect();

        let reject = |reason, found: Option<&&EquipmentAttachment>| AttachDecision::Rejected {
            reason,
            conflicting: found.map(|a| (*a).clone()),
        };

        if let Some(group) = class.group() {
            let rival = live
                .iter()
                .find(|a| a.class != class && a.class.group() == Some(group));
            if rival.is_some() {
                let reason = match class.category() {
                    Category::Heating => ConflictReason::HeatingDeviceConflict,
                    _ => ConflictReason::MotionDeviceConflict,
                };
                return reject(reason, rival);
            }
        }

        if self.policy.centrifuge_blocks_heating {
            let rival = match class.category() {
                Category::Heating => live.iter().find(|a| a.class == EquipmentClass::Centrifuge),
                _ if class == EquipmentClass::Centrifuge => {
                    live.iter().find(|a| a.category() == Category::Heating)
                }
                _ => None,
            };
            if rival.is_some() {
                return reject(ConflictReason::CentrifugeHeatingConflict, rival);
            }
        }

        let twin = live.iter().find(|a| a.class == class);
        if twin.is_some() {
            return reject(ConflictReason::AlreadyAttached, twin);
        }

        AttachDecision::Allowed
    }
}
