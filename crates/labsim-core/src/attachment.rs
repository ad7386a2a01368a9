//! Equipment attachment - one instrument bound to one vessel

use crate::{AttachmentId, Category, EquipmentClass, Settings, VesselId};

/// Binding of an instrument class to a vessel
#[derive(Clone, Debug, PartialEq)]
pub struct EquipmentAttachment {
    pub id: AttachmentId,
    pub class: EquipmentClass,
    pub vessel: VesselId,
    pub active: bool,
    pub settings: Settings,
}

impl EquipmentAttachment {
    /// Create an active attachment with class-default settings
    pub fn new(id: AttachmentId, class: EquipmentClass, vessel: VesselId) -> Self {
        EquipmentAttachment {
            id,
            class,
            vessel,
            active: true,
            settings: Settings::defaults_for(class),
        }
    }

    #[inline]
    pub fn category(&self) -> Category {
        self.class.category()
    }

    /// Active and bound to `vessel`
    #[inline]
    pub fn is_live_on(&self, vessel: VesselId) -> bool {
        self.active && self.vessel == vessel
    }

    /// Mark inactive and drop the fields that only exist while active
    pub fn deactivate(&mut self) {
        self.active = false;
        self.settings.reset_transient(self.class);
    }
}
