//! Attachment store
//!
//! Owns every equipment attachment of a session. An attachment is created
//! only after the exclusivity validator accepts it, and validation and commit
//! happen under the same `&mut self` borrow.

use std::collections::BTreeMap;

use labsim_core::{
    AttachmentId, ConflictError, EquipmentAttachment, EquipmentClass, LabError, LabResult,
    SettingsPatch, VesselId,
};
use tracing::debug;

use crate::{ExclusivityPolicy, ExclusivityValidator};

/// Attachment registry with exclusivity enforcement
#[derive(Debug, Default)]
pub struct AttachmentStore {
    attachments: BTreeMap<AttachmentId, EquipmentAttachment>,
    last_id: AttachmentId,
    validator: ExclusivityValidator,
}

impl AttachmentStore {
    pub fn new() -> Self {
        AttachmentStore::default()
    }

    pub fn with_policy(policy: ExclusivityPolicy) -> Self {
        AttachmentStore {
            validator: ExclusivityValidator::new(policy),
            ..Default::default()
        }
    }

    pub fn validator(&self) -> &ExclusivityValidator {
        &self.validator
    }

    /// Validate and create an attachment. On rejection nothing changes.
    pub fn attach(
        &mut self,
        class: EquipmentClass,
        vessel: VesselId,
    ) -> Result<AttachmentId, ConflictError> {
        self.validator
            .can_attach(class, vessel, self.attachments.values())
            .into_result(class, vessel)?;

        let id = self.last_id.next();
        self.last_id = id;
        self.attachments
            .insert(id, EquipmentAttachment::new(id, class, vessel));
        debug!(%id, %class, %vessel, "attachment created");
        Ok(id)
    }

    /// Remove an attachment. Unknown ids are a no-op.
    pub fn detach(&mut self, id: AttachmentId) -> Option<EquipmentAttachment> {
        self.attachments.remove(&id)
    }

    /// Remove every attachment bound to `vessel`
    pub fn detach_vessel(&mut self, vessel: VesselId) -> Vec<EquipmentAttachment> {
        let ids: Vec<AttachmentId> = self
            .attachments
            .values()
            .filter(|a| a.vessel == vessel)
            .map(|a| a.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.attachments.remove(&id))
            .collect()
    }

    pub fn get(&self, id: AttachmentId) -> Option<&EquipmentAttachment> {
        self.attachments.get(&id)
    }

    /// Attachment by id, or `UnknownAttachment`
    pub fn require(&self, id: AttachmentId) -> LabResult<&EquipmentAttachment> {
        self.attachments
            .get(&id)
            .ok_or(LabError::UnknownAttachment(id))
    }

    fn require_mut(&mut self, id: AttachmentId) -> LabResult<&mut EquipmentAttachment> {
        self.attachments
            .get_mut(&id)
            .ok_or(LabError::UnknownAttachment(id))
    }

    /// Partial settings merge. Fields the class does not define are rejected
    /// and leave the record untouched. An inactive attachment only keeps
    /// dial changes.
    pub fn update_settings(&mut self, id: AttachmentId, patch: &SettingsPatch) -> LabResult<()> {
        let att = self.require_mut(id)?;
        att.settings.merge(att.class, patch)?;
        if !att.active {
            att.settings.reset_transient(att.class);
        }
        Ok(())
    }

    /// Store `true_weight` as the balance tare offset
    pub fn tare(&mut self, id: AttachmentId, true_weight: f64) -> LabResult<f64> {
        let class = self.require(id)?.class;
        if class != EquipmentClass::AnalyticalBalance {
            return Err(LabError::UnsupportedCommand {
                command: "tare",
                class,
            });
        }
        self.update_settings(id, &SettingsPatch::tare_offset(true_weight))?;
        Ok(self
            .get(id)
            .and_then(|a| a.settings.tare_offset())
            .unwrap_or(0.0))
    }

    /// Attachments bound to `vessel`, in creation order
    pub fn list(&self, vessel: VesselId) -> Vec<&EquipmentAttachment> {
        self.attachments
            .values()
            .filter(|a| a.vessel == vessel)
            .collect()
    }

    /// Active attachments bound to `vessel`
    pub fn active_on(&self, vessel: VesselId) -> impl Iterator<Item = &EquipmentAttachment> {
        self.attachments
            .values()
            .filter(move |a| a.is_live_on(vessel))
    }

    /// The live attachment of `class` on `vessel`, if any
    pub fn find_active(&self, vessel: VesselId, class: EquipmentClass) -> Option<&EquipmentAttachment> {
        self.active_on(vessel).find(|a| a.class == class)
    }

    /// Write the latest derived readings into the read-only settings fields
    pub fn mirror_readings(
        &mut self,
        vessel: VesselId,
        ph: Option<f64>,
        temperature: Option<f64>,
        weight: f64,
    ) {
        for att in self.attachments.values_mut().filter(|a| a.vessel == vessel) {
            att.settings.mirror_readings(ph, temperature, weight);
        }
    }

    /// Take an attachment offline without destroying it. Returns whether the
    /// active flag changed.
    pub fn deactivate(&mut self, id: AttachmentId) -> LabResult<bool> {
        let att = self.require_mut(id)?;
        if !att.active {
            return Ok(false);
        }
        att.deactivate();
        Ok(true)
    }

    /// Bring an attachment back online, re-running exclusivity validation.
    /// Returns whether the active flag changed.
    pub fn activate(&mut self, id: AttachmentId) -> LabResult<bool> {
        let (class, vessel, active) = {
            let att = self.require(id)?;
            (att.class, att.vessel, att.active)
        };
        if active {
            return Ok(false);
        }

        self.validator
            .can_attach(
                class,
                vessel,
                self.attachments.values().filter(|a| a.id != id),
            )
            .into_result(class, vessel)?;

        self.require_mut(id)?.active = true;
        Ok(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EquipmentAttachment> {
        self.attachments.values()
    }

    /// Owned copy of every attachment, for invariant checks
    pub fn snapshot(&self) -> Vec<EquipmentAttachment> {
        self.attachments.values().cloned().collect()
    }

    #[inline]
    pub fn contains(&self, id: AttachmentId) -> bool {
        self.attachments.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labsim_core::invariants::check_attachments;
    use labsim_core::{ConflictReason, Settings, TimerMode};
    use proptest::prelude::*;

    const V1: VesselId = VesselId(1);
    const V2: VesselId = VesselId(2);

    #[test]
    fn test_attach_then_conflict_leaves_store_unchanged() {
        let mut store = AttachmentStore::new();
        let burner = store.attach(EquipmentClass::BunsenBurner, V1).unwrap();
        let before = store.snapshot();

        let err = store.attach(EquipmentClass::HotPlate, V1).unwrap_err();
        assert_eq!(err.reason, ConflictReason::HeatingDeviceConflict);
        assert_eq!(err.conflicting_id(), Some(burner));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_detach_is_idempotent() {
        let mut store = AttachmentStore::new();
        let id = store.attach(EquipmentClass::Thermometer, V1).unwrap();

        assert!(store.detach(id).is_some());
        assert!(store.detach(id).is_none());
        assert!(store.detach(AttachmentId::new(99)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut store = AttachmentStore::new();
        let a = store.attach(EquipmentClass::Timer, V1).unwrap();
        store.detach(a);
        let b = store.attach(EquipmentClass::Timer, V1).unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_detach_vessel() {
        let mut store = AttachmentStore::new();
        store.attach(EquipmentClass::Timer, V1).unwrap();
        store.attach(EquipmentClass::PhMeter, V1).unwrap();
        let other = store.attach(EquipmentClass::PhMeter, V2).unwrap();

        assert_eq!(store.detach_vessel(V1).len(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.contains(other));
    }

    #[test]
    fn test_update_settings_partial_merge() {
        let mut store = AttachmentStore::new();
        let id = store.attach(EquipmentClass::Timer, V1).unwrap();

        store
            .update_settings(id, &SettingsPatch::default().with_mode(TimerMode::Countup))
            .unwrap();
        let err = store
            .update_settings(id, &SettingsPatch::tare_offset(2.0))
            .unwrap_err();
        assert!(matches!(err, LabError::SettingsMismatch { field: "tareOffset", .. }));

        match &store.require(id).unwrap().settings {
            Settings::Timer {
                mode,
                time_remaining,
                ..
            } => {
                assert_eq!(*mode, TimerMode::Countup);
                assert_eq!(*time_remaining, 300.0);
            }
            other => panic!("unexpected settings {other:?}"),
        }
    }

    #[test]
    fn test_tare_only_on_balance() {
        let mut store = AttachmentStore::new();
        let balance = store.attach(EquipmentClass::AnalyticalBalance, V1).unwrap();
        let meter = store.attach(EquipmentClass::PhMeter, V1).unwrap();

        assert_eq!(store.tare(balance, 15.3).unwrap(), 15.3);
        assert_eq!(
            store.tare(meter, 15.3),
            Err(LabError::UnsupportedCommand {
                command: "tare",
                class: EquipmentClass::PhMeter
            })
        );
    }

    #[test]
    fn test_reactivation_is_validated() {
        let mut store = AttachmentStore::new();
        let burner = store.attach(EquipmentClass::BunsenBurner, V1).unwrap();
        assert!(store.deactivate(burner).unwrap());
        assert!(!store.deactivate(burner).unwrap());

        let plate = store.attach(EquipmentClass::HotPlate, V1).unwrap();
        let err = store.activate(burner).unwrap_err();
        assert_eq!(
            err.as_conflict().map(|c| c.reason),
            Some(ConflictReason::HeatingDeviceConflict)
        );

        store.detach(plate);
        assert!(store.activate(burner).unwrap());
        assert!(!store.activate(burner).unwrap());
    }

    #[test]
    fn test_deactivate_resets_tare() {
        let mut store = AttachmentStore::new();
        let id = store.attach(EquipmentClass::AnalyticalBalance, V1).unwrap();
        store.tare(id, 4.0).unwrap();
        store.deactivate(id).unwrap();
        assert_eq!(store.require(id).unwrap().settings.tare_offset(), Some(0.0));

        // Taring a switched-off balance does not stick
        assert_eq!(store.tare(id, 4.0).unwrap(), 0.0);
    }

    #[test]
    fn test_inactive_timer_keeps_dial() {
        let mut store = AttachmentStore::new();
        let id = store.attach(EquipmentClass::Timer, V1).unwrap();
        store.deactivate(id).unwrap();
        store
            .update_settings(id, &SettingsPatch::setpoint(10.0).with_running(true))
            .unwrap();

        let settings = &store.require(id).unwrap().settings;
        assert_eq!(settings.setpoint(), Some(10.0));
        assert!(settings.transient_is_default(EquipmentClass::Timer));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Attach(usize, u64),
        Detach(u64),
        Deactivate(u64),
        Activate(u64),
        Tare(u64, f64),
        Dial(u64, f64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..EquipmentClass::all().len(), 1u64..4).prop_map(|(c, v)| Op::Attach(c, v)),
            (1u64..30).prop_map(Op::Detach),
            (1u64..30).prop_map(Op::Deactivate),
            (1u64..30).prop_map(Op::Activate),
            (1u64..30, 0.0f64..300.0).prop_map(|(id, w)| Op::Tare(id, w)),
            (1u64..30, -100.0f64..6000.0).prop_map(|(id, v)| Op::Dial(id, v)),
        ]
    }

    proptest! {
        #[test]
        fn prop_invariants_hold_under_any_sequence(
            ops in proptest::collection::vec(op_strategy(), 0..60),
            strict in any::<bool>(),
        ) {
            let policy = ExclusivityPolicy { centrifuge_blocks_heating: strict };
            let mut store = AttachmentStore::with_policy(policy);

            for op in ops {
                match op {
                    Op::Attach(c, v) => {
                        let _ = store.attach(EquipmentClass::all()[c], VesselId(v));
                    }
                    Op::Detach(id) => {
                        store.detach(AttachmentId(id));
                    }
                    Op::Deactivate(id) => {
                        let _ = store.deactivate(AttachmentId(id));
                    }
                    Op::Activate(id) => {
                        let _ = store.activate(AttachmentId(id));
                    }
                    Op::Tare(id, w) => {
                        let _ = store.tare(AttachmentId(id), w);
                    }
                    Op::Dial(id, v) => {
                        let _ = store.update_settings(AttachmentId(id), &SettingsPatch::setpoint(v));
                    }
                }
                let violations = check_attachments(&store.snapshot());
                prop_assert!(violations.is_empty(), "{:?}", violations);
            }
        }
    }
}
