//! Vessel registry

use std::collections::BTreeMap;

use labsim_core::{ContentEntry, LabError, LabResult, LiquidLayer, Vessel, VesselId};

/// All vessels on the lab table, keyed by id
#[derive(Debug, Default)]
pub struct VesselStore {
    vessels: BTreeMap<VesselId, Vessel>,
    last_id: VesselId,
}

impl VesselStore {
    pub fn new() -> Self {
        VesselStore::default()
    }

    /// Place an empty vessel on the table
    pub fn add_vessel(&mut self) -> VesselId {
        let id = self.last_id.next();
        self.last_id = id;
        self.vessels.insert(id, Vessel::new(id));
        id
    }

    pub fn add_labeled_vessel(&mut self, label: impl Into<String>) -> VesselId {
        let id = self.add_vessel();
        if let Some(vessel) = self.vessels.get_mut(&id) {
            vessel.label = Some(label.into());
        }
        id
    }

    /// Remove a vessel. Attachments bound to it are the caller's to drop.
    pub fn remove_vessel(&mut self, id: VesselId) -> Option<Vessel> {
        self.vessels.remove(&id)
    }

    pub fn get(&self, id: VesselId) -> Option<&Vessel> {
        self.vessels.get(&id)
    }

    /// Vessel by id, or `UnknownVessel`
    pub fn require(&self, id: VesselId) -> LabResult<&Vessel> {
        self.vessels.get(&id).ok_or(LabError::UnknownVessel(id))
    }

    fn require_mut(&mut self, id: VesselId) -> LabResult<&mut Vessel> {
        self.vessels.get_mut(&id).ok_or(LabError::UnknownVessel(id))
    }

    pub fn add_content(&mut self, id: VesselId, entry: ContentEntry) -> LabResult<()> {
        self.require_mut(id)?.add_content(entry);
        Ok(())
    }

    pub fn clear_contents(&mut self, id: VesselId) -> LabResult<()> {
        self.require_mut(id)?.clear_contents();
        Ok(())
    }

    /// Replace the visible liquid layers used for phase separation
    pub fn set_layers(&mut self, id: VesselId, layers: Vec<LiquidLayer>) -> LabResult<()> {
        self.require_mut(id)?.set_layers(layers);
        Ok(())
    }

    #[inline]
    pub fn contains(&self, id: VesselId) -> bool {
        self.vessels.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = VesselId> + '_ {
        self.vessels.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vessel> {
        self.vessels.values()
    }
}
