//! Lab session - the command surface of the equipment engine
//!
//! A session owns the vessel registry, the attachment store and one device
//! simulator per attachment. Every command is a `&mut self` call, so
//! validation and commit can never interleave with a tick.
//!
//! Per tick:
//! 1. Poll the tick driver (nothing happens while hidden or too early)
//! 2. Derive the readings of every vessel that carries equipment
//! 3. Advance each simulator with its vessel's fresh readings
//! 4. Mirror readings and timer state back into attachment settings

use std::collections::BTreeMap;

use labsim_core::{
    AttachmentId, EquipmentAttachment, EquipmentClass, LabError, LabResult, LabTime, Settings,
    SettingsPatch, Vessel, VesselId,
};
use labsim_devices::{
    DegradedState, DeviceConfig, DeviceInputs, DeviceSimulator, DisplayState, TimerCommand,
    TimerDisplay,
};
use labsim_quantities::{derive, AcidBaseCalculator, DerivedQuantities, PhCalculator};
use labsim_state::{AttachmentStore, ExclusivityPolicy, VesselStore};
use labsim_time::{Clock, SystemClock, Tick, TickConfig, TickDriver, TickStats};
use tracing::{debug, info, warn};

use crate::LabConfig;

/// One lab table: vessels, attached instruments and their simulators
pub struct LabSession {
    clock: Box<dyn Clock>,
    calculator: Box<dyn PhCalculator>,
    vessels: VesselStore,
    attachments: AttachmentStore,
    simulators: BTreeMap<AttachmentId, DeviceSimulator>,
    driver: TickDriver,
    devices: DeviceConfig,
}

impl LabSession {
    /// Session on the wall clock with default settings
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        LabSession {
            clock: Box::new(clock),
            calculator: Box::new(AcidBaseCalculator::new()),
            vessels: VesselStore::new(),
            attachments: AttachmentStore::new(),
            simulators: BTreeMap::new(),
            driver: TickDriver::new(),
            devices: DeviceConfig::default(),
        }
    }

    /// Session configured from a validated [`LabConfig`]
    pub fn from_config(config: &LabConfig, clock: impl Clock + 'static) -> LabResult<Self> {
        config.validate()?;
        Ok(Self::with_clock(clock)
            .with_tick_config(config.tick_config())
            .with_devices(config.device_config())
            .with_policy(config.exclusivity_policy()))
    }

    pub fn with_calculator(mut self, calculator: impl PhCalculator + 'static) -> Self {
        self.calculator = Box::new(calculator);
        self
    }

    pub fn with_devices(mut self, devices: DeviceConfig) -> Self {
        self.devices = devices;
        self
    }

    pub fn with_tick_config(mut self, config: TickConfig) -> Self {
        self.driver = TickDriver::with_config(config);
        self
    }

    /// Only valid before anything is attached
    pub fn with_policy(mut self, policy: ExclusivityPolicy) -> Self {
        self.attachments = AttachmentStore::with_policy(policy);
        self
    }

    #[inline]
    pub fn now(&self) -> LabTime {
        self.clock.now()
    }

    // --- Vessel registry ---

    pub fn vessels(&self) -> &VesselStore {
        &self.vessels
    }

    /// Mutable vessel registry. Readings follow the new contents on the
    /// next tick or snapshot.
    pub fn vessels_mut(&mut self) -> &mut VesselStore {
        &mut self.vessels
    }

    pub fn add_vessel(&mut self) -> VesselId {
        self.vessels.add_vessel()
    }

    /// Remove a vessel together with every attachment bound to it
    pub fn remove_vessel(&mut self, vessel: VesselId) -> Option<Vessel> {
        let removed = self.vessels.remove_vessel(vessel)?;
        for att in self.attachments.detach_vessel(vessel) {
            self.simulators.remove(&att.id);
            info!(id = %att.id, class = %att.class, %vessel, "equipment detached with vessel");
        }
        Some(removed)
    }

    // --- Attachments ---

    pub fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }

    pub fn attachment(&self, id: AttachmentId) -> LabResult<&EquipmentAttachment> {
        self.attachments.require(id)
    }

    pub fn list_attachments(&self, vessel: VesselId) -> Vec<&EquipmentAttachment> {
        self.attachments.list(vessel)
    }

    /// Attach an instrument. A rejection leaves the session untouched and
    /// names the conflicting attachment.
    pub fn attach_equipment(
        &mut self,
        class: EquipmentClass,
        vessel: VesselId,
    ) -> LabResult<AttachmentId> {
        self.vessels.require(vessel)?;

        let id = match self.attachments.attach(class, vessel) {
            Ok(id) => id,
            Err(conflict) => {
                warn!(
                    %class,
                    %vessel,
                    reason = %conflict.reason,
                    conflicting = ?conflict.conflicting_id(),
                    "attach rejected"
                );
                return Err(conflict.into());
            }
        };

        let now = self.now();
        self.simulators
            .insert(id, DeviceSimulator::new(class, id, now, &self.devices));
        self.sync_vessel(vessel, now);
        info!(%id, %class, %vessel, "equipment attached");
        Ok(id)
    }

    /// Detach an instrument. Unknown or already detached ids are a no-op.
    pub fn detach_equipment(&mut self, id: AttachmentId) -> Option<EquipmentAttachment> {
        let att = self.attachments.detach(id)?;
        self.simulators.remove(&id);
        let now = self.now();
        self.sync_vessel(att.vessel, now);
        info!(%id, class = %att.class, vessel = %att.vessel, "equipment detached");
        Some(att)
    }

    /// Switch an instrument off without removing it
    pub fn deactivate_equipment(&mut self, id: AttachmentId) -> LabResult<bool> {
        if !self.attachments.deactivate(id)? {
            return Ok(false);
        }
        let now = self.now();
        if let Some(sim) = self.simulators.get_mut(&id) {
            sim.deactivate(now);
        }
        let vessel = self.attachments.require(id)?.vessel;
        self.sync_vessel(vessel, now);
        info!(%id, "equipment deactivated");
        Ok(true)
    }

    /// Switch an instrument back on. Exclusivity is checked again.
    pub fn activate_equipment(&mut self, id: AttachmentId) -> LabResult<bool> {
        let changed = self.attachments.activate(id).map_err(|e| {
            if let Some(conflict) = e.as_conflict() {
                warn!(%id, reason = %conflict.reason, "activation rejected");
            }
            e
        })?;
        if !changed {
            return Ok(false);
        }
        let now = self.now();
        if let Some(sim) = self.simulators.get_mut(&id) {
            sim.activate(now);
        }
        let vessel = self.attachments.require(id)?.vessel;
        self.sync_vessel(vessel, now);
        info!(%id, "equipment activated");
        Ok(true)
    }

    /// Turn the dial. The value is clamped to the class range; the stored
    /// setpoint is returned.
    pub fn set_setpoint(&mut self, id: AttachmentId, value: f64) -> LabResult<f64> {
        self.update_settings(id, &SettingsPatch::setpoint(value))?;
        let att = self.attachments.require(id)?;
        debug!(%id, requested = value, stored = ?att.settings.setpoint(), "setpoint changed");
        Ok(att.settings.setpoint().unwrap_or(0.0))
    }

    /// Partial settings update. Timer fields drive the timer simulator:
    /// a new setpoint reloads the face, `time_remaining` seeks and
    /// `is_running` pauses or resumes.
    pub fn update_settings(&mut self, id: AttachmentId, patch: &SettingsPatch) -> LabResult<()> {
        self.attachments.update_settings(id, patch)?;

        let now = self.now();
        let att = self.attachments.require(id)?;
        let vessel = att.vessel;
        if let (
            Some(timer),
            Settings::Timer {
                duration_secs,
                time_remaining,
                mode,
                ..
            },
        ) = (
            self.simulators.get_mut(&id).and_then(|s| s.timer_mut()),
            &att.settings,
        ) {
            if att.active {
                if patch.setpoint.is_some() {
                    timer.reload(now);
                }
                if patch.time_remaining.is_some() {
                    timer.seek(now, *mode, *duration_secs, *time_remaining);
                }
                match patch.is_running {
                    Some(true) => timer.resume(now),
                    Some(false) => timer.pause(now),
                    None => {}
                }
            }
        }

        self.sync_vessel(vessel, now);
        Ok(())
    }

    /// Zero the balance on the current true weight
    pub fn tare(&mut self, id: AttachmentId) -> LabResult<f64> {
        let vessel = self.attachments.require(id)?.vessel;
        let weight = self.derived_quantities(vessel)?.weight;
        let offset = self.attachments.tare(id, weight)?;
        info!(%id, tare = offset, "balance tared");
        Ok(offset)
    }

    /// Pause, resume or reset a timer
    pub fn timer_control(&mut self, id: AttachmentId, command: TimerCommand) -> LabResult<TimerDisplay> {
        let att = self.attachments.require(id)?;
        if att.class != EquipmentClass::Timer {
            return Err(LabError::UnsupportedCommand {
                command: "timer_control",
                class: att.class,
            });
        }
        let (vessel, active) = (att.vessel, att.active);

        let now = self.now();
        let timer = self
            .simulators
            .get_mut(&id)
            .and_then(|s| s.timer_mut())
            .ok_or(LabError::UnknownAttachment(id))?;
        if active || command != TimerCommand::Resume {
            timer.apply(command, now);
        } else {
            debug!(%id, "resume ignored on inactive timer");
        }
        debug!(%id, ?command, "timer command");

        self.sync_vessel(vessel, now);
        self.timer_display(id, now)
    }

    fn timer_display(&self, id: AttachmentId, now: LabTime) -> LabResult<TimerDisplay> {
        let att = self.attachments.require(id)?;
        match (self.simulators.get(&id).and_then(|s| s.timer()), &att.settings) {
            (
                Some(timer),
                Settings::Timer {
                    mode,
                    duration_secs,
                    ..
                },
            ) => Ok(timer.snapshot(now, *mode, *duration_secs)),
            _ => Err(LabError::UnsupportedCommand {
                command: "timer_control",
                class: att.class,
            }),
        }
    }

    // --- Readings ---

    /// Current readings of a vessel, computed from its contents
    pub fn derived_quantities(&self, vessel: VesselId) -> LabResult<DerivedQuantities> {
        let v = self.vessels.require(vessel)?;
        Ok(derive(
            v,
            self.attachments.active_on(vessel),
            self.calculator.as_ref(),
        ))
    }

    /// What an instrument shows right now
    pub fn display_state(&self, id: AttachmentId) -> LabResult<DisplayState> {
        let att = self.attachments.require(id)?;
        let sim = self
            .simulators
            .get(&id)
            .ok_or(LabError::UnknownAttachment(id))?;
        let vessel = self.vessels.require(att.vessel)?;
        let inputs = DeviceInputs {
            now: self.now(),
            quantities: self.derived_quantities(att.vessel)?,
            settings: &att.settings,
            layers: vessel.layers(),
        };
        Ok(sim.snapshot(&inputs, att.active))
    }

    /// Instruments currently in a degraded state
    pub fn degraded_states(&self) -> Vec<(AttachmentId, DegradedState)> {
        self.attachments
            .iter()
            .filter_map(|att| {
                let state = self.display_state(att.id).ok()?.degraded()?;
                Some((att.id, state))
            })
            .collect()
    }

    // --- Ticking ---

    /// Advance the simulation if the driver has a tick due
    pub fn tick(&mut self) -> Option<Tick> {
        let now = self.now();
        let tick = self.driver.poll(now)?;
        self.step(tick.now);
        Some(tick)
    }

    /// Advance now, regardless of the tick interval. Hidden sessions still
    /// drop the tick.
    pub fn force_tick(&mut self) -> Option<Tick> {
        let now = self.now();
        let tick = self.driver.force(now)?;
        self.step(tick.now);
        Some(tick)
    }

    /// Visibility signal from the host. Hidden sessions drop ticks.
    pub fn set_visible(&mut self, visible: bool) {
        if visible != self.driver.is_visible() {
            info!(visible, "lab visibility changed");
        }
        self.driver.set_visible(visible);
    }

    pub fn is_visible(&self) -> bool {
        self.driver.is_visible()
    }

    pub fn tick_stats(&self) -> TickStats {
        self.driver.stats()
    }

    fn step(&mut self, now: LabTime) {
        let vessels: Vec<VesselId> = self.vessels.ids().collect();
        for vessel in vessels {
            let Ok(quantities) = self.derived_quantities(vessel) else {
                continue;
            };
            let Some(v) = self.vessels.get(vessel) else {
                continue;
            };

            for att in self.attachments.list(vessel) {
                let Some(sim) = self.simulators.get_mut(&att.id) else {
                    continue;
                };
                let inputs = DeviceInputs {
                    now,
                    quantities,
                    settings: &att.settings,
                    layers: v.layers(),
                };
                let degraded_before = sim.snapshot(&inputs, att.active).degraded();
                sim.tick(&inputs, att.active);

                let degraded_after = sim.snapshot(&inputs, att.active).degraded();
                if degraded_after != degraded_before {
                    if let Some(state) = degraded_after {
                        warn!(id = %att.id, class = %att.class, %state, "instrument degraded");
                    } else {
                        info!(id = %att.id, class = %att.class, "instrument recovered");
                    }
                }
            }

            self.sync_vessel(vessel, now);
        }
    }

    /// Mirror readings and timer state into the settings of a vessel's
    /// attachments
    fn sync_vessel(&mut self, vessel: VesselId, now: LabTime) {
        let quantities = self
            .derived_quantities(vessel)
            .unwrap_or(DerivedQuantities::EMPTY);
        self.attachments.mirror_readings(
            vessel,
            quantities.ph_reading(),
            quantities.temperature.celsius(),
            quantities.weight,
        );

        let timers: Vec<AttachmentId> = self
            .attachments
            .active_on(vessel)
            .filter(|a| a.class == EquipmentClass::Timer)
            .map(|a| a.id)
            .collect();
        for id in timers {
            let Ok(shown) = self.timer_display(id, now) else {
                continue;
            };
            let patch = SettingsPatch::default()
                .with_time_remaining(shown.shown_secs)
                .with_running(shown.is_running);
            if let Err(e) = self.attachments.update_settings(id, &patch) {
                warn!(%id, error = %e, "timer mirror failed");
            }
        }
    }
}

impl Default for LabSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LabSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabSession")
            .field("vessels", &self.vessels.len())
            .field("attachments", &self.attachments.len())
            .field("visible", &self.driver.is_visible())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labsim_core::invariants::check_attachments;
    use labsim_core::{ConflictReason, ContentEntry, LiquidLayer, TimerMode, Unit};
    use labsim_devices::{BalancePhase, CentrifugePhase, ProbePhase, TimerPhase};
    use labsim_quantities::Temperature;
    use labsim_time::ManualClock;
    use std::time::Duration;

    fn session() -> (LabSession, ManualClock) {
        let clock = ManualClock::new();
        let lab = LabSession::with_clock(clock.clone()).with_devices(DeviceConfig::seeded(11));
        (lab, clock)
    }

    /// Advance the clock in 100 ms ticks
    fn run(lab: &mut LabSession, clock: &ManualClock, ms: u64) {
        for _ in 0..ms / 100 {
            clock.advance_millis(100);
            lab.tick();
        }
    }

    #[test]
    fn test_unknown_vessel() {
        let (mut lab, _) = session();
        let err = lab
            .attach_equipment(EquipmentClass::Timer, VesselId::new(9))
            .unwrap_err();
        assert_eq!(err, LabError::UnknownVessel(VesselId::new(9)));
    }

    #[test]
    fn test_heater_conflict_leaves_session_unchanged() {
        let (mut lab, _) = session();
        let v = lab.add_vessel();
        let burner = lab.attach_equipment(EquipmentClass::BunsenBurner, v).unwrap();
        let before = lab.attachments().snapshot();

        let err = lab.attach_equipment(EquipmentClass::HotPlate, v).unwrap_err();
        let conflict = err.as_conflict().unwrap();
        assert_eq!(conflict.reason, ConflictReason::HeatingDeviceConflict);
        assert_eq!(conflict.conflicting_id(), Some(burner));
        assert_eq!(lab.attachments().snapshot(), before);
    }

    #[test]
    fn test_detach_twice_is_noop() {
        let (mut lab, _) = session();
        let v = lab.add_vessel();
        let id = lab.attach_equipment(EquipmentClass::PhMeter, v).unwrap();
        assert!(lab.detach_equipment(id).is_some());
        assert!(lab.detach_equipment(id).is_none());
        assert!(matches!(
            lab.display_state(id),
            Err(LabError::UnknownAttachment(_))
        ));
    }

    #[test]
    fn test_burner_heats_contents() {
        let (mut lab, _) = session();
        let v = lab.add_vessel();
        lab.vessels_mut()
            .add_content(v, ContentEntry::new("water", 50.0, Unit::Ml))
            .unwrap();
        let burner = lab.attach_equipment(EquipmentClass::BunsenBurner, v).unwrap();
        assert_eq!(lab.set_setpoint(burner, 400.0).unwrap(), 400.0);

        let q = lab.derived_quantities(v).unwrap();
        assert_eq!(q.temperature, Temperature::Celsius(135.0));

        // Detaching the heater drops the vessel back to room temperature
        lab.detach_equipment(burner);
        let q = lab.derived_quantities(v).unwrap();
        assert_eq!(q.temperature, Temperature::Celsius(25.0));
    }

    #[test]
    fn test_empty_vessel_ignores_heaters() {
        let (mut lab, _) = session();
        let v = lab.add_vessel();
        let plate = lab.attach_equipment(EquipmentClass::HotPlate, v).unwrap();
        lab.set_setpoint(plate, 300.0).unwrap();
        assert!(lab.derived_quantities(v).unwrap().is_empty());
    }

    #[test]
    fn test_probe_mirrors_and_settles() {
        let (mut lab, clock) = session();
        let v = lab.add_vessel();
        lab.vessels_mut()
            .add_content(v, ContentEntry::new("hcl", 10.0, Unit::Ml))
            .unwrap();
        let meter = lab.attach_equipment(EquipmentClass::PhMeter, v).unwrap();
        assert_eq!(
            lab.attachment(meter).unwrap().settings,
            Settings::PhProbe {
                measured_ph: Some(1.0)
            }
        );

        lab.tick();
        match lab.display_state(meter).unwrap() {
            DisplayState::PhMeter(shown) => assert_eq!(shown.phase, ProbePhase::Cal),
            other => panic!("unexpected display {other:?}"),
        }

        run(&mut lab, &clock, 1_100);
        match lab.display_state(meter).unwrap() {
            DisplayState::PhMeter(shown) => {
                assert_eq!(shown.phase, ProbePhase::Stable);
                assert_eq!(shown.value, Some(1.0));
                assert!(shown.warning);
            }
            other => panic!("unexpected display {other:?}"),
        }
    }

    #[test]
    fn test_tare_zeroes_balance() {
        let (mut lab, clock) = session();
        let v = lab.add_vessel();
        lab.vessels_mut()
            .add_content(v, ContentEntry::new("nacl", 15.3, Unit::G))
            .unwrap();
        let balance = lab
            .attach_equipment(EquipmentClass::AnalyticalBalance, v)
            .unwrap();
        assert!((lab.tare(balance).unwrap() - 15.3).abs() < 1e-9);

        run(&mut lab, &clock, 1_500);
        match lab.display_state(balance).unwrap() {
            DisplayState::Balance(shown) => {
                assert_eq!(shown.phase, BalancePhase::Reading);
                assert!(shown.target.abs() < 1e-9);
            }
            other => panic!("unexpected display {other:?}"),
        }

        let timer = lab.attach_equipment(EquipmentClass::Timer, v).unwrap();
        assert!(matches!(
            lab.tare(timer),
            Err(LabError::UnsupportedCommand { command: "tare", .. })
        ));
    }

    #[test]
    fn test_overload_reported_as_degraded() {
        let (mut lab, clock) = session();
        let v = lab.add_vessel();
        lab.vessels_mut()
            .add_content(v, ContentEntry::new("water", 250.0, Unit::Ml))
            .unwrap();
        let balance = lab
            .attach_equipment(EquipmentClass::AnalyticalBalance, v)
            .unwrap();
        run(&mut lab, &clock, 1_500);
        assert_eq!(
            lab.degraded_states(),
            vec![(balance, DegradedState::Overload)]
        );
    }

    #[test]
    fn test_timer_pause_resume_without_drift() {
        let (mut lab, clock) = session();
        let v = lab.add_vessel();
        let timer = lab.attach_equipment(EquipmentClass::Timer, v).unwrap();
        lab.update_settings(timer, &SettingsPatch::default().with_mode(TimerMode::Countup))
            .unwrap();

        lab.timer_control(timer, TimerCommand::Resume).unwrap();
        run(&mut lab, &clock, 45_000);
        let paused = lab.timer_control(timer, TimerCommand::Pause).unwrap();
        assert!((paused.elapsed_secs - 45.0).abs() <= 0.1);

        run(&mut lab, &clock, 10_000);
        let resumed = lab.timer_control(timer, TimerCommand::Resume).unwrap();
        assert!((resumed.elapsed_secs - 45.0).abs() <= 0.1);
        assert_eq!(resumed.phase, TimerPhase::Running);

        match &lab.attachment(timer).unwrap().settings {
            Settings::Timer {
                time_remaining,
                is_running,
                ..
            } => {
                assert!((time_remaining - 45.0).abs() <= 0.1);
                assert!(*is_running);
            }
            other => panic!("unexpected settings {other:?}"),
        }
    }

    #[test]
    fn test_timer_countdown_expires() {
        let (mut lab, clock) = session();
        let v = lab.add_vessel();
        let timer = lab.attach_equipment(EquipmentClass::Timer, v).unwrap();
        lab.set_setpoint(timer, 1.0).unwrap();
        lab.timer_control(timer, TimerCommand::Resume).unwrap();

        run(&mut lab, &clock, 61_000);
        match lab.display_state(timer).unwrap() {
            DisplayState::Timer(shown) => {
                assert!(shown.is_expired);
                assert_eq!(shown.remaining_secs, 0.0);
            }
            other => panic!("unexpected display {other:?}"),
        }

        let reset = lab.timer_control(timer, TimerCommand::Reset).unwrap();
        assert_eq!(reset.phase, TimerPhase::Idle);
        assert_eq!(reset.shown_secs, 60.0);
    }

    #[test]
    fn test_countdown_pause_resume_without_drift() {
        let (mut lab, clock) = session();
        let v = lab.add_vessel();
        let timer = lab.attach_equipment(EquipmentClass::Timer, v).unwrap();
        lab.set_setpoint(timer, 1.0).unwrap();

        lab.timer_control(timer, TimerCommand::Resume).unwrap();
        run(&mut lab, &clock, 15_000);
        let paused = lab.timer_control(timer, TimerCommand::Pause).unwrap();
        assert!((paused.remaining_secs - 45.0).abs() <= 0.1);

        run(&mut lab, &clock, 10_000);
        let resumed = lab.timer_control(timer, TimerCommand::Resume).unwrap();
        assert!((resumed.remaining_secs - 45.0).abs() <= 0.1);
        assert_eq!(resumed.phase, TimerPhase::Running);

        match &lab.attachment(timer).unwrap().settings {
            Settings::Timer { time_remaining, .. } => {
                assert!((time_remaining - 45.0).abs() <= 0.1)
            }
            other => panic!("unexpected settings {other:?}"),
        }
    }

    #[test]
    fn test_seek_early_in_session() {
        let (mut lab, clock) = session();
        let v = lab.add_vessel();
        let timer = lab.attach_equipment(EquipmentClass::Timer, v).unwrap();
        run(&mut lab, &clock, 10_000);

        lab.update_settings(timer, &SettingsPatch::default().with_time_remaining(120.0))
            .unwrap();
        let resumed = lab.timer_control(timer, TimerCommand::Resume).unwrap();
        assert!((resumed.remaining_secs - 120.0).abs() <= 0.1);

        run(&mut lab, &clock, 5_000);
        match lab.display_state(timer).unwrap() {
            DisplayState::Timer(shown) => assert!((shown.remaining_secs - 115.0).abs() <= 0.1),
            other => panic!("unexpected display {other:?}"),
        }
    }

    #[test]
    fn test_seek_reports_paused() {
        let (mut lab, _) = session();
        let v = lab.add_vessel();
        let timer = lab.attach_equipment(EquipmentClass::Timer, v).unwrap();
        lab.update_settings(timer, &SettingsPatch::default().with_time_remaining(90.0))
            .unwrap();
        match lab.display_state(timer).unwrap() {
            DisplayState::Timer(shown) => assert_eq!(shown.phase, TimerPhase::Paused),
            other => panic!("unexpected display {other:?}"),
        }
    }

    #[test]
    fn test_countup_dial_starts_from_zero() {
        let (mut lab, clock) = session();
        clock.advance(Duration::from_secs(3_600));
        let v = lab.add_vessel();
        let timer = lab.attach_equipment(EquipmentClass::Timer, v).unwrap();
        lab.update_settings(timer, &SettingsPatch::default().with_mode(TimerMode::Countup))
            .unwrap();
        lab.set_setpoint(timer, 10.0).unwrap();

        match lab.display_state(timer).unwrap() {
            DisplayState::Timer(shown) => assert_eq!(shown.shown_secs, 0.0),
            other => panic!("unexpected display {other:?}"),
        }
        let resumed = lab.timer_control(timer, TimerCommand::Resume).unwrap();
        assert_eq!(resumed.shown_secs, 0.0);

        // Turning the dial on a running countup restarts it
        run(&mut lab, &clock, 5_000);
        lab.set_setpoint(timer, 20.0).unwrap();
        match lab.display_state(timer).unwrap() {
            DisplayState::Timer(shown) => {
                assert_eq!(shown.shown_secs, 0.0);
                assert!(shown.is_running);
            }
            other => panic!("unexpected display {other:?}"),
        }
    }

    #[test]
    fn test_timer_control_rejects_other_classes() {
        let (mut lab, _) = session();
        let v = lab.add_vessel();
        let plate = lab.attach_equipment(EquipmentClass::HotPlate, v).unwrap();
        assert!(matches!(
            lab.timer_control(plate, TimerCommand::Pause),
            Err(LabError::UnsupportedCommand { .. })
        ));
    }

    #[test]
    fn test_centrifuge_separates_layers() {
        let (mut lab, clock) = session();
        let v = lab.add_vessel();
        lab.vessels_mut()
            .set_layers(
                v,
                vec![
                    LiquidLayer::new("blue", 1.2),
                    LiquidLayer::new("clear", 0.9),
                    LiquidLayer::new("amber", 1.0),
                ],
            )
            .unwrap();
        let spin = lab.attach_equipment(EquipmentClass::Centrifuge, v).unwrap();
        lab.set_setpoint(spin, 5000.0).unwrap();

        lab.tick();
        run(&mut lab, &clock, 2_000);
        match lab.display_state(spin).unwrap() {
            DisplayState::Centrifuge(shown) => {
                assert_eq!(shown.phase, CentrifugePhase::Spinning);
                assert_eq!(shown.separation, 1.0);
                let densities: Vec<f64> = shown.bands.iter().map(|b| b.density).collect();
                assert_eq!(densities, vec![1.2, 1.0, 0.9]);
            }
            other => panic!("unexpected display {other:?}"),
        }

        // Dial to zero stops the rotor
        lab.set_setpoint(spin, 0.0).unwrap();
        run(&mut lab, &clock, 100);
        match lab.display_state(spin).unwrap() {
            DisplayState::Centrifuge(shown) => assert_eq!(shown.phase, CentrifugePhase::Opening),
            other => panic!("unexpected display {other:?}"),
        }
    }

    #[test]
    fn test_deactivate_resets_transient_settings() {
        let (mut lab, _) = session();
        let v = lab.add_vessel();
        lab.vessels_mut()
            .add_content(v, ContentEntry::new("nacl", 5.0, Unit::G))
            .unwrap();
        let balance = lab
            .attach_equipment(EquipmentClass::AnalyticalBalance, v)
            .unwrap();
        let timer = lab.attach_equipment(EquipmentClass::Timer, v).unwrap();
        lab.tare(balance).unwrap();
        lab.timer_control(timer, TimerCommand::Resume).unwrap();

        assert!(lab.deactivate_equipment(balance).unwrap());
        assert!(lab.deactivate_equipment(timer).unwrap());
        assert!(!lab.deactivate_equipment(timer).unwrap());
        assert!(check_attachments(&lab.attachments().snapshot()).is_empty());
        assert_eq!(
            lab.display_state(timer).unwrap(),
            DisplayState::Inactive {
                class: EquipmentClass::Timer
            }
        );

        // Resume on a switched-off timer does nothing
        lab.timer_control(timer, TimerCommand::Resume).unwrap();
        assert!(check_attachments(&lab.attachments().snapshot()).is_empty());
    }

    #[test]
    fn test_reactivation_rechecks_exclusivity() {
        let (mut lab, _) = session();
        let v = lab.add_vessel();
        let stirrer = lab
            .attach_equipment(EquipmentClass::MagneticStirrer, v)
            .unwrap();
        lab.deactivate_equipment(stirrer).unwrap();
        let spin = lab.attach_equipment(EquipmentClass::Centrifuge, v).unwrap();

        let err = lab.activate_equipment(stirrer).unwrap_err();
        assert_eq!(
            err.as_conflict().map(|c| c.reason),
            Some(ConflictReason::MotionDeviceConflict)
        );

        lab.detach_equipment(spin);
        assert!(lab.activate_equipment(stirrer).unwrap());
    }

    #[test]
    fn test_remove_vessel_detaches_equipment() {
        let (mut lab, _) = session();
        let v = lab.add_vessel();
        let keep = lab.add_vessel();
        lab.attach_equipment(EquipmentClass::Thermometer, v).unwrap();
        lab.attach_equipment(EquipmentClass::Timer, v).unwrap();
        let other = lab.attach_equipment(EquipmentClass::Timer, keep).unwrap();

        assert!(lab.remove_vessel(v).is_some());
        assert!(lab.list_attachments(v).is_empty());
        assert_eq!(lab.attachments().len(), 1);
        assert!(lab.display_state(other).is_ok());
        assert!(lab.remove_vessel(v).is_none());
    }

    #[test]
    fn test_hidden_session_drops_ticks() {
        let (mut lab, clock) = session();
        lab.set_visible(false);
        clock.advance_millis(500);
        assert!(lab.tick().is_none());
        assert!(lab.force_tick().is_none());
        assert_eq!(lab.tick_stats().dropped_hidden, 2);

        lab.set_visible(true);
        assert!(lab.tick().is_some());
    }

    #[test]
    fn test_strict_policy_from_config() {
        let config = LabConfig {
            centrifuge_blocks_heating: true,
            ..LabConfig::default()
        };
        let mut lab = LabSession::from_config(&config, ManualClock::new()).unwrap();
        let v = lab.add_vessel();
        lab.attach_equipment(EquipmentClass::HotPlate, v).unwrap();
        let err = lab.attach_equipment(EquipmentClass::Centrifuge, v).unwrap_err();
        assert_eq!(
            err.as_conflict().map(|c| c.reason),
            Some(ConflictReason::CentrifugeHeatingConflict)
        );
    }

    #[test]
    fn test_custom_calculator() {
        let clock = ManualClock::new();
        let mut lab = LabSession::with_clock(clock).with_calculator(|_: &[ContentEntry]| 3.0);
        let v = lab.add_vessel();
        lab.vessels_mut()
            .add_content(v, ContentEntry::new("anything", 1.0, Unit::Ml))
            .unwrap();
        assert_eq!(lab.derived_quantities(v).unwrap().ph, 3.0);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn class_strategy() -> impl Strategy<Value = EquipmentClass> {
            prop::sample::select(EquipmentClass::all().to_vec())
        }

        fn dial_value() -> impl Strategy<Value = f64> {
            prop_oneof![
                -1.0e6..1.0e6f64,
                Just(f64::NAN),
                Just(f64::INFINITY),
                Just(f64::NEG_INFINITY),
            ]
        }

        proptest! {
            #[test]
            fn prop_setpoint_stays_in_range(class in class_strategy(), value in dial_value()) {
                let (mut lab, _) = session();
                let v = lab.add_vessel();
                let id = lab.attach_equipment(class, v).unwrap();
                let config = class.config();
                match lab.set_setpoint(id, value) {
                    Ok(stored) if lab.attachment(id).unwrap().settings.setpoint().is_some() => {
                        prop_assert!(stored >= config.min && stored <= config.max);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let mismatch = matches!(e, LabError::SettingsMismatch { .. });
                        prop_assert!(mismatch, "unexpected error {:?}", e);
                    }
                }
            }
        }
    }
}
