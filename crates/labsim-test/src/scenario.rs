//! Scripted lab scenarios
//!
//! A [`LabHarness`] pairs a session with a manual clock so time only moves
//! when a script says so. A [`Scenario`] is a list of [`Step`]s that refer
//! to vessels and attachments by creation order, which keeps scripts free
//! of runtime ids.

use std::time::Duration;

use labsim_core::invariants::{check_attachments, InvariantViolation};
use labsim_core::{
    AttachmentId, ContentEntry, EquipmentClass, LabError, LiquidLayer, SettingsPatch, Unit,
    VesselId,
};
use labsim_devices::{DisplayState, TimerCommand};
use labsim_quantities::DerivedQuantities;
use labsim_runtime::{LabConfig, LabSession};
use labsim_time::ManualClock;
use thiserror::Error;

/// Session plus the clock that drives it
pub struct LabHarness {
    pub clock: ManualClock,
    pub session: LabSession,
    step: Duration,
}

impl LabHarness {
    pub fn new(config: &LabConfig) -> Result<Self, LabError> {
        let clock = ManualClock::new();
        let session = LabSession::from_config(config, clock.clone())?;
        Ok(LabHarness {
            clock,
            session,
            step: config.tick_config().effective_interval(),
        })
    }

    /// Wrap a session built on `clock` with the default tick interval
    pub fn with_session(clock: ManualClock, session: LabSession) -> Self {
        LabHarness {
            clock,
            session,
            step: LabConfig::default().tick_config().effective_interval(),
        }
    }

    /// Default device timing with seeded jitter
    pub fn seeded(seed: u64) -> Self {
        let clock = ManualClock::new();
        let session = LabSession::with_clock(clock.clone())
            .with_devices(labsim_devices::DeviceConfig::seeded(seed));
        Self::with_session(clock, session)
    }

    /// Move the clock forward one tick interval at a time, ticking after
    /// each step. Returns the number of ticks delivered.
    pub fn advance(&mut self, duration: Duration) -> usize {
        let mut left = duration;
        let mut delivered = 0;
        while !left.is_zero() {
            let dt = left.min(self.step);
            self.clock.advance(dt);
            left -= dt;
            if self.session.tick().is_some() {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn advance_secs(&mut self, secs: f64) -> usize {
        self.advance(Duration::from_secs_f64(secs.max(0.0)))
    }

    /// New vessel filled with `(substance, amount, unit)` entries
    pub fn vessel_with(&mut self, contents: &[(&str, f64, Unit)]) -> VesselId {
        let vessel = self.session.add_vessel();
        for &(substance, amount, unit) in contents {
            // The vessel was just created
            let _ = self
                .session
                .vessels_mut()
                .add_content(vessel, ContentEntry::new(substance, amount, unit));
        }
        vessel
    }

    pub fn display(&self, id: AttachmentId) -> Result<DisplayState, LabError> {
        self.session.display_state(id)
    }

    pub fn quantities(&self, vessel: VesselId) -> Result<DerivedQuantities, LabError> {
        self.session.derived_quantities(vessel)
    }

    pub fn violations(&self) -> Vec<InvariantViolation> {
        check_attachments(&self.session.attachments().snapshot())
    }
}

/// One scripted action. Indices count vessels and successful attaches in
/// creation order.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    AddVessel,
    AddContent {
        vessel: usize,
        substance: String,
        amount: f64,
        unit: Unit,
    },
    SetLayers {
        vessel: usize,
        layers: Vec<LiquidLayer>,
    },
    RemoveVessel(usize),
    Attach {
        class: EquipmentClass,
        vessel: usize,
    },
    Detach(usize),
    SetSetpoint {
        attachment: usize,
        value: f64,
    },
    Update {
        attachment: usize,
        patch: SettingsPatch,
    },
    Tare(usize),
    Timer {
        attachment: usize,
        command: TimerCommand,
    },
    Deactivate(usize),
    Activate(usize),
    Advance(Duration),
    SetVisible(bool),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("Step {step}: no vessel #{index}")]
    NoVessel { step: usize, index: usize },

    #[error("Step {step}: no attachment #{index}")]
    NoAttachment { step: usize, index: usize },
}

/// Outcome of one step
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    Done,
    Rejected(LabError),
    Ticks(usize),
}

/// Result of a scenario run
#[derive(Clone, Debug, Default)]
pub struct ScenarioReport {
    pub outcomes: Vec<StepOutcome>,
    /// Violations found after any step, tagged with the step index
    pub violations: Vec<(usize, InvariantViolation)>,
}

impl ScenarioReport {
    pub fn rejected(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, StepOutcome::Rejected(_)))
            .count()
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Ordered script of steps
#[derive(Clone, Debug, Default)]
pub struct Scenario {
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run every step against `harness`, checking invariants after each
    pub fn run(&self, harness: &mut LabHarness) -> Result<ScenarioReport, ScenarioError> {
        let mut vessels: Vec<VesselId> = Vec::new();
        let mut attachments: Vec<AttachmentId> = Vec::new();
        let mut report = ScenarioReport::default();

        for (i, step) in self.steps.iter().enumerate() {
            let vessel = |index: usize| {
                vessels
                    .get(index)
                    .copied()
                    .ok_or(ScenarioError::NoVessel { step: i, index })
            };
            let attachment = |index: usize| {
                attachments
                    .get(index)
                    .copied()
                    .ok_or(ScenarioError::NoAttachment { step: i, index })
            };
            let session = &mut harness.session;

            let result: Result<(), LabError> = match step {
                Step::AddVessel => {
                    vessels.push(session.add_vessel());
                    Ok(())
                }
                Step::AddContent {
                    vessel: v,
                    substance,
                    amount,
                    unit,
                } => session.vessels_mut().add_content(
                    vessel(*v)?,
                    ContentEntry::new(substance.as_str(), *amount, *unit),
                ),
                Step::SetLayers { vessel: v, layers } => session
                    .vessels_mut()
                    .set_layers(vessel(*v)?, layers.clone()),
                Step::RemoveVessel(v) => {
                    session.remove_vessel(vessel(*v)?);
                    Ok(())
                }
                Step::Attach { class, vessel: v } => session
                    .attach_equipment(*class, vessel(*v)?)
                    .map(|id| attachments.push(id)),
                Step::Detach(a) => {
                    session.detach_equipment(attachment(*a)?);
                    Ok(())
                }
                Step::SetSetpoint {
                    attachment: a,
                    value,
                } => session.set_setpoint(attachment(*a)?, *value).map(drop),
                Step::Update {
                    attachment: a,
                    patch,
                } => session.update_settings(attachment(*a)?, patch),
                Step::Tare(a) => session.tare(attachment(*a)?).map(drop),
                Step::Timer {
                    attachment: a,
                    command,
                } => session.timer_control(attachment(*a)?, *command).map(drop),
                Step::Deactivate(a) => session.deactivate_equipment(attachment(*a)?).map(drop),
                Step::Activate(a) => session.activate_equipment(attachment(*a)?).map(drop),
                Step::Advance(duration) => {
                    let ticks = harness.advance(*duration);
                    report.outcomes.push(StepOutcome::Ticks(ticks));
                    report.violations.extend(
                        harness.violations().into_iter().map(|v| (i, v)),
                    );
                    continue;
                }
                Step::SetVisible(visible) => {
                    session.set_visible(*visible);
                    Ok(())
                }
            };

            report.outcomes.push(match result {
                Ok(()) => StepOutcome::Done,
                Err(e) => StepOutcome::Rejected(e),
            });
            report
                .violations
                .extend(harness.violations().into_iter().map(|v| (i, v)));
        }

        Ok(report)
    }
}
