//! Command Fuzzer - randomized command sequences against a lab session
//!
//! Checks after every command:
//! - Attachment invariants (single heater, single motion, class uniqueness,
//!   settings shape, transient reset)
//! - Every attachment still renders a display
//! - Derived readings stay finite

use std::time::Duration;

use labsim_core::invariants::InvariantViolation;
use labsim_core::{
    AttachmentId, ContentEntry, EquipmentClass, Settings, SettingsPatch, TimerMode, Unit,
    VesselId,
};
use labsim_devices::{DeviceConfig, DisplayState, TimerCommand};
use labsim_runtime::LabSession;
use labsim_time::ManualClock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::LabHarness;

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Number of commands to issue
    pub command_count: usize,
    /// Upper bound on live vessels
    pub max_vessels: usize,
    /// Probability that a dial value is NaN, infinite or far out of range
    pub garbage_prob: f64,
    /// Probability of toggling visibility
    pub visibility_prob: f64,
    /// Apply the centrifuge/heating exclusion
    pub strict_policy: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            command_count: 1000,
            max_vessels: 4,
            garbage_prob: 0.1,
            visibility_prob: 0.02,
            strict_policy: false,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            command_count: 200,
            max_vessels: 2,
            ..Default::default()
        }
    }

    /// Heavy fuzzing for thorough testing
    pub fn heavy() -> Self {
        FuzzerConfig {
            command_count: 20_000,
            max_vessels: 8,
            garbage_prob: 0.2,
            visibility_prob: 0.05,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict_policy = true;
        self
    }
}

/// Fuzzing result
#[derive(Debug, Default)]
pub struct FuzzResult {
    pub commands: usize,
    /// Commands refused with an error (conflicts, unsupported commands)
    pub rejected: usize,
    pub violations: Vec<InvariantViolation>,
    /// Attachments that failed to render
    pub display_failures: usize,
    pub nonfinite_readings: usize,
    /// Timer faces outside `0..=duration` or not finite
    pub timer_faults: usize,
}

impl FuzzResult {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
            && self.display_failures == 0
            && self.nonfinite_readings == 0
            && self.timer_faults == 0
    }
}

const SUBSTANCES: [&str; 8] = [
    "hcl", "naoh", "ch3cooh", "nh4oh", "nacl", "water", "na2co3", "oil",
];
const UNITS: [Unit; 4] = [Unit::Ml, Unit::G, Unit::Mol, Unit::Drops];

/// Lab command fuzzer
pub struct CommandFuzzer {
    config: FuzzerConfig,
    harness: LabHarness,
    rng: StdRng,
    vessels: Vec<VesselId>,
    attachments: Vec<AttachmentId>,
}

impl CommandFuzzer {
    pub fn new(config: FuzzerConfig) -> Self {
        let clock = ManualClock::new();
        let policy = labsim_state::ExclusivityPolicy {
            centrifuge_blocks_heating: config.strict_policy,
        };
        let session = LabSession::with_clock(clock.clone())
            .with_devices(DeviceConfig::seeded(config.seed))
            .with_policy(policy);
        let harness = LabHarness::with_session(clock, session);

        CommandFuzzer {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            harness,
            vessels: Vec::new(),
            attachments: Vec::new(),
        }
    }

    pub fn harness(&self) -> &LabHarness {
        &self.harness
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            None
        } else {
            Some(items[self.rng.gen_range(0..items.len())])
        }
    }

    fn dial_value(&mut self) -> f64 {
        if self.rng.gen::<f64>() < self.config.garbage_prob {
            match self.rng.gen_range(0..4) {
                0 => f64::NAN,
                1 => f64::INFINITY,
                2 => f64::NEG_INFINITY,
                _ => self.rng.gen_range(-1e6..1e6),
            }
        } else {
            self.rng.gen_range(0.0..5000.0)
        }
    }

    /// Issue one random command. Returns whether the session refused it.
    fn command(&mut self) -> bool {
        let vessels = self.vessels.clone();
        let attachments = self.attachments.clone();

        if self.rng.gen::<f64>() < self.config.visibility_prob {
            let visible = !self.harness.session.is_visible();
            self.harness.session.set_visible(visible);
            return false;
        }

        match self.rng.gen_range(0..12) {
            0 if vessels.len() < self.config.max_vessels => {
                self.vessels.push(self.harness.session.add_vessel());
                false
            }
            0 | 1 => {
                let Some(vessel) = self.pick(&vessels) else {
                    return false;
                };
                let substance = SUBSTANCES[self.rng.gen_range(0..SUBSTANCES.len())];
                let unit = UNITS[self.rng.gen_range(0..UNITS.len())];
                let amount = self.rng.gen_range(0.0..120.0);
                self.harness
                    .session
                    .vessels_mut()
                    .add_content(vessel, ContentEntry::new(substance, amount, unit))
                    .is_err()
            }
            2 => {
                let Some(vessel) = self.pick(&vessels) else {
                    return false;
                };
                if self.rng.gen_bool(0.5) {
                    self.harness.session.vessels_mut().clear_contents(vessel).is_err()
                } else {
                    self.harness.session.remove_vessel(vessel);
                    self.vessels.retain(|v| *v != vessel);
                    false
                }
            }
            3 | 4 => {
                let Some(vessel) = self.pick(&vessels) else {
                    return false;
                };
                let class = self
                    .pick(EquipmentClass::all())
                    .unwrap_or(EquipmentClass::Timer);
                match self.harness.session.attach_equipment(class, vessel) {
                    Ok(id) => {
                        self.attachments.push(id);
                        false
                    }
                    Err(_) => true,
                }
            }
            5 => {
                let Some(id) = self.pick(&attachments) else {
                    return false;
                };
                self.harness.session.detach_equipment(id);
                false
            }
            6 => {
                let Some(id) = self.pick(&attachments) else {
                    return false;
                };
                let value = self.dial_value();
                self.harness.session.set_setpoint(id, value).is_err()
            }
            7 => {
                let Some(id) = self.pick(&attachments) else {
                    return false;
                };
                self.harness.session.tare(id).is_err()
            }
            8 => {
                let Some(id) = self.pick(&attachments) else {
                    return false;
                };
                let command = match self.rng.gen_range(0..3) {
                    0 => TimerCommand::Pause,
                    1 => TimerCommand::Resume,
                    _ => TimerCommand::Reset,
                };
                self.harness.session.timer_control(id, command).is_err()
            }
            9 => {
                let Some(id) = self.pick(&attachments) else {
                    return false;
                };
                let result = if self.rng.gen_bool(0.5) {
                    self.harness.session.deactivate_equipment(id)
                } else {
                    self.harness.session.activate_equipment(id)
                };
                result.is_err()
            }
            10 => {
                let Some(id) = self.pick(&attachments) else {
                    return false;
                };
                // Dial turns and seeks in either order across commands
                let mut patch = if self.rng.gen_bool(0.3) {
                    SettingsPatch::setpoint(self.rng.gen_range(0.0..120.0))
                } else {
                    SettingsPatch::default()
                };
                if self.rng.gen_bool(0.5) {
                    let remaining = self.dial_value();
                    patch = patch.with_time_remaining(remaining);
                }
                if self.rng.gen_bool(0.3) {
                    let mode = if self.rng.gen_bool(0.5) {
                        TimerMode::Countup
                    } else {
                        TimerMode::Countdown
                    };
                    patch = patch.with_mode(mode);
                }
                if self.rng.gen_bool(0.3) {
                    let running = self.rng.gen_bool(0.5);
                    patch = patch.with_running(running);
                }
                self.harness.session.update_settings(id, &patch).is_err()
            }
            _ => {
                let ms = self.rng.gen_range(0..3_000);
                self.harness.advance(Duration::from_millis(ms));
                false
            }
        }
    }

    fn check(&self, result: &mut FuzzResult) {
        result.violations.extend(self.harness.violations());

        let session = &self.harness.session;
        for att in session.attachments().iter() {
            match (session.display_state(att.id), &att.settings) {
                (Err(_), _) => result.display_failures += 1,
                (Ok(DisplayState::Timer(shown)), Settings::Timer { duration_secs, .. }) => {
                    let in_range = shown.remaining_secs >= 0.0
                        && shown.remaining_secs <= duration_secs + 1e-6
                        && shown.elapsed_secs.is_finite()
                        && shown.elapsed_secs >= 0.0;
                    if !in_range {
                        result.timer_faults += 1;
                    }
                }
                _ => {}
            }
        }
        for vessel in session.vessels().ids() {
            if let Ok(q) = session.derived_quantities(vessel) {
                if !(q.weight.is_finite() && q.ph.is_finite() && q.temperature.raw().is_finite()) {
                    result.nonfinite_readings += 1;
                }
            }
        }
    }

    /// Run the fuzzer
    pub fn run(&mut self) -> FuzzResult {
        let mut result = FuzzResult::default();

        for _ in 0..self.config.command_count {
            if self.command() {
                result.rejected += 1;
            }
            result.commands += 1;
            self.check(&mut result);
            if !result.violations.is_empty() {
                break;
            }
        }

        debug!(
            commands = result.commands,
            rejected = result.rejected,
            violations = result.violations.len(),
            "fuzz run finished"
        );
        result
    }
}
