//! Class-tagged attachment settings
//!
//! Each variant carries exactly the fields its class defines, so a settings
//! value can never hold a stale field left over from another class.

use crate::{Category, EquipmentClass, LabError, LabResult};

/// Timer counting direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimerMode {
    #[default]
    Countdown,
    Countup,
}

/// Settings of one attachment, keyed by class
#[derive(Clone, Debug, PartialEq)]
pub enum Settings {
    /// Bunsen burner, hot plate
    Heating { setpoint: f64 },
    /// Magnetic stirrer, centrifuge (RPM)
    Motion { setpoint: f64 },
    /// pH meter - mirrors the derived pH, `None` for an empty vessel
    PhProbe { measured_ph: Option<f64> },
    /// Thermometer - mirrors the derived temperature, `None` for an empty vessel
    Thermometer { measured_temp: Option<f64> },
    /// Analytical balance
    Balance { measured_weight: f64, tare_offset: f64 },
    /// Lab timer
    Timer {
        /// Configured duration (dial minutes × 60)
        duration_secs: f64,
        time_remaining: f64,
        mode: TimerMode,
        is_running: bool,
    },
}

impl Settings {
    /// Class defaults for a freshly attached instrument
    pub fn defaults_for(class: EquipmentClass) -> Self {
        let default_value = class.config().default_value;
        match class {
            EquipmentClass::BunsenBurner | EquipmentClass::HotPlate => Settings::Heating {
                setpoint: default_value,
            },
            EquipmentClass::MagneticStirrer | EquipmentClass::Centrifuge => Settings::Motion {
                setpoint: default_value,
            },
            EquipmentClass::PhMeter => Settings::PhProbe { measured_ph: None },
            EquipmentClass::Thermometer => Settings::Thermometer {
                measured_temp: None,
            },
            EquipmentClass::AnalyticalBalance => Settings::Balance {
                measured_weight: 0.0,
                tare_offset: 0.0,
            },
            EquipmentClass::Timer => Settings::Timer {
                duration_secs: default_value * 60.0,
                time_remaining: default_value * 60.0,
                mode: TimerMode::Countdown,
                is_running: false,
            },
        }
    }

    /// Whether this variant is the shape defined for `class`
    pub fn matches(&self, class: EquipmentClass) -> bool {
        matches!(
            (self, class),
            (
                Settings::Heating { .. },
                EquipmentClass::BunsenBurner | EquipmentClass::HotPlate
            ) | (
                Settings::Motion { .. },
                EquipmentClass::MagneticStirrer | EquipmentClass::Centrifuge
            ) | (Settings::PhProbe { .. }, EquipmentClass::PhMeter)
                | (Settings::Thermometer { .. }, EquipmentClass::Thermometer)
                | (Settings::Balance { .. }, EquipmentClass::AnalyticalBalance)
                | (Settings::Timer { .. }, EquipmentClass::Timer)
        )
    }

    /// Dial value: heating/motion setpoint, or timer duration in minutes
    pub fn setpoint(&self) -> Option<f64> {
        match self {
            Settings::Heating { setpoint } | Settings::Motion { setpoint } => Some(*setpoint),
            Settings::Timer { duration_secs, .. } => Some(duration_secs / 60.0),
            _ => None,
        }
    }

    pub fn tare_offset(&self) -> Option<f64> {
        match self {
            Settings::Balance { tare_offset, .. } => Some(*tare_offset),
            _ => None,
        }
    }

    /// Apply a partial update. Every populated patch field must be defined for
    /// `class`; otherwise nothing is changed.
    pub fn merge(&mut self, class: EquipmentClass, patch: &SettingsPatch) -> LabResult<()> {
        if let Some(field) = patch.undefined_field_for(self) {
            return Err(LabError::SettingsMismatch { class, field });
        }

        match self {
            Settings::Heating { setpoint } | Settings::Motion { setpoint } => {
                if let Some(value) = patch.setpoint {
                    *setpoint = class.config().clamp(value);
                }
            }
            Settings::Balance { tare_offset, .. } => {
                if let Some(value) = patch.tare_offset {
                    *tare_offset = if value.is_finite() { value } else { 0.0 };
                }
            }
            Settings::Timer {
                duration_secs,
                time_remaining,
                mode,
                is_running,
            } => {
                // Turning the dial reloads the face
                if let Some(minutes) = patch.setpoint {
                    *duration_secs = class.config().clamp(minutes) * 60.0;
                    *time_remaining = *duration_secs;
                }
                if let Some(value) = patch.time_remaining {
                    *time_remaining = if value.is_finite() { value.max(0.0) } else { 0.0 };
                }
                if let Some(value) = patch.mode {
                    *mode = value;
                }
                if let Some(value) = patch.is_running {
                    *is_running = value;
                }
            }
            Settings::PhProbe { .. } | Settings::Thermometer { .. } => {}
        }

        Ok(())
    }

    /// Mirror the latest derived readings into the read-only fields
    pub fn mirror_readings(&mut self, ph: Option<f64>, temperature: Option<f64>, weight: f64) {
        match self {
            Settings::PhProbe { measured_ph } => *measured_ph = ph,
            Settings::Thermometer { measured_temp } => *measured_temp = temperature,
            Settings::Balance {
                measured_weight, ..
            } => *measured_weight = weight,
            _ => {}
        }
    }

    /// Reset the fields that only live while the attachment is active.
    /// Dial setpoints and the timer mode survive; the timer goes back to its
    /// full configured duration.
    pub fn reset_transient(&mut self, class: EquipmentClass) {
        match self {
            Settings::Heating { .. } | Settings::Motion { .. } => {}
            Settings::Timer {
                duration_secs,
                time_remaining,
                is_running,
                ..
            } => {
                *time_remaining = *duration_secs;
                *is_running = false;
            }
            _ => *self = Settings::defaults_for(class),
        }
    }

    /// Whether the transient fields hold their reset values
    pub fn transient_is_default(&self, class: EquipmentClass) -> bool {
        match self {
            Settings::Balance { tare_offset, .. } => {
                Some(*tare_offset) == Settings::defaults_for(class).tare_offset()
            }
            Settings::Timer {
                duration_secs,
                time_remaining,
                is_running,
                ..
            } => *time_remaining == *duration_secs && !*is_running,
            _ => true,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Settings::Heating { .. } => Category::Heating,
            Settings::Motion { .. } => Category::Motion,
            Settings::PhProbe { .. } | Settings::Thermometer { .. } | Settings::Balance { .. } => {
                Category::Measurement
            }
            Settings::Timer { .. } => Category::Timer,
        }
    }
}

/// Partial settings update. Read-only measurement fields are not patchable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsPatch {
    pub setpoint: Option<f64>,
    pub tare_offset: Option<f64>,
    pub time_remaining: Option<f64>,
    pub mode: Option<TimerMode>,
    pub is_running: Option<bool>,
}

impl SettingsPatch {
    pub fn setpoint(value: f64) -> Self {
        SettingsPatch {
            setpoint: Some(value),
            ..Default::default()
        }
    }

    pub fn tare_offset(value: f64) -> Self {
        SettingsPatch {
            tare_offset: Some(value),
            ..Default::default()
        }
    }

    pub fn with_time_remaining(mut self, secs: f64) -> Self {
        self.time_remaining = Some(secs);
        self
    }

    pub fn with_mode(mut self, mode: TimerMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_running(mut self, running: bool) -> Self {
        self.is_running = Some(running);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &SettingsPatch::default()
    }

    /// First populated field that `settings` does not define
    fn undefined_field_for(&self, settings: &Settings) -> Option<&'static str> {
        let (setpoint, tare, timer) = match settings {
            Settings::Heating { .. } | Settings::Motion { .. } => (true, false, false),
            Settings::Balance { .. } => (false, true, false),
            Settings::Timer { .. } => (true, false, true),
            Settings::PhProbe { .. } | Settings::Thermometer { .. } => (false, false, false),
        };

        if self.setpoint.is_some() && !setpoint {
            return Some("setpoint");
        }
        if self.tare_offset.is_some() && !tare {
            return Some("tareOffset");
        }
        if !timer {
            if self.time_remaining.is_some() {
                return Some("timeRemaining");
            }
            if self.mode.is_some() {
                return Some("mode");
            }
            if self.is_running.is_some() {
                return Some("isRunning");
            }
        }
        None
    }
}
