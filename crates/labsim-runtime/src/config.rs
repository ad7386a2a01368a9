//! Lab session configuration
//!
//! Hosts may load this from JSON. Durations are given in milliseconds.

use std::time::Duration;

use labsim_core::{LabError, LabResult};
use labsim_devices::{BalanceConfig, CentrifugeConfig, DeviceConfig, ProbeConfig};
use labsim_state::ExclusivityPolicy;
use labsim_time::TickConfig;
use serde::{Deserialize, Serialize};

/// Calibration and settling of one probe
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub calibration_ms: u64,
    pub settle_ms: u64,
    pub jitter: f64,
}

impl ProbeSettings {
    fn from_probe(probe: ProbeConfig) -> Self {
        ProbeSettings {
            calibration_ms: probe.calibration.as_millis() as u64,
            settle_ms: probe.settle.as_millis() as u64,
            jitter: probe.jitter_amplitude,
        }
    }

    fn to_probe(self) -> ProbeConfig {
        ProbeConfig {
            calibration: Duration::from_millis(self.calibration_ms),
            settle: Duration::from_millis(self.settle_ms),
            jitter_amplitude: self.jitter,
        }
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self::from_probe(ProbeConfig::ph())
    }
}

/// Device timing and constants
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub ph_probe: ProbeSettings,
    pub thermometer: ProbeSettings,
    pub balance_calibration_ms: u64,
    pub balance_damping: f64,
    pub balance_max_weight: f64,
    pub balance_stable_epsilon: f64,
    pub centrifuge_close_ms: u64,
    pub centrifuge_open_ms: u64,
    pub stirrer_min_period: f64,
    /// Fixed jitter seed for reproducible sessions
    pub jitter_seed: Option<u64>,
}

impl From<DeviceConfig> for DeviceSettings {
    fn from(config: DeviceConfig) -> Self {
        DeviceSettings {
            ph_probe: ProbeSettings::from_probe(config.ph_probe),
            thermometer: ProbeSettings::from_probe(config.thermometer),
            balance_calibration_ms: config.balance.calibration.as_millis() as u64,
            balance_damping: config.balance.damping,
            balance_max_weight: config.balance.max_weight,
            balance_stable_epsilon: config.balance.stable_epsilon,
            centrifuge_close_ms: config.centrifuge.close.as_millis() as u64,
            centrifuge_open_ms: config.centrifuge.open.as_millis() as u64,
            stirrer_min_period: config.stirrer_min_period,
            jitter_seed: config.jitter_seed,
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        DeviceConfig::default().into()
    }
}

impl DeviceSettings {
    pub fn to_device_config(&self) -> DeviceConfig {
        DeviceConfig {
            ph_probe: self.ph_probe.to_probe(),
            thermometer: self.thermometer.to_probe(),
            balance: BalanceConfig {
                calibration: Duration::from_millis(self.balance_calibration_ms),
                damping: self.balance_damping,
                max_weight: self.balance_max_weight,
                stable_epsilon: self.balance_stable_epsilon,
            },
            centrifuge: CentrifugeConfig {
                close: Duration::from_millis(self.centrifuge_close_ms),
                open: Duration::from_millis(self.centrifuge_open_ms),
            },
            stirrer_min_period: self.stirrer_min_period,
            jitter_seed: self.jitter_seed,
        }
    }
}

/// Log output settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG` when set
    pub level: String,
    /// One JSON object per line
    pub json: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
            with_target: true,
        }
    }
}

/// Complete session configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub tick_interval_ms: u64,
    pub devices: DeviceSettings,
    /// Reject a centrifuge and a heater on the same vessel
    pub centrifuge_blocks_heating: bool,
    pub logging: LoggingConfig,
}

impl Default for LabConfig {
    fn default() -> Self {
        LabConfig {
            tick_interval_ms: 100,
            devices: DeviceSettings::default(),
            centrifuge_blocks_heating: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl LabConfig {
    /// Frame-rate ticking for animated hosts
    pub fn smooth() -> Self {
        LabConfig {
            tick_interval_ms: labsim_time::MIN_TICK_INTERVAL.as_millis() as u64,
            ..Default::default()
        }
    }

    /// Zero delays and seeded jitter, for scripted scenarios
    pub fn instant() -> Self {
        LabConfig {
            devices: DeviceConfig::instant().into(),
            ..Default::default()
        }
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> LabResult<Self> {
        let config: LabConfig =
            serde_json::from_str(json).map_err(|e| LabError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> LabResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LabError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> LabResult<()> {
        let d = &self.devices;
        let invalid = |msg: &str| Err(LabError::InvalidConfig(msg.to_string()));

        if self.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be positive");
        }
        if !(d.balance_damping > 0.0 && d.balance_damping <= 1.0) {
            return invalid("balance_damping must be in (0, 1]");
        }
        if !(d.balance_max_weight.is_finite() && d.balance_max_weight > 0.0) {
            return invalid("balance_max_weight must be positive");
        }
        if !(d.balance_stable_epsilon.is_finite() && d.balance_stable_epsilon > 0.0) {
            return invalid("balance_stable_epsilon must be positive");
        }
        if !(d.stirrer_min_period.is_finite() && d.stirrer_min_period > 0.0) {
            return invalid("stirrer_min_period must be positive");
        }
        for probe in [&d.ph_probe, &d.thermometer] {
            if !(probe.jitter.is_finite() && probe.jitter >= 0.0) {
                return invalid("probe jitter must be non-negative");
            }
        }
        Ok(())
    }

    pub fn tick_config(&self) -> TickConfig {
        TickConfig::with_interval(Duration::from_millis(self.tick_interval_ms))
    }

    pub fn device_config(&self) -> DeviceConfig {
        self.devices.to_device_config()
    }

    pub fn exclusivity_policy(&self) -> ExclusivityPolicy {
        ExclusivityPolicy {
            centrifuge_blocks_heating: self.centrifuge_blocks_heating,
        }
    }
}
