//! Device simulator configuration

use std::time::Duration;

/// Calibration and settling of a measurement probe
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeConfig {
    /// CAL window after activation
    pub calibration: Duration,
    /// READING window during which jitter decays to zero
    pub settle: Duration,
    /// Peak jitter at the start of READING, in reading units
    pub jitter_amplitude: f64,
}

impl ProbeConfig {
    pub fn ph() -> Self {
        ProbeConfig {
            calibration: Duration::from_millis(200),
            settle: Duration::from_millis(800),
            jitter_amplitude: 0.15,
        }
    }

    pub fn thermometer() -> Self {
        ProbeConfig {
            calibration: Duration::from_millis(200),
            settle: Duration::from_millis(800),
            jitter_amplitude: 0.5,
        }
    }
}

/// Analytical balance behavior
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BalanceConfig {
    pub calibration: Duration,
    /// Fraction of the remaining gap closed per tick, in (0, 1]
    pub damping: f64,
    /// Net weight above which the balance reports overload (g)
    pub max_weight: f64,
    /// Display is stable once within this distance of the target (g)
    pub stable_epsilon: f64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        BalanceConfig {
            calibration: Duration::from_millis(1200),
            damping: 0.15,
            max_weight: 200.0,
            stable_epsilon: 0.001,
        }
    }
}

/// Centrifuge lid timing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CentrifugeConfig {
    pub close: Duration,
    /// Deceleration plus lid opening
    pub open: Duration,
}

impl Default for CentrifugeConfig {
    fn default() -> Self {
        CentrifugeConfig {
            close: Duration::from_millis(500),
            open: Duration::from_secs(3),
        }
    }
}

/// Configuration of every device simulator
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceConfig {
    pub ph_probe: ProbeConfig,
    pub thermometer: ProbeConfig,
    pub balance: BalanceConfig,
    pub centrifuge: CentrifugeConfig,
    /// Shortest stirrer bar rotation period (s)
    pub stirrer_min_period: f64,
    /// Seed for probe jitter. `None` draws from OS entropy.
    pub jitter_seed: Option<u64>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            ph_probe: ProbeConfig::ph(),
            thermometer: ProbeConfig::thermometer(),
            balance: BalanceConfig::default(),
            centrifuge: CentrifugeConfig::default(),
            stirrer_min_period: 0.04,
            jitter_seed: None,
        }
    }
}

impl DeviceConfig {
    /// No delays and no jitter: every phase completes on the first tick
    pub fn instant() -> Self {
        let probe = ProbeConfig {
            calibration: Duration::ZERO,
            settle: Duration::ZERO,
            jitter_amplitude: 0.0,
        };
        DeviceConfig {
            ph_probe: probe,
            thermometer: probe,
            balance: BalanceConfig {
                calibration: Duration::ZERO,
                damping: 1.0,
                ..BalanceConfig::default()
            },
            centrifuge: CentrifugeConfig {
                close: Duration::ZERO,
                open: Duration::ZERO,
            },
            stirrer_min_period: 0.04,
            jitter_seed: Some(0),
        }
    }

    /// Default timing with reproducible jitter
    pub fn seeded(seed: u64) -> Self {
        DeviceConfig {
            jitter_seed: Some(seed),
            ..DeviceConfig::default()
        }
    }
}
