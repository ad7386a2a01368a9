//! Centrifuge simulator
//!
//! Lid sequence `OPEN -> CLOSING -> SPINNING -> OPENING -> OPEN`. While
//! spinning, liquid layers settle by density: each band grows linearly from
//! nothing to its equilibrium share over the separation window, which
//! shortens as the rotor speeds up.

use std::time::Duration;

use labsim_core::{EquipmentClass, LabTime, LiquidLayer};
use labsim_time::Phased;
use tracing::debug;

use crate::{intensity, CentrifugeConfig, Intensity, IntensityLevel};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CentrifugePhase {
    Open,
    Closing,
    Spinning,
    Opening,
}

/// Seconds to full separation at `rpm`: `max(1, 5 - rpm / 1250)`, 5 when
/// stopped
pub fn separation_duration(rpm: f64) -> f64 {
    if !(rpm.is_finite() && rpm > 0.0) {
        return 5.0;
    }
    (5.0 - rpm / 1250.0).max(1.0)
}

/// One visible band, bottom to top
#[derive(Clone, Debug, PartialEq)]
pub struct LayerBand {
    pub color: String,
    pub density: f64,
    /// Fraction of the liquid column this band ends up occupying
    pub share: f64,
    /// Current visible thickness, from 0 up to `share`
    pub thickness: f64,
}

/// Sort layers heaviest first and size them at `progress` in [0, 1]
pub fn separate_layers(layers: &[LiquidLayer], progress: f64) -> Vec<LayerBand> {
    if layers.is_empty() {
        return Vec::new();
    }

    let volumes: Option<Vec<f64>> = layers
        .iter()
        .map(|l| l.volume.filter(|v| v.is_finite() && *v > 0.0))
        .collect();
    let total: f64 = volumes.as_ref().map_or(0.0, |v| v.iter().sum());
    let equal = 1.0 / layers.len() as f64;
    let progress = progress.clamp(0.0, 1.0);

    let mut bands: Vec<LayerBand> = layers
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            let share = match &volumes {
                Some(v) if total > 0.0 => v[i] / total,
                _ => equal,
            };
            LayerBand {
                color: layer.color.clone(),
                density: layer.density,
                share,
                thickness: share * progress,
            }
        })
        .collect();
    bands.sort_by(|a, b| b.density.total_cmp(&a.density));
    bands
}

#[derive(Clone, Debug, PartialEq)]
pub struct CentrifugeDisplay {
    pub phase: CentrifugePhase,
    pub rpm: f64,
    /// Separation progress in [0, 1]; 0 unless spinning
    pub separation: f64,
    pub bands: Vec<LayerBand>,
    pub intensity: Intensity,
}

/// Centrifuge lid and rotor state
#[derive(Clone, Debug)]
pub struct CentrifugeSimulator {
    config: CentrifugeConfig,
    lid: Phased<CentrifugePhase>,
}

impl CentrifugeSimulator {
    pub fn new(now: LabTime, config: CentrifugeConfig) -> Self {
        CentrifugeSimulator {
            config,
            lid: Phased::new(CentrifugePhase::Open, now, Duration::ZERO),
        }
    }

    #[inline]
    pub fn phase(&self) -> CentrifugePhase {
        self.lid.phase()
    }

    fn enter(&mut self, phase: CentrifugePhase, now: LabTime) {
        let window = match phase {
            CentrifugePhase::Closing => self.config.close,
            CentrifugePhase::Opening => self.config.open,
            CentrifugePhase::Open | CentrifugePhase::Spinning => Duration::ZERO,
        };
        debug!(from = ?self.lid.phase(), to = ?phase, "centrifuge phase");
        self.lid.enter(phase, now, window);
    }

    /// Stop the rotor: a closing or spinning centrifuge decelerates and opens
    pub fn stop(&mut self, now: LabTime) {
        if matches!(
            self.lid.phase(),
            CentrifugePhase::Closing | CentrifugePhase::Spinning
        ) {
            self.enter(CentrifugePhase::Opening, now);
        }
    }

    /// Advance the lid sequence. `drive` is whether the attachment is active
    /// with a positive speed.
    pub fn tick(&mut self, now: LabTime, drive: bool) {
        match self.lid.phase() {
            CentrifugePhase::Open if drive => self.enter(CentrifugePhase::Closing, now),
            CentrifugePhase::Closing | CentrifugePhase::Spinning if !drive => self.stop(now),
            CentrifugePhase::Closing if self.lid.timer().is_done(now) => {
                self.enter(CentrifugePhase::Spinning, now)
            }
            CentrifugePhase::Opening if self.lid.timer().is_done(now) => {
                self.enter(CentrifugePhase::Open, now)
            }
            _ => {}
        }
    }

    /// Separation progress at `now` for the current speed
    pub fn separation(&self, now: LabTime, rpm: f64) -> f64 {
        if !self.lid.is(CentrifugePhase::Spinning) {
            return 0.0;
        }
        let spun = self.lid.timer().elapsed(now).as_secs_f64();
        (spun / separation_duration(rpm)).min(1.0)
    }

    pub fn snapshot(&self, now: LabTime, rpm: f64, layers: &[LiquidLayer]) -> CentrifugeDisplay {
        let rpm = if rpm.is_finite() { rpm.max(0.0) } else { 0.0 };
        let separation = self.separation(now, rpm);
        CentrifugeDisplay {
            phase: self.lid.phase(),
            rpm,
            separation,
            bands: separate_layers(layers, separation),
            intensity: intensity(EquipmentClass::Centrifuge, rpm).unwrap_or(Intensity {
                level: IntensityLevel::Minimal,
                percent: 0.0,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> LabTime {
        LabTime::from_millis(v)
    }

    #[test]
    fn test_separation_duration() {
        assert_eq!(separation_duration(0.0), 5.0);
        assert_eq!(separation_duration(2500.0), 3.0);
        assert_eq!(separation_duration(5000.0), 1.0);
        assert_eq!(separation_duration(f64::NAN), 5.0);
    }

    #[test]
    fn test_bands_sorted_heaviest_first() {
        let layers = vec![
            LiquidLayer::new("blue", 1.2),
            LiquidLayer::new("clear", 0.9),
            LiquidLayer::new("amber", 1.0),
        ];
        let bands = separate_layers(&layers, 1.0);
        let densities: Vec<f64> = bands.iter().map(|b| b.density).collect();
        assert_eq!(densities, vec![1.2, 1.0, 0.9]);
        assert!(bands.iter().all(|b| (b.thickness - 1.0 / 3.0).abs() < 1e-9));
    }

    #[test]
    fn test_bands_follow_volume() {
        let layers = vec![
            LiquidLayer::new("oil", 0.9).with_volume(1.0),
            LiquidLayer::new("water", 1.0).with_volume(3.0),
        ];
        let bands = separate_layers(&layers, 0.5);
        assert_eq!(bands[0].color, "water");
        assert!((bands[0].share - 0.75).abs() < 1e-9);
        assert!((bands[0].thickness - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_lid_sequence() {
        let mut sim = CentrifugeSimulator::new(ms(0), CentrifugeConfig::default());
        assert_eq!(sim.phase(), CentrifugePhase::Open);

        sim.tick(ms(0), true);
        assert_eq!(sim.phase(), CentrifugePhase::Closing);
        sim.tick(ms(400), true);
        assert_eq!(sim.phase(), CentrifugePhase::Closing);
        sim.tick(ms(500), true);
        assert_eq!(sim.phase(), CentrifugePhase::Spinning);

        // 2500 RPM separates fully in 3 s
        assert!((sim.separation(ms(2_000), 2500.0) - 0.5).abs() < 1e-9);
        assert_eq!(sim.separation(ms(9_000), 2500.0), 1.0);

        sim.tick(ms(9_000), false);
        assert_eq!(sim.phase(), CentrifugePhase::Opening);
        assert_eq!(sim.separation(ms(9_000), 2500.0), 0.0);
        sim.tick(ms(11_999), false);
        assert_eq!(sim.phase(), CentrifugePhase::Opening);
        sim.tick(ms(12_000), false);
        assert_eq!(sim.phase(), CentrifugePhase::Open);
    }

    #[test]
    fn test_stop_while_open_is_noop() {
        let mut sim = CentrifugeSimulator::new(ms(0), CentrifugeConfig::default());
        sim.stop(ms(10));
        assert_eq!(sim.phase(), CentrifugePhase::Open);
    }
}
