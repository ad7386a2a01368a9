//! Class-specific display snapshots

use labsim_core::EquipmentClass;

use crate::{
    BalanceDisplay, BalancePhase, CentrifugeDisplay, HeatingDisplay, PhMeterDisplay, SensorState,
    StirrerDisplay, ThermometerDisplay, TimerDisplay,
};

/// What one attachment shows right now
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayState {
    /// Attached but switched off
    Inactive { class: EquipmentClass },
    Heating(HeatingDisplay),
    Stirrer(StirrerDisplay),
    Centrifuge(CentrifugeDisplay),
    PhMeter(PhMeterDisplay),
    Thermometer(ThermometerDisplay),
    Balance(BalanceDisplay),
    Timer(TimerDisplay),
}

/// Reportable abnormal instrument state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DegradedState {
    Frozen,
    Overheating,
    Failure,
    Overload,
}

impl DegradedState {
    pub fn name(self) -> &'static str {
        match self {
            DegradedState::Frozen => "frozen",
            DegradedState::Overheating => "overheating",
            DegradedState::Failure => "failure",
            DegradedState::Overload => "overload",
        }
    }
}

impl std::fmt::Display for DegradedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl DisplayState {
    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self, DisplayState::Inactive { .. })
    }

    /// Degraded condition shown by this snapshot, if any
    pub fn degraded(&self) -> Option<DegradedState> {
        match self {
            DisplayState::Thermometer(t) => match t.sensor? {
                SensorState::Frozen => Some(DegradedState::Frozen),
                SensorState::Overheating => Some(DegradedState::Overheating),
                SensorState::Failure => Some(DegradedState::Failure),
                SensorState::Normal => None,
            },
            DisplayState::Balance(b) if b.phase == BalancePhase::Overload => {
                Some(DegradedState::Overload)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProbePhase;

    #[test]
    fn test_thermometer_degraded() {
        let shown = DisplayState::Thermometer(ThermometerDisplay {
            phase: ProbePhase::Stable,
            reading: Some(320.0),
            sensor: Some(SensorState::Overheating),
            mercury: 0.9,
        });
        assert_eq!(shown.degraded(), Some(DegradedState::Overheating));
        assert!(shown.is_active());
    }

    #[test]
    fn test_inactive_is_not_degraded() {
        let shown = DisplayState::Inactive {
            class: EquipmentClass::Thermometer,
        };
        assert_eq!(shown.degraded(), None);
        assert!(!shown.is_active());
    }

    #[test]
    fn test_overload_degraded() {
        let shown = DisplayState::Balance(BalanceDisplay {
            phase: BalancePhase::Overload,
            value: None,
            target: 250.0,
            tare_offset: 0.0,
            stable: false,
        });
        assert_eq!(shown.degraded(), Some(DegradedState::Overload));
        assert_eq!(DegradedState::Overload.to_string(), "overload");
    }
}
