use serde::Serialize;
use thiserror::Error;

use crate::tuya::DpFrame;

/// A host-visible device capability and its new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Capability {
    AlarmMotion(bool),
    /// Metres.
    TargetDistance(f64),
    /// Lux.
    MeasureLuminance(f64),
}

impl Capability {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AlarmMotion(_) => "alarm_motion",
            Self::TargetDistance(_) => "target_distance",
            Self::MeasureLuminance(_) => "measure_luminance",
        }
    }

    pub fn value_string(&self) -> String {
        match self {
            Self::AlarmMotion(b) => b.to_string(),
            Self::TargetDistance(v) | Self::MeasureLuminance(v) => v.to_string(),
        }
    }
}

/// Tokens and state of the `target_distance_changed` flow trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetDistanceChanged {
    pub target_distance: f64,
}

impl TargetDistanceChanged {
    pub const TRIGGER_ID: &'static str = "target_distance_changed";
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Host outbox full")]
    Busy,

    #[error("Host connection closed")]
    Closed,

    #[error("Serialization failed: {0}")]
    Serialize(String),
}

/// What the driver needs from the home automation host.
/// Calls must not block; the driver processes one frame at a time.
pub trait DeviceHost {
    fn set_capability(&mut self, capability: Capability) -> Result<(), HostError>;

    fn trigger_target_distance_changed(
        &mut self,
        event: TargetDistanceChanged,
    ) -> Result<(), HostError>;

    /// Hand a Tuya datapoint command to the cluster transport.
    fn write_datapoint(&mut self, frame: &DpFrame) -> Result<(), HostError>;
}

#[cfg(test)]
pub mod fake {
    use super::*;

    /// Records every host call; optionally fails triggers or writes.
    #[derive(Default)]
    pub struct RecordingHost {
        pub capabilities: Vec<Capability>,
        pub triggers: Vec<TargetDistanceChanged>,
        pub writes: Vec<DpFrame>,
        pub fail_triggers: bool,
        pub fail_writes: bool,
    }

    impl DeviceHost for RecordingHost {
        fn set_capability(&mut self, capability: Capability) -> Result<(), HostError> {
            self.capabilities.push(capability);
            Ok(())
        }

        fn trigger_target_distance_changed(
            &mut self,
            event: TargetDistanceChanged,
        ) -> Result<(), HostError> {
            if self.fail_triggers {
                return Err(HostError::Closed);
            }
            self.triggers.push(event);
            Ok(())
        }

        fn write_datapoint(&mut self, frame: &DpFrame) -> Result<(), HostError> {
            if self.fail_writes {
                return Err(HostError::Busy);
            }
            self.writes.push(frame.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_names_and_values() {
        assert_eq!(Capability::AlarmMotion(true).name(), "alarm_motion");
        assert_eq!(Capability::AlarmMotion(true).value_string(), "true");
        assert_eq!(Capability::TargetDistance(1.5).name(), "target_distance");
        assert_eq!(Capability::TargetDistance(1.5).value_string(), "1.5");
        assert_eq!(Capability::MeasureLuminance(120.0).value_string(), "120");
    }

    #[test]
    fn trigger_tokens_serialize() {
        let event = TargetDistanceChanged {
            target_distance: 2.5,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"target_distance":2.5}"#);
    }
}
