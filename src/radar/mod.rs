pub mod sensor;
pub mod settings;

pub use sensor::{RadarSensor, ZoneStatusNotification};
pub use settings::{DeviceSettings, SettingsPatch};

/// Data points emitted by the radar presence sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadarDp {
    IlluminanceLux = 104,
    PresenceState = 105,
    Sensitivity = 106,
    MaximumRange = 107,
    MinimumRange = 108,
    TargetDistance = 109,
    FadingTime = 110,
    DetectionDelay = 111,
}

impl RadarDp {
    pub fn from_code(dp: u8) -> Option<Self> {
        match dp {
            104 => Some(Self::IlluminanceLux),
            105 => Some(Self::PresenceState),
            106 => Some(Self::Sensitivity),
            107 => Some(Self::MaximumRange),
            108 => Some(Self::MinimumRange),
            109 => Some(Self::TargetDistance),
            110 => Some(Self::FadingTime),
            111 => Some(Self::DetectionDelay),
            _ => None,
        }
    }
}
