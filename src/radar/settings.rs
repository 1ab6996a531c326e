use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    DistanceUpdateInterval,
    RadarSensitivity,
    MinimumRange,
    MaximumRange,
    DetectionDelay,
    FadingTime,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        Self::DistanceUpdateInterval,
        Self::RadarSensitivity,
        Self::MinimumRange,
        Self::MaximumRange,
        Self::DetectionDelay,
        Self::FadingTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DistanceUpdateInterval => "distance_update_interval",
            Self::RadarSensitivity => "radar_sensitivity",
            Self::MinimumRange => "minimum_range",
            Self::MaximumRange => "maximum_range",
            Self::DetectionDelay => "detection_delay",
            Self::FadingTime => "fading_time",
        }
    }
}

/// User-facing device settings. Ranges are in metres, the interval and fading
/// time in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub distance_update_interval: f64,
    pub radar_sensitivity: f64,
    pub minimum_range: f64,
    pub maximum_range: f64,
    pub detection_delay: f64,
    pub fading_time: f64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            distance_update_interval: 10.0,
            radar_sensitivity: 7.0,
            minimum_range: 0.0,
            maximum_range: 6.0,
            detection_delay: 1.0,
            fading_time: 30.0,
        }
    }
}

/// A partial settings update as sent by the settings UI.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SettingsPatch {
    pub distance_update_interval: Option<f64>,
    pub radar_sensitivity: Option<f64>,
    pub minimum_range: Option<f64>,
    pub maximum_range: Option<f64>,
    pub detection_delay: Option<f64>,
    pub fading_time: Option<f64>,
}

impl SettingsPatch {
    pub fn get(&self, key: SettingKey) -> Option<f64> {
        match key {
            SettingKey::DistanceUpdateInterval => self.distance_update_interval,
            SettingKey::RadarSensitivity => self.radar_sensitivity,
            SettingKey::MinimumRange => self.minimum_range,
            SettingKey::MaximumRange => self.maximum_range,
            SettingKey::DetectionDelay => self.detection_delay,
            SettingKey::FadingTime => self.fading_time,
        }
    }
}

impl DeviceSettings {
    /// Minimum spacing between applied distance updates. Negative or
    /// non-finite intervals disable suppression.
    pub fn distance_update_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.distance_update_interval).unwrap_or(Duration::ZERO)
    }

    /// Keys in `patch` whose value differs from the current one, with the
    /// new value, in declaration order. Nothing is stored; see `set`.
    pub fn changes(&self, patch: &SettingsPatch) -> Vec<(SettingKey, f64)> {
        SettingKey::ALL
            .into_iter()
            .filter_map(|key| patch.get(key).map(|new| (key, new)))
            .filter(|&(key, new)| new != self.get(key))
            .collect()
    }

    pub fn set(&mut self, key: SettingKey, value: f64) {
        let field = match key {
            SettingKey::DistanceUpdateInterval => &mut self.distance_update_interval,
            SettingKey::RadarSensitivity => &mut self.radar_sensitivity,
            SettingKey::MinimumRange => &mut self.minimum_range,
            SettingKey::MaximumRange => &mut self.maximum_range,
            SettingKey::DetectionDelay => &mut self.detection_delay,
            SettingKey::FadingTime => &mut self.fading_time,
        };
        *field = value;
    }

    pub fn get(&self, key: SettingKey) -> f64 {
        match key {
            SettingKey::DistanceUpdateInterval => self.distance_update_interval,
            SettingKey::RadarSensitivity => self.radar_sensitivity,
            SettingKey::MinimumRange => self.minimum_range,
            SettingKey::MaximumRange => self.maximum_range,
            SettingKey::DetectionDelay => self.detection_delay,
            SettingKey::FadingTime => self.fading_time,
        }
    }
}
