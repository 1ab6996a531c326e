use std::env;

use crate::radar::DeviceSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub device: DeviceConfig,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic_prefix: String,
    pub client_id: String,
}

#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub name: String,
    /// Sanitized name for use in MQTT topics (lowercase, spaces to underscores)
    pub topic_name: String,
    pub settings: DeviceSettings,
}

fn env_required(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("{key} environment variable is required"))
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let settings = match env_optional("DEVICE_SETTINGS_FILE") {
            Some(path) => load_settings(&path)?,
            None => DeviceSettings::default(),
        };
        let name = env_or_default("DEVICE_NAME", "Radar Sensor".to_string());

        let config = Self {
            mqtt: MqttConfig {
                broker_host: env_required("MQTT_BROKER_HOST")?,
                broker_port: env_or_default("MQTT_BROKER_PORT", 1883),
                username: env_optional("MQTT_USERNAME"),
                password: env_optional("MQTT_PASSWORD"),
                topic_prefix: env_or_default("MQTT_TOPIC_PREFIX", "tuya".to_string()),
                client_id: env_or_default("MQTT_CLIENT_ID", "tuya-radar-bridge".to_string()),
            },
            device: DeviceConfig {
                topic_name: sanitize_topic_name(&name),
                name,
                settings,
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.mqtt.broker_host.is_empty() {
            return Err("MQTT_BROKER_HOST must not be empty".into());
        }
        if self.device.topic_name.is_empty() {
            return Err("DEVICE_NAME has no alphanumeric characters".into());
        }
        let interval = self.device.settings.distance_update_interval;
        if !interval.is_finite() || interval < 0.0 {
            return Err(format!("invalid distance_update_interval {interval}"));
        }
        Ok(())
    }

    /// `{prefix}/{device}`
    pub fn device_topic(&self) -> String {
        format!("{}/{}", self.mqtt.topic_prefix, self.device.topic_name)
    }

    pub fn status_topic(&self) -> String {
        format!("{}/bridge_status", self.device_topic())
    }

    pub fn tuya_response_topic(&self) -> String {
        format!("{}/tuya/response", self.device_topic())
    }

    pub fn tuya_set_topic(&self) -> String {
        format!("{}/tuya/set", self.device_topic())
    }

    pub fn ias_zone_topic(&self) -> String {
        format!("{}/ias_zone", self.device_topic())
    }

    pub fn settings_topic(&self) -> String {
        format!("{}/settings/set", self.device_topic())
    }

    pub fn state_topic(&self, capability: &str) -> String {
        format!("{}/state/{}", self.device_topic(), capability)
    }

    pub fn trigger_topic(&self, trigger: &str) -> String {
        format!("{}/trigger/{}", self.device_topic(), trigger)
    }
}

fn load_settings(path: &str) -> Result<DeviceSettings, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {path}: {e}"))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse {path}: {e}"))
}

/// Convert a device name into a safe MQTT topic segment.
/// "Hallway Radar" → "hallway_radar"
fn sanitize_topic_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        mqtt: MqttConfig {
            broker_host: "localhost".into(),
            broker_port: 1883,
            username: None,
            password: None,
            topic_prefix: "tuya".into(),
            client_id: "test".into(),
        },
        device: DeviceConfig {
            name: "Hallway Radar".into(),
            topic_name: "hallway_radar".into(),
            settings: DeviceSettings::default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_topic_name("Hallway Radar"), "hallway_radar");
        assert_eq!(sanitize_topic_name(" (Radar) "), "radar");
        assert_eq!(sanitize_topic_name("!!"), "");
    }

    #[test]
    fn topics() {
        let config = test_config();
        assert_eq!(config.status_topic(), "tuya/hallway_radar/bridge_status");
        assert_eq!(
            config.tuya_response_topic(),
            "tuya/hallway_radar/tuya/response"
        );
        assert_eq!(
            config.state_topic("alarm_motion"),
            "tuya/hallway_radar/state/alarm_motion"
        );
        assert_eq!(
            config.trigger_topic("target_distance_changed"),
            "tuya/hallway_radar/trigger/target_distance_changed"
        );
    }

    #[test]
    fn rejects_negative_interval() {
        let mut config = test_config();
        config.device.settings.distance_update_interval = -5.0;
        assert!(config.validate().is_err());
        config.device.settings.distance_update_interval = 0.0;
        assert!(config.validate().is_ok());
    }
}
