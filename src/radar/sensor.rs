use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::host::{Capability, DeviceHost, TargetDistanceChanged};
use crate::tuya::{DpFrame, DpRecord};

use super::settings::{DeviceSettings, SettingKey, SettingsPatch};
use super::RadarDp;

/// IAS zone status change notification (cluster 0x0500, command 0x00).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ZoneStatusNotification {
    pub zone_status: u16,
    pub extended_status: u8,
    pub zone_id: u8,
    pub delay: u16,
}

impl ZoneStatusNotification {
    pub fn alarm1(&self) -> bool {
        self.zone_status & 0x0001 != 0
    }
}

/// Driver state for one radar presence sensor.
pub struct RadarSensor {
    name: String,
    settings: DeviceSettings,
    last_distance_update: Option<Instant>,
    transid: u8,
}

impl RadarSensor {
    pub fn new(name: impl Into<String>, settings: DeviceSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            last_distance_update: None,
            transid: 0,
        }
    }

    pub fn handle_frame(&mut self, frame: &DpFrame, now: Instant, host: &mut impl DeviceHost) {
        for record in &frame.records {
            self.handle_record(record, now, host);
        }
    }

    pub fn handle_record(&mut self, record: &DpRecord, now: Instant, host: &mut impl DeviceHost) {
        let Some(value) = record.value() else {
            warn!(
                "{}: dp {} has unknown datatype {}, ignoring",
                self.name, record.dp, record.datatype
            );
            return;
        };

        match RadarDp::from_code(record.dp) {
            Some(RadarDp::PresenceState) => {
                info!("{}: presence state: {}", self.name, value);
                set(host, Capability::AlarmMotion(value.is_truthy()));
            }
            Some(RadarDp::Sensitivity) => {
                info!("{}: sensitivity state: {}", self.name, value);
            }
            Some(RadarDp::IlluminanceLux) => {
                info!("{}: lux value: {}", self.name, value);
                let Some(lux) = value.as_number() else {
                    warn!("{}: non-numeric lux value {}", self.name, value);
                    return;
                };
                debug!("{}: measure_luminance (lux): {}", self.name, lux);
                set(host, Capability::MeasureLuminance(lux));
            }
            Some(RadarDp::TargetDistance) => {
                let interval = self.settings.distance_update_interval();
                if let Some(last) = self.last_distance_update {
                    if now.saturating_duration_since(last) < interval {
                        return;
                    }
                }
                let Some(raw) = value.as_number() else {
                    warn!("{}: non-numeric target distance {}", self.name, value);
                    return;
                };
                let target_distance = raw / 100.0;
                set(host, Capability::TargetDistance(target_distance));
                self.last_distance_update = Some(now);

                if let Err(e) =
                    host.trigger_target_distance_changed(TargetDistanceChanged { target_distance })
                {
                    error!(
                        "{}: failed to fire {}: {}",
                        self.name,
                        TargetDistanceChanged::TRIGGER_ID,
                        e
                    );
                }
            }
            _ => info!("{}: dp value {} {}", self.name, record.dp, value),
        }
    }

    pub fn on_ias_zone_status(
        &mut self,
        notification: &ZoneStatusNotification,
        host: &mut impl DeviceHost,
    ) {
        info!(
            "{}: IASZoneStatusChangeNotification received: {} {} {} {}",
            self.name,
            notification.zone_status,
            notification.extended_status,
            notification.zone_id,
            notification.delay
        );
        set(host, Capability::AlarmMotion(notification.alarm1()));
    }

    /// Write the changed device parameters of a settings patch. A key is only
    /// stored once the device write was handed to the host, so a failed write
    /// is retried by resending the same patch.
    pub fn on_settings(&mut self, patch: &SettingsPatch, host: &mut impl DeviceHost) {
        for (key, new) in self.settings.changes(patch) {
            let (dp, scale) = match key {
                SettingKey::RadarSensitivity => (RadarDp::Sensitivity, 1.0),
                SettingKey::MinimumRange => (RadarDp::MinimumRange, 100.0),
                SettingKey::MaximumRange => (RadarDp::MaximumRange, 100.0),
                SettingKey::DetectionDelay => (RadarDp::DetectionDelay, 1.0),
                SettingKey::FadingTime => (RadarDp::FadingTime, 1.0),
                SettingKey::DistanceUpdateInterval => {
                    if !new.is_finite() || new < 0.0 {
                        warn!("{}: invalid {} = {}", self.name, key.as_str(), new);
                        continue;
                    }
                    self.settings.set(key, new);
                    debug!(
                        "{}: distance update interval now {:?}",
                        self.name,
                        self.settings.distance_update_interval()
                    );
                    continue;
                }
            };

            let raw = new * scale;
            let Some(value) = to_u32(raw) else {
                warn!(
                    "{}: {} = {} cannot be written to the device",
                    self.name,
                    key.as_str(),
                    raw
                );
                continue;
            };

            let frame = DpFrame::write_value(self.next_transid(), dp as u8, value);
            info!(
                "{}: writing {} -> dp {} = {}",
                self.name,
                key.as_str(),
                dp as u8,
                value
            );
            if let Err(e) = host.write_datapoint(&frame) {
                error!("{}: failed to write {}: {}", self.name, key.as_str(), e);
                continue;
            }
            self.settings.set(key, new);
        }
    }

    pub fn on_removed(&self) {
        info!("{}: Radar sensor removed", self.name);
    }

    fn next_transid(&mut self) -> u8 {
        let id = self.transid;
        self.transid = self.transid.wrapping_add(1);
        id
    }
}

fn set(host: &mut impl DeviceHost, capability: Capability) {
    if let Err(e) = host.set_capability(capability) {
        warn!("Failed to set {}: {}", capability.name(), e);
    }
}

fn to_u32(value: f64) -> Option<u32> {
    let rounded = value.round();
    (rounded.is_finite() && rounded >= 0.0 && rounded <= f64::from(u32::MAX))
        .then_some(rounded as u32)
}
