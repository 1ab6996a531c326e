use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::config::Config;
use crate::host::{Capability, DeviceHost, HostError, TargetDistanceChanged};
use crate::tuya::frame::{DpFrame, TUYA_CLUSTER_ID, TuyaCommand};

/// An outgoing MQTT publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

/// Cluster command handed to the coordinator on the `tuya/set` topic.
#[derive(Serialize)]
struct ClusterCommand {
    cluster: u16,
    command: u8,
    payload: String,
}

/// `DeviceHost` backed by the MQTT publish queue. Never blocks: a full
/// queue surfaces as `HostError::Busy`.
pub struct MqttHost {
    config: Config,
    outbox: mpsc::Sender<Publication>,
}

impl MqttHost {
    pub fn new(config: Config, outbox: mpsc::Sender<Publication>) -> Self {
        Self { config, outbox }
    }

    fn publish(&self, topic: String, payload: String, retain: bool) -> Result<(), HostError> {
        self.outbox
            .try_send(Publication {
                topic,
                payload,
                retain,
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => HostError::Busy,
                TrySendError::Closed(_) => HostError::Closed,
            })
    }
}

impl DeviceHost for MqttHost {
    fn set_capability(&mut self, capability: Capability) -> Result<(), HostError> {
        let topic = self.config.state_topic(capability.name());
        self.publish(topic, capability.value_string(), true)
    }

    fn trigger_target_distance_changed(
        &mut self,
        event: TargetDistanceChanged,
    ) -> Result<(), HostError> {
        let payload =
            serde_json::to_string(&event).map_err(|e| HostError::Serialize(e.to_string()))?;
        let topic = self.config.trigger_topic(TargetDistanceChanged::TRIGGER_ID);
        self.publish(topic, payload, false)
    }

    fn write_datapoint(&mut self, frame: &DpFrame) -> Result<(), HostError> {
        let encoded = frame.encode().map_err(|e| HostError::Serialize(e.to_string()))?;
        let command = ClusterCommand {
            cluster: TUYA_CLUSTER_ID,
            command: TuyaCommand::DataRequest as u8,
            payload: hex::encode(encoded),
        };
        let payload =
            serde_json::to_string(&command).map_err(|e| HostError::Serialize(e.to_string()))?;
        self.publish(self.config.tuya_set_topic(), payload, false)
    }
}
