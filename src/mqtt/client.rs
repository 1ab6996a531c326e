use std::collections::HashMap;

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Config;

use super::host::Publication;

pub struct MqttMessage {
    pub topic: String,
    pub payload: String,
}

pub struct MqttClient {
    client: AsyncClient,
    eventloop: EventLoop,
    config: Config,
}

impl MqttClient {
    pub fn new(config: &Config) -> Self {
        let mut mqttopts = MqttOptions::new(
            &config.mqtt.client_id,
            &config.mqtt.broker_host,
            config.mqtt.broker_port,
        );
        mqttopts.set_keep_alive(std::time::Duration::from_secs(30));

        if let (Some(user), Some(pass)) = (&config.mqtt.username, &config.mqtt.password) {
            mqttopts.set_credentials(user, pass);
        }

        // LWT: publish "offline" on disconnect.
        let lwt = rumqttc::LastWill::new(
            config.status_topic(),
            "offline".as_bytes().to_vec(),
            QoS::AtLeastOnce,
            true,
        );
        mqttopts.set_last_will(lwt);

        let (client, eventloop) = AsyncClient::new(mqttopts, 100);

        Self {
            client,
            eventloop,
            config: config.clone(),
        }
    }

    /// Run the MQTT event loop. Subscribes to the device's inbound topics on
    /// connect, forwards incoming publish messages through inbound_tx, and
    /// publishes whatever the device host queues on outbox.
    pub async fn run(
        mut self,
        inbound_tx: mpsc::Sender<MqttMessage>,
        mut outbox: mpsc::Receiver<Publication>,
    ) {
        let subscribe_topics = [
            self.config.tuya_response_topic(),
            self.config.ias_zone_topic(),
            self.config.settings_topic(),
        ];

        // Retained state is only republished when it changes.
        let mut last_values: HashMap<String, String> = HashMap::new();

        loop {
            tokio::select! {
                event = self.eventloop.poll() => {
                    match event {
                        Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                            info!("Connected to MQTT broker");

                            let topic = self.config.status_topic();
                            if let Err(e) = self
                                .client
                                .publish(&topic, QoS::AtLeastOnce, true, "online")
                                .await
                            {
                                error!("Failed to publish online status: {}", e);
                            }

                            for topic in &subscribe_topics {
                                if let Err(e) = self
                                    .client
                                    .subscribe(topic, QoS::AtLeastOnce)
                                    .await
                                {
                                    error!("Failed to subscribe to {}: {}", topic, e);
                                }
                            }
                        }
                        Ok(Event::Incoming(Incoming::Publish(publish))) => {
                            let payload = String::from_utf8_lossy(&publish.payload).to_string();
                            let msg = MqttMessage {
                                topic: publish.topic.clone(),
                                payload,
                            };
                            if inbound_tx.send(msg).await.is_err() {
                                warn!("Inbound channel closed");
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("MQTT connection error: {}. Reconnecting...", e);
                            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        }
                    }
                }
                Some(publication) = outbox.recv() => {
                    if publication.retain {
                        if last_values.get(&publication.topic) == Some(&publication.payload) {
                            debug!("Unchanged {}, not republishing", publication.topic);
                            continue;
                        }
                        last_values.insert(publication.topic.clone(), publication.payload.clone());
                    }

                    info!("Publishing {}: {}", publication.topic, publication.payload);
                    let qos = if publication.retain {
                        QoS::AtLeastOnce
                    } else {
                        QoS::AtMostOnce
                    };
                    if let Err(e) = self
                        .client
                        .publish(
                            &publication.topic,
                            qos,
                            publication.retain,
                            publication.payload.into_bytes(),
                        )
                        .await
                    {
                        warn!("Failed to publish {}: {}", publication.topic, e);
                    }
                }
            }
        }
    }
}
