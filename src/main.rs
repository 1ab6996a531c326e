mod config;
mod host;
mod mqtt;
mod radar;
mod tuya;

use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use mqtt::host::MqttHost;
use mqtt::inbound::Inbound;
use radar::RadarSensor;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting tuya-radar-bridge (mqtt={}:{}, device={} at {})",
        config.mqtt.broker_host,
        config.mqtt.broker_port,
        config.device.name,
        config.device_topic(),
    );

    // Channels
    let (inbound_tx, mut inbound_rx) = mpsc::channel::<mqtt::client::MqttMessage>(100);
    let (outbox_tx, outbox_rx) = mpsc::channel::<mqtt::host::Publication>(200);

    let mqtt_client = mqtt::client::MqttClient::new(&config);
    let mqtt_handle = tokio::spawn(async move {
        mqtt_client.run(inbound_tx, outbox_rx).await;
    });

    let mut host = MqttHost::new(config.clone(), outbox_tx);
    let mut sensor = RadarSensor::new(config.device.name.clone(), config.device.settings.clone());

    // Main loop: every inbound message is handled to completion before the next.
    loop {
        tokio::select! {
            Some(msg) = inbound_rx.recv() => {
                match Inbound::parse(&msg, &config) {
                    Ok(Some(Inbound::Tuya(frame))) => {
                        sensor.handle_frame(&frame, Instant::now(), &mut host);
                    }
                    Ok(Some(Inbound::IasZone(notification))) => {
                        sensor.on_ias_zone_status(&notification, &mut host);
                    }
                    Ok(Some(Inbound::Settings(patch))) => {
                        sensor.on_settings(&patch, &mut host);
                    }
                    Ok(None) => {
                        warn!("Unexpected topic: {}", msg.topic);
                    }
                    Err(e) => {
                        warn!("Dropping message on {}: {}", msg.topic, e);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down");
                break;
            }
            _ = async {
                let mut sigterm = tokio::signal::unix::signal(
                    tokio::signal::unix::SignalKind::terminate()
                ).expect("Failed to register SIGTERM handler");
                sigterm.recv().await;
            } => {
                info!("Received SIGTERM, shutting down");
                break;
            }
        }
    }

    // Cleanup
    sensor.on_removed();
    mqtt_handle.abort();
    info!("tuya-radar-bridge stopped");
}
