// Peed Sensor - MQTT publisher
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Periodic QoS 1 publication of generated readings.

use crate::error::Result;
use crate::generator::TemperatureGenerator;
use peed::TlsMaterial;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Broker and cadence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
    pub period: Duration,
    pub keep_alive: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8883,
            topic: "usine/capteurs/machine1".to_string(),
            client_id: client_id_for("Machine_01"),
            period: Duration::from_secs(5),
            keep_alive: Duration::from_secs(60),
        }
    }
}

/// Client identifier used by a simulated device.
pub fn client_id_for(device_id: &str) -> String {
    format!("capteur-{}", device_id)
}

/// Publishes one reading per period until shutdown.
pub struct SensorPublisher {
    config: PublisherConfig,
    options: MqttOptions,
}

impl SensorPublisher {
    pub fn new(config: PublisherConfig, tls: TlsMaterial) -> Self {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(config.keep_alive);
        options.set_transport(Transport::tls_with_config(TlsConfiguration::Simple {
            ca: tls.ca,
            alpn: None,
            client_auth: Some((tls.client_cert, tls.client_key)),
        }));
        Self { config, options }
    }

    /// Publish until `shutdown` is cancelled. Returns the number of
    /// readings handed to the client.
    pub async fn run(
        self,
        mut generator: TemperatureGenerator,
        shutdown: CancellationToken,
    ) -> Result<u64> {
        let (client, mut eventloop) = AsyncClient::new(self.options, 10);
        let mut ticker = tokio::time::interval(self.config.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut published = 0u64;

        info!(
            "[SENSOR] Started. Publishing on {} every {:?}",
            self.config.topic, self.config.period
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let emission = generator.next_emission();
                    if emission.injected {
                        warn!(
                            "[SENSOR] >> simulated anomaly: {:.2}°C",
                            emission.reading.temperature
                        );
                    }
                    let payload = emission.reading.to_payload();
                    let text = String::from_utf8_lossy(&payload).into_owned();
                    match client.try_publish(&self.config.topic, QoS::AtLeastOnce, false, payload) {
                        Ok(()) => {
                            published += 1;
                            info!("[SENSOR] Published: {}", text);
                        }
                        Err(e) => warn!("[SENSOR] Reading dropped: {}", e),
                    }
                }
                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        info!("[MQTT] connect rc={:?}", ack.code);
                    }
                    Ok(other) => debug!("{:?}", other),
                    Err(e) => return Err(e.into()),
                },
            }
        }

        info!("[SENSOR] Stopping");
        client.try_disconnect()?;
        let _ = tokio::time::timeout(Duration::from_secs(2), async {
            while eventloop.poll().await.is_ok() {}
        })
        .await;
        Ok(published)
    }
}
