// Peed Analyzer - MQTT transport client
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! MQTT subscription over mutual TLS.
//!
//! The transport owns the network session and nothing else: every PUBLISH
//! is decoded and handed to the ingestion queue, rejected payloads are
//! audited and dropped. A refused CONNACK or any connection error ends the
//! session; there is no reconnect loop.

use crate::audit::{AuditEntry, AuditSink};
use crate::error::TransportError;
use crate::metrics;
use crate::queue::{EnqueueError, IngestSender};
use peed::{Reading, TlsMaterial};
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Packet, QoS,
    SubscribeReasonCode, TlsConfiguration, Transport,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default broker host.
pub const DEFAULT_MQTT_HOST: &str = "localhost";

/// Default broker port (MQTT over TLS).
pub const DEFAULT_MQTT_PORT: u16 = 8883;

/// Default subscription topic.
pub const DEFAULT_MQTT_TOPIC: &str = "usine/capteurs/machine1";

/// Default client identifier.
pub const DEFAULT_CLIENT_ID: &str = "peed-analyzer";

/// Capacity of the client request channel.
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// How long to keep polling after DISCONNECT is queued.
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

/// Broker connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
    pub keep_alive: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MQTT_HOST.to_string(),
            port: DEFAULT_MQTT_PORT,
            topic: DEFAULT_MQTT_TOPIC.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            keep_alive: Duration::from_secs(60),
        }
    }
}

impl TransportConfig {
    /// MQTT options with mutual TLS from the given material
    pub fn mqtt_options(&self, tls: &TlsMaterial) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_transport(Transport::tls_with_config(TlsConfiguration::Simple {
            ca: tls.ca.clone(),
            alpn: None,
            client_auth: Some((tls.client_cert.clone(), tls.client_key.clone())),
        }));
        options
    }
}

/// Subscriber feeding the ingestion queue
pub struct MqttTransport {
    config: TransportConfig,
    client: AsyncClient,
    eventloop: EventLoop,
}

impl MqttTransport {
    /// Prepare the session. No network traffic happens until [`run`](Self::run).
    pub fn new(config: TransportConfig, tls: TlsMaterial) -> Self {
        let options = config.mqtt_options(&tls);
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        Self {
            config,
            client,
            eventloop,
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Drive the session until shutdown or a fatal error.
    ///
    /// The sender is dropped on return, which lets the worker drain and stop.
    pub async fn run(
        mut self,
        sender: IngestSender,
        audit: Arc<dyn AuditSink>,
        shutdown: CancellationToken,
    ) -> Result<(), TransportError> {
        info!(
            "Connecting to mqtts://{}:{} as {}",
            self.config.host, self.config.port, self.config.client_id
        );

        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => None,
                event = self.eventloop.poll() => Some(event),
            };
            let Some(event) = polled else {
                self.disconnect().await;
                return Ok(());
            };

            match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    audit.record(&AuditEntry::transport(format!("connect rc={:?}", ack.code)));
                    if ack.code != ConnectReturnCode::Success {
                        let code = format!("{:?}", ack.code);
                        audit.record(&AuditEntry::transport_error(format!(
                            "connection refused: code={}",
                            code
                        )));
                        return Err(TransportError::Refused { code });
                    }
                    self.client
                        .subscribe(&self.config.topic, QoS::AtLeastOnce)
                        .await?;
                    audit.record(&AuditEntry::transport(format!(
                        "SUBSCRIBE {}",
                        self.config.topic
                    )));
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    debug!(
                        "PUBLISH on {} ({} bytes)",
                        publish.topic,
                        publish.payload.len()
                    );
                    handle_payload(&publish.payload, &sender, audit.as_ref());
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    if ack
                        .return_codes
                        .iter()
                        .any(|code| matches!(code, SubscribeReasonCode::Failure))
                    {
                        warn!("Broker rejected subscription to {}", self.config.topic);
                        audit.record(&AuditEntry::transport_error(format!(
                            "SUBSCRIBE {} rejected",
                            self.config.topic
                        )));
                    }
                }
                Ok(_) => {}
                Err(ConnectionError::ConnectionRefused(code)) => {
                    let code = format!("{:?}", code);
                    audit.record(&AuditEntry::transport_error(format!(
                        "connection refused: code={}",
                        code
                    )));
                    return Err(TransportError::Refused { code });
                }
                Err(e) => {
                    audit.record(&AuditEntry::transport_error(format!("connection failed: {}", e)));
                    return Err(e.into());
                }
            }
        }
    }

    async fn disconnect(&mut self) {
        info!("Disconnecting from broker");
        if let Err(e) = self.client.disconnect().await {
            warn!("Failed to queue DISCONNECT: {}", e);
            return;
        }
        // Flush the DISCONNECT packet; the loop ends with an error once the
        // session is closed.
        let _ = tokio::time::timeout(DISCONNECT_GRACE, async {
            while self.eventloop.poll().await.is_ok() {}
        })
        .await;
    }
}

/// Decode one transport payload and enqueue it.
///
/// Returns `true` when the reading reached the queue. Decode failures are
/// audited; overflow is already reported by the queue.
pub fn handle_payload(payload: &[u8], sender: &IngestSender, audit: &dyn AuditSink) -> bool {
    let reading = match Reading::from_payload(payload) {
        Ok(reading) => reading,
        Err(e) => {
            metrics::record_decode_error();
            audit.record(&AuditEntry::ParseError {
                reason: e.to_string(),
            });
            return false;
        }
    };

    match sender.enqueue(reading) {
        Ok(()) => true,
        Err(EnqueueError::Full(_)) => false,
        Err(e @ EnqueueError::Closed(_)) => {
            debug!("{}", e);
            false
        }
    }
}
