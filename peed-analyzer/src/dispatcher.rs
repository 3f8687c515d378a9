// Peed Analyzer - Notification dispatch
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Best-effort delivery of anomaly events to the notification endpoint.
//!
//! A dispatch is one timeout-bounded `POST`. Success means HTTP 201 with a
//! JSON body carrying `notif_id`; every other status and every transport
//! failure becomes a [`NotificationRecord::Failure`]. Nothing here returns
//! an error to the caller.

use crate::retry::RetryStrategy;
use async_trait::async_trait;
use peed::{Reading, TEMPERATURE_UNIT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Header carrying the shared token.
pub const TOKEN_HEADER: &str = "X-API-TOKEN";

/// Human-readable label sent with every anomaly.
pub const DEFAULT_ANOMALY_LABEL: &str = "Température moteur élevée";

/// Default endpoint of the notification API.
pub const DEFAULT_NOTIFY_URL: &str = "http://127.0.0.1:5000/sap/api/notifications";

/// Longest response body kept in a failure record.
const MAX_BODY_CHARS: usize = 512;

/// Anomaly to be delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyEvent {
    pub device_id: String,
    pub temperature: f64,
    /// Original reading timestamp, forwarded verbatim.
    pub timestamp: String,
}

impl From<&Reading> for AnomalyEvent {
    fn from(reading: &Reading) -> Self {
        Self {
            device_id: reading.device_id.clone(),
            temperature: reading.temperature,
            timestamp: reading.timestamp.clone(),
        }
    }
}

/// JSON body expected by the notification API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub machine: String,
    pub anomalie: String,
    pub valeur: f64,
    pub unite: String,
    pub timestamp: String,
}

impl NotificationPayload {
    pub fn new(event: &AnomalyEvent, label: &str) -> Self {
        Self {
            machine: event.device_id.clone(),
            anomalie: label.to_string(),
            valeur: event.temperature,
            unite: TEMPERATURE_UNIT.to_string(),
            timestamp: event.timestamp.clone(),
        }
    }
}

/// Why a dispatch did not produce a notification.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchFailure {
    /// Endpoint answered with something other than 201
    #[error("status={status} body={body}")]
    Status { status: u16, body: String },

    /// 201 without a usable `notif_id`
    #[error("created without notif_id: body={body}")]
    MissingId { body: String },

    /// Timeout, refused connection, TLS failure...
    #[error("{0}")]
    Transport(String),
}

impl DispatchFailure {
    /// Transport failures and server errors may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::MissingId { .. } => false,
        }
    }
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationRecord {
    Success { notif_id: String },
    Failure(DispatchFailure),
}

impl NotificationRecord {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Metrics label.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure(_) => "failure",
        }
    }
}

/// Delivers anomaly events somewhere.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one event. Must not panic or block beyond its own timeout.
    async fn notify(&self, event: &AnomalyEvent) -> NotificationRecord;
}

/// Configuration of the HTTP dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub url: String,
    pub token: String,
    pub timeout: Duration,
    pub anomaly_label: String,
    pub retry: RetryStrategy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_NOTIFY_URL.to_string(),
            token: String::new(),
            timeout: Duration::from_secs(5),
            anomaly_label: DEFAULT_ANOMALY_LABEL.to_string(),
            retry: RetryStrategy::None,
        }
    }
}

impl DispatcherConfig {
    /// Default configuration for a given endpoint and token
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            ..Default::default()
        }
    }
}

/// `Notifier` posting JSON to the notification API.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: reqwest::Client,
    config: DispatcherConfig,
}

#[derive(Deserialize)]
struct CreatedResponse {
    notif_id: Option<String>,
}

impl HttpDispatcher {
    pub fn new(config: DispatcherConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    async fn attempt(&self, payload: &NotificationPayload) -> NotificationRecord {
        let response = match self
            .client
            .post(&self.config.url)
            .header(TOKEN_HEADER, &self.config.token)
            .json(payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return NotificationRecord::Failure(DispatchFailure::Transport(e.to_string())),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return NotificationRecord::Failure(DispatchFailure::Transport(e.to_string())),
        };

        if status != StatusCode::CREATED {
            return NotificationRecord::Failure(DispatchFailure::Status {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        match serde_json::from_str::<CreatedResponse>(&body) {
            Ok(CreatedResponse {
                notif_id: Some(notif_id),
            }) => NotificationRecord::Success { notif_id },
            _ => NotificationRecord::Failure(DispatchFailure::MissingId {
                body: truncate(&body),
            }),
        }
    }
}

#[async_trait]
impl Notifier for HttpDispatcher {
    async fn notify(&self, event: &AnomalyEvent) -> NotificationRecord {
        let payload = NotificationPayload::new(event, &self.config.anomaly_label);
        let mut retried = 0;
        loop {
            let record = self.attempt(&payload).await;
            if let NotificationRecord::Failure(failure) = &record {
                if let Some(delay) = self.config.retry.next_delay(failure, retried) {
                    warn!(
                        "Notification for {} failed ({}), retrying in {:?}",
                        event.device_id, failure, delay
                    );
                    tokio::time::sleep(delay).await;
                    retried += 1;
                    continue;
                }
            }
            debug!(
                "Notification for {} finished after {} attempt(s): {}",
                event.device_id,
                retried + 1,
                record.outcome()
            );
            return record;
        }
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_BODY_CHARS).collect()
}
