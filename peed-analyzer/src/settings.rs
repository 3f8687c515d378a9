// Peed Analyzer - Command line and environment settings
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Runtime settings.
//!
//! Every option can be given as a flag or through the environment variable
//! named next to it; the binary loads `config/.env` into the environment
//! before parsing. Settings are converted into the typed configuration of
//! each component; [`Settings::validate`] runs before anything connects.

use crate::dispatcher::{DispatcherConfig, DEFAULT_ANOMALY_LABEL, DEFAULT_NOTIFY_URL};
use crate::queue::DEFAULT_QUEUE_CAPACITY;
use crate::retry::RetryStrategy;
use crate::transport::{
    TransportConfig, DEFAULT_CLIENT_ID, DEFAULT_MQTT_HOST, DEFAULT_MQTT_PORT, DEFAULT_MQTT_TOPIC,
};
use clap::Parser;
use peed::config::{DEFAULT_WINDOW_SIZE, DEFAULT_Z_THRESHOLD};
use peed::{ConfigError, DetectionConfig, TlsPaths};
use std::path::PathBuf;
use std::time::Duration;

/// Delay before the first notification retry.
const RETRY_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Peed temperature anomaly analyzer
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Settings {
    /// MQTT broker host
    #[arg(long, env = "MQTT_HOST", default_value = DEFAULT_MQTT_HOST)]
    pub mqtt_host: String,

    /// MQTT broker port (TLS)
    #[arg(long, env = "MQTT_PORT", default_value_t = DEFAULT_MQTT_PORT)]
    pub mqtt_port: u16,

    /// Topic carrying sensor readings
    #[arg(long, env = "MQTT_TOPIC", default_value = DEFAULT_MQTT_TOPIC)]
    pub mqtt_topic: String,

    /// MQTT client identifier
    #[arg(long, env = "MQTT_CLIENT_ID", default_value = DEFAULT_CLIENT_ID)]
    pub mqtt_client_id: String,

    /// Base directory for relative certificate paths
    #[arg(long, env = "CONFIG_DIR", default_value = ".")]
    pub config_dir: PathBuf,

    /// CA certificate (PEM)
    #[arg(long, env = "CA_FILE", default_value = "config/ca.crt")]
    pub ca_file: PathBuf,

    /// Client certificate (PEM)
    #[arg(long, env = "CLIENT_CERT", default_value = "config/client.crt")]
    pub client_cert: PathBuf,

    /// Client private key (PEM)
    #[arg(long, env = "CLIENT_KEY", default_value = "config/client.key")]
    pub client_key: PathBuf,

    /// Readings kept per device
    #[arg(long, env = "WINDOW_SIZE", default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: usize,

    /// Absolute z-score at or above which a reading is anomalous
    #[arg(long, env = "Z_THRESHOLD", default_value_t = DEFAULT_Z_THRESHOLD)]
    pub z_threshold: f64,

    /// Notification endpoint
    #[arg(long, env = "SAP_API_URL", default_value = DEFAULT_NOTIFY_URL)]
    pub notify_url: String,

    /// Shared token sent in the X-API-TOKEN header
    #[arg(long, env = "SAP_API_TOKEN", default_value = "secret-token-demo", hide_env_values = true)]
    pub notify_token: String,

    /// Notification request timeout in seconds
    #[arg(long, env = "NOTIFY_TIMEOUT_SECS", default_value_t = 5)]
    pub notify_timeout_secs: u64,

    /// Retries for failed notifications (transport errors and 5xx only)
    #[arg(long, env = "NOTIFY_RETRIES", default_value_t = 0)]
    pub notify_retries: u32,

    /// Label sent as the anomaly description
    #[arg(long, env = "ANOMALY_LABEL", default_value = DEFAULT_ANOMALY_LABEL)]
    pub anomaly_label: String,

    /// Ingestion queue capacity
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Audit log file (appended)
    #[arg(long, env = "LOG_FILE", default_value = "log.txt")]
    pub log_file: PathBuf,

    /// Serve /metrics and /health on this port
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Settings {
    /// Check every value that can be checked without I/O.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detection().validate()?;
        if self.queue_capacity == 0 {
            return Err(invalid("QUEUE_CAPACITY", self.queue_capacity));
        }
        if self.notify_timeout_secs == 0 {
            return Err(invalid("NOTIFY_TIMEOUT_SECS", self.notify_timeout_secs));
        }
        if self.mqtt_topic.is_empty() {
            return Err(invalid("MQTT_TOPIC", "\"\""));
        }
        Ok(())
    }

    pub fn detection(&self) -> DetectionConfig {
        DetectionConfig {
            window_size: self.window_size,
            z_threshold: self.z_threshold,
            ..Default::default()
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            host: self.mqtt_host.clone(),
            port: self.mqtt_port,
            topic: self.mqtt_topic.clone(),
            client_id: self.mqtt_client_id.clone(),
            ..Default::default()
        }
    }

    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            url: self.notify_url.clone(),
            token: self.notify_token.clone(),
            timeout: Duration::from_secs(self.notify_timeout_secs),
            anomaly_label: self.anomaly_label.clone(),
            retry: RetryStrategy::exponential(self.notify_retries, RETRY_INITIAL_DELAY),
        }
    }

    /// Certificate paths, relative ones resolved against `config_dir`.
    pub fn tls_paths(&self) -> TlsPaths {
        TlsPaths::new(&self.ca_file, &self.client_cert, &self.client_key)
            .resolve_relative_to(&self.config_dir)
    }

    /// Startup echo of the effective configuration.
    pub fn summary(&self) -> Vec<String> {
        let tls = self.tls_paths();
        vec![
            format!(
                "[CONFIG] host={} port={} topic={}",
                self.mqtt_host, self.mqtt_port, self.mqtt_topic
            ),
            format!("[CONFIG] ca={}", tls.ca_file.display()),
            format!("[CONFIG] cert={}", tls.client_cert.display()),
            format!("[CONFIG] key={}", tls.client_key.display()),
            format!(
                "[CONFIG] window={} z_threshold={} queue={}",
                self.window_size, self.z_threshold, self.queue_capacity
            ),
            format!("[CONFIG] notify={} log={}", self.notify_url, self.log_file.display()),
        ]
    }
}

fn invalid(name: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    }
}
