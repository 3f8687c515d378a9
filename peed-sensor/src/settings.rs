// Peed Sensor - Command line and environment settings
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

use crate::generator::GeneratorConfig;
use crate::publisher::{client_id_for, PublisherConfig};
use clap::Parser;
use peed::TlsPaths;
use std::path::PathBuf;
use std::time::Duration;

/// Simulated temperature sensor
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Settings {
    /// MQTT broker host
    #[arg(long, env = "MQTT_HOST", default_value = "localhost")]
    pub mqtt_host: String,

    /// MQTT broker port (TLS)
    #[arg(long, env = "MQTT_PORT", default_value_t = 8883)]
    pub mqtt_port: u16,

    /// Topic to publish on
    #[arg(long, env = "MQTT_TOPIC", default_value = "usine/capteurs/machine1")]
    pub mqtt_topic: String,

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

    /// Device identity
    #[arg(long, env = "DEVICE_ID", default_value = "Machine_01")]
    pub device_id: String,

    /// Seconds between readings
    #[arg(long, env = "EMIT_PERIOD", default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub emit_period: u64,

    /// Inject an anomaly every N readings (0 disables)
    #[arg(long, env = "ANOMALY_EVERY", default_value_t = 20)]
    pub anomaly_every: u64,

    /// Random seed for a reproducible sequence
    #[arg(long, env = "SEED")]
    pub seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Settings {
    pub fn generator(&self) -> GeneratorConfig {
        GeneratorConfig {
            device_id: self.device_id.clone(),
            anomaly_every: self.anomaly_every,
            seed: self.seed,
            ..Default::default()
        }
    }

    pub fn publisher(&self) -> PublisherConfig {
        PublisherConfig {
            host: self.mqtt_host.clone(),
            port: self.mqtt_port,
            topic: self.mqtt_topic.clone(),
            client_id: client_id_for(&self.device_id),
            period: Duration::from_secs(self.emit_period),
            ..Default::default()
        }
    }

    pub fn tls_paths(&self) -> TlsPaths {
        TlsPaths::new(&self.ca_file, &self.client_cert, &self.client_key)
            .resolve_relative_to(&self.config_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_parse_from(["peed-sensor"]).unwrap();
        let publisher = settings.publisher();
        assert_eq!(publisher.client_id, "capteur-Machine_01");
        assert_eq!(publisher.period, Duration::from_secs(5));
        assert_eq!(settings.generator().anomaly_every, 20);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(Settings::try_parse_from(["peed-sensor", "--emit-period", "0"]).is_err());
    }

    #[test]
    fn test_env_file_value_reaches_settings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("config")).unwrap();
        std::fs::write(dir.path().join(peed::ENV_FILE), "SEED=99\n").unwrap();

        assert!(peed::load_env_file(dir.path()).unwrap().is_some());
        let settings = Settings::try_parse_from(["peed-sensor"]).unwrap();
        assert_eq!(settings.generator().seed, Some(99));
    }

    #[test]
    fn test_device_and_seed() {
        let settings =
            Settings::try_parse_from(["peed-sensor", "--device-id", "Press_3", "--seed", "7"])
                .unwrap();
        assert_eq!(settings.publisher().client_id, "capteur-Press_3");
        assert_eq!(settings.generator().seed, Some(7));
    }
}
