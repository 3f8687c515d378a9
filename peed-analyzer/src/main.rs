// Peed Analyzer - Anomaly detection consumer
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! ## Usage
//!
//! ```bash
//! # Defaults: mqtts://localhost:8883, certificates in ./config
//! peed-analyzer
//!
//! # Custom broker, metrics on :9100
//! MQTT_HOST=broker.local METRICS_PORT=9100 peed-analyzer --z-threshold 2.5
//! ```

use clap::Parser;
use peed_analyzer::{app, Settings};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let env_file = peed::load_env_file(peed::config::config_dir_from_env());
    let settings = Settings::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match settings.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Peed Analyzer v{}", env!("CARGO_PKG_VERSION"));
    match env_file {
        Ok(Some(path)) => info!("[CONFIG] env={}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("{}", e),
    }

    match app::run(settings).await {
        Ok(stats) => info!(
            "Stopped: {} readings, {} anomalies, {} notified, {} failed",
            stats.processed, stats.anomalous, stats.notified, stats.failed
        ),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
