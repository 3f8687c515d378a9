// Peed Sensor - Simulated temperature sensor
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

use clap::Parser;
use peed::TlsMaterial;
use peed_sensor::{SensorPublisher, Settings, TemperatureGenerator};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let env_file = peed::load_env_file(peed::config::config_dir_from_env());
    let settings = Settings::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = settings.log_level.parse::<Level>().unwrap_or(Level::INFO);
        EnvFilter::from_default_env().add_directive(level.into())
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match env_file {
        Ok(Some(path)) => info!("[CONFIG] env={}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("{}", e),
    }
    info!(
        "[CONFIG] host={} port={} topic={}",
        settings.mqtt_host, settings.mqtt_port, settings.mqtt_topic
    );

    if let Err(e) = run(settings).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(settings: Settings) -> peed_sensor::Result<()> {
    let tls = TlsMaterial::load(&settings.tls_paths())?;
    let generator = TemperatureGenerator::new(settings.generator())?;
    let publisher = SensorPublisher::new(settings.publisher(), tls);

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let published = publisher.run(generator, shutdown).await?;
    info!("[SENSOR] Stopped after {} readings", published);
    Ok(())
}
