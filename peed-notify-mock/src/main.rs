// Peed Notify Mock - Notification API stand-in
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

use clap::Parser;
use peed_notify_mock::{spawn, MockState, DEFAULT_TOKEN, NOTIFICATIONS_PATH};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Mock notification API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, env = "MOCK_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "MOCK_PORT", default_value = "5000")]
    port: u16,

    /// Accepted X-API-TOKEN value
    #[arg(long, env = "SAP_API_TOKEN", default_value = DEFAULT_TOKEN, hide_env_values = true)]
    token: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = args.log_level.parse::<Level>().unwrap_or(Level::INFO);
        EnvFilter::from_default_env().add_directive(level.into())
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = Arc::new(MockState::new(args.token));
    let addr = SocketAddr::new(args.host, args.port);
    let (local, handle) = match spawn(addr, state).await {
        Ok(server) => server,
        Err(e) => {
            error!("Cannot bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Notification mock on http://{}{}", local, NOTIFICATIONS_PATH);

    tokio::select! {
        _ = handle => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }
}
