// Peed Sensor - Simulated temperature sensor
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the sensor simulator

use thiserror::Error;

/// Sensor simulator errors
#[derive(Error, Debug)]
pub enum SensorError {
    /// Generator parameters are unusable
    #[error("Invalid generator configuration: {0}")]
    InvalidConfig(String),

    /// Certificate material could not be loaded
    #[error("TLS setup failed: {0}")]
    Tls(#[from] peed::TlsError),

    /// Broker session failed
    #[error("Connection failed: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// Publish could not be queued
    #[error("Publish failed: {0}")]
    Client(#[from] rumqttc::ClientError),
}

/// Result type alias for sensor operations
pub type Result<T> = std::result::Result<T, SensorError>;
