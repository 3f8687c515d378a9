// Peed Analyzer - Anomaly detection consumer
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the analyzer
//!
//! Only startup and transport failures surface as errors. Dispatch failures
//! are outcomes ([`NotificationRecord`](crate::NotificationRecord)), not
//! errors, and never leave the worker.

use thiserror::Error;

/// Main error type for analyzer operations
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] peed::ConfigError),

    /// Certificate material could not be loaded
    #[error("TLS setup failed: {0}")]
    Tls(#[from] peed::TlsError),

    /// Transport session failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Audit log or listener I/O
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Analysis worker task panicked or was aborted
    #[error("Analysis worker stopped abnormally: {0}")]
    Worker(String),
}

/// Transport session errors, all fatal (no reconnect)
#[derive(Error, Debug)]
pub enum TransportError {
    /// Broker answered CONNACK with a failure code
    #[error("Connection refused by broker: code={code}")]
    Refused { code: String },

    /// Network, TLS or protocol failure
    #[error("Connection failed: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// Request could not be queued to the event loop
    #[error("Client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),
}

/// Result type alias for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;
