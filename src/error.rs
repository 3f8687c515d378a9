// Peed - Rolling-baseline anomaly detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the detection core
//!
//! Classification itself is total and has no error type: once a payload is
//! decoded into a [`Reading`](crate::Reading), every later step succeeds.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while turning a transport payload into a reading
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Payload bytes are not valid UTF-8
    #[error("Payload is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Payload is not a JSON object of the expected shape
    #[error("Malformed JSON payload: {0}")]
    MalformedJson(String),

    /// Temperature field missing
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Temperature is NaN or infinite
    #[error("Temperature is not a finite number: {0}")]
    NonFiniteTemperature(f64),

    /// Temperature magnitude beyond any physical probe
    #[error("Temperature out of range: {0}")]
    TemperatureOutOfRange(f64),
}

/// Invalid detection or runtime configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Window cannot hold enough samples to ever produce a baseline
    #[error("Window size {window_size} is smaller than the minimum sample count {min_samples}")]
    WindowTooSmall {
        window_size: usize,
        min_samples: usize,
    },

    /// A numeric option is out of range
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    /// Environment file exists but could not be loaded
    #[error("Cannot load environment file {path}: {reason}")]
    EnvFile { path: PathBuf, reason: String },
}

/// Errors while loading certificate material
#[derive(Error, Debug)]
pub enum TlsError {
    /// File could not be read
    #[error("Cannot read {kind} at {path}: {source}")]
    Read {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exists but holds no data
    #[error("{kind} at {path} is empty")]
    Empty { kind: &'static str, path: PathBuf },
}
