// Peed - Rolling-baseline anomaly detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Certificate material for mutually authenticated transport sessions
//!
//! Loads the CA certificate and the client certificate/key pair as PEM
//! bytes. Handing them to a TLS stack is left to the transport crates.

use crate::error::TlsError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations of the PEM files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsPaths {
    /// CA certificate used to verify the broker
    pub ca_file: PathBuf,
    /// Client certificate presented to the broker
    pub client_cert: PathBuf,
    /// Private key of the client certificate
    pub client_key: PathBuf,
}

impl Default for TlsPaths {
    fn default() -> Self {
        Self {
            ca_file: PathBuf::from("config/ca.crt"),
            client_cert: PathBuf::from("config/client.crt"),
            client_key: PathBuf::from("config/client.key"),
        }
    }
}

impl TlsPaths {
    /// Create paths from explicit locations
    pub fn new(
        ca_file: impl Into<PathBuf>,
        client_cert: impl Into<PathBuf>,
        client_key: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ca_file: ca_file.into(),
            client_cert: client_cert.into(),
            client_key: client_key.into(),
        }
    }

    /// Resolve relative paths against `base`; absolute paths are kept
    pub fn resolve_relative_to(self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };
        Self {
            ca_file: resolve(self.ca_file),
            client_cert: resolve(self.client_cert),
            client_key: resolve(self.client_key),
        }
    }
}

/// Loaded PEM material
#[derive(Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    pub ca: Vec<u8>,
    pub client_cert: Vec<u8>,
    pub client_key: Vec<u8>,
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("TlsMaterial")
            .field("ca", &format_args!("{} bytes", self.ca.len()))
            .field("client_cert", &format_args!("{} bytes", self.client_cert.len()))
            .field("client_key", &"<redacted>")
            .finish()
    }
}

impl TlsMaterial {
    /// Read all three files, failing on the first missing or empty one
    pub fn load(paths: &TlsPaths) -> Result<Self, TlsError> {
        Ok(Self {
            ca: read_pem("CA certificate", &paths.ca_file)?,
            client_cert: read_pem("client certificate", &paths.client_cert)?,
            client_key: read_pem("client key", &paths.client_key)?,
        })
    }
}

fn read_pem(kind: &'static str, path: &Path) -> Result<Vec<u8>, TlsError> {
    let bytes = std::fs::read(path).map_err(|source| TlsError::Read {
        kind,
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(TlsError::Empty {
            kind,
            path: path.to_path_buf(),
        });
    }
    Ok(bytes)
}
