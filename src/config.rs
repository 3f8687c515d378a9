// Peed - Rolling-baseline anomaly detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Detection configuration and environment file loading.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of readings kept per device.
pub const DEFAULT_WINDOW_SIZE: usize = 30;

/// Samples required before a baseline exists.
pub const DEFAULT_MIN_SAMPLES: usize = 5;

/// Default z-score threshold.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Substitute for a zero standard deviation.
pub const DEFAULT_STDEV_EPSILON: f64 = 1e-9;

/// Environment file, relative to the configuration directory.
pub const ENV_FILE: &str = "config/.env";

/// Configuration directory named by `CONFIG_DIR`, or the working directory.
pub fn config_dir_from_env() -> PathBuf {
    std::env::var_os("CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load `<config_dir>/config/.env` into the process environment.
///
/// Variables already set in the environment win over the file. A missing
/// file is not an error; returns the loaded path when one was read.
pub fn load_env_file(config_dir: impl AsRef<Path>) -> Result<Option<PathBuf>, ConfigError> {
    let path = config_dir.as_ref().join(ENV_FILE);
    match dotenvy::from_path(&path) {
        Ok(()) => Ok(Some(path)),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::EnvFile {
            path,
            reason: e.to_string(),
        }),
    }
}

/// Windowed statistics and classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Readings kept per device (FIFO eviction beyond this).
    pub window_size: usize,

    /// Below this many samples a device is warming up.
    pub min_samples: usize,

    /// Absolute z-score at or above which a reading is anomalous.
    pub z_threshold: f64,

    /// Replaces a standard deviation of exactly zero.
    pub stdev_epsilon: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_samples: DEFAULT_MIN_SAMPLES,
            z_threshold: DEFAULT_Z_THRESHOLD,
            stdev_epsilon: DEFAULT_STDEV_EPSILON,
        }
    }
}

impl DetectionConfig {
    /// Default configuration with a custom window size.
    pub fn with_window_size(window_size: usize) -> Self {
        Self {
            window_size,
            ..Default::default()
        }
    }

    /// Default configuration with a custom z-score threshold.
    pub fn with_z_threshold(z_threshold: f64) -> Self {
        Self {
            z_threshold,
            ..Default::default()
        }
    }

    /// Check that the configuration can ever produce a baseline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_samples == 0 {
            return Err(ConfigError::InvalidValue {
                name: "min_samples",
                value: self.min_samples.to_string(),
            });
        }
        if self.window_size < self.min_samples {
            return Err(ConfigError::WindowTooSmall {
                window_size: self.window_size,
                min_samples: self.min_samples,
            });
        }
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "z_threshold",
                value: self.z_threshold.to_string(),
            });
        }
        if !self.stdev_epsilon.is_finite() || self.stdev_epsilon <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "stdev_epsilon",
                value: self.stdev_epsilon.to_string(),
            });
        }
        Ok(())
    }
}
