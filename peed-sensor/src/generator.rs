// Peed Sensor - Temperature generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Gaussian temperature source with a periodic injected anomaly.
//!
//! Each reading is drawn from N(mean, std_dev); every `anomaly_every`-th
//! reading is shifted by `anomaly_delta`. Values are rounded to two
//! decimals, as a real probe would report them.

use crate::error::{Result, SensorError};
use chrono::{DateTime, Utc};
use peed::Reading;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Identity stamped on every reading.
    pub device_id: String,
    /// Nominal temperature.
    pub mean: f64,
    /// Spread around the nominal temperature.
    pub std_dev: f64,
    /// Inject an anomaly every N readings (0 disables injection).
    pub anomaly_every: u64,
    /// Offset added to injected readings.
    pub anomaly_delta: f64,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            device_id: "Machine_01".to_string(),
            mean: 67.0,
            std_dev: 2.5,
            anomaly_every: 20,
            anomaly_delta: 15.0,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Set device identity.
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set injection period.
    pub fn with_anomaly_every(mut self, n: u64) -> Self {
        self.anomaly_every = n;
        self
    }
}

/// One generated reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub reading: Reading,
    /// Whether the anomaly offset was applied.
    pub injected: bool,
}

/// Stateful temperature source.
#[derive(Debug)]
pub struct TemperatureGenerator {
    config: GeneratorConfig,
    distribution: Normal<f64>,
    rng: StdRng,
    counter: u64,
}

impl TemperatureGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        if !config.mean.is_finite() || !config.anomaly_delta.is_finite() {
            return Err(SensorError::InvalidConfig(
                "mean and anomaly delta must be finite".to_string(),
            ));
        }
        let distribution = Normal::new(config.mean, config.std_dev)
            .map_err(|e| SensorError::InvalidConfig(format!("std_dev {}: {}", config.std_dev, e)))?;
        let rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            distribution,
            rng,
            counter: 0,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Readings produced so far.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Next reading stamped with the current UTC time.
    pub fn next_emission(&mut self) -> Emission {
        self.next_emission_at(Utc::now())
    }

    /// Next reading stamped with `at`.
    pub fn next_emission_at(&mut self, at: DateTime<Utc>) -> Emission {
        self.counter += 1;
        let mut temperature = self.distribution.sample(&mut self.rng);
        let injected =
            self.config.anomaly_every > 0 && self.counter % self.config.anomaly_every == 0;
        if injected {
            temperature += self.config.anomaly_delta;
        }

        Emission {
            reading: Reading::new(
                self.config.device_id.clone(),
                at.to_rfc3339(),
                round2(temperature),
            ),
            injected,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
