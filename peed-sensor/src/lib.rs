// Peed Sensor - Simulated temperature sensor
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Peed Sensor
//!
//! Simulated machine probe: draws temperatures around a nominal value,
//! injects a spike at a fixed cadence, and publishes each reading as JSON
//! over MQTT with mutual TLS.
//!
//! ```rust
//! use peed_sensor::{GeneratorConfig, TemperatureGenerator};
//!
//! let mut generator = TemperatureGenerator::new(GeneratorConfig::default().with_seed(42)).unwrap();
//! let emission = generator.next_emission();
//! assert_eq!(emission.reading.device_id, "Machine_01");
//! ```

pub mod error;
pub mod generator;
pub mod publisher;
pub mod settings;

pub use error::{Result, SensorError};
pub use generator::{Emission, GeneratorConfig, TemperatureGenerator};
pub use publisher::{PublisherConfig, SensorPublisher};
pub use settings::Settings;
