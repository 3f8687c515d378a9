//! # Peed - Rolling-baseline anomaly detection
//!
//! Deterministic core of an industrial-IoT temperature anomaly pipeline.
//!
//! ## Key Features
//!
//! - **Per-device windows**: Fixed-capacity FIFO of recent temperatures
//! - **Fresh baselines**: Mean and population standard deviation recomputed
//!   on every evaluation, with a warm-up phase
//! - **Z-score classification**: Warming, Normal or Anomalous
//! - **No runtime**: Pure data structures, driven by the analyzer crate
//!
//! ## Quick Start
//!
//! ```rust
//! use peed::{Classifier, DetectionConfig, Reading, WindowStore};
//!
//! let config = DetectionConfig::default();
//! let mut windows = WindowStore::new(&config);
//! let classifier = Classifier::from_config(&config);
//!
//! // Fill a 30-reading window with ordinary values
//! for i in 0..29 {
//!     let reading = Reading::new("Machine_01", "2025-03-01T10:00:00Z", 65.0 + (i % 5) as f64);
//!     windows.observe(&reading.device_id, reading.temperature);
//! }
//!
//! // The spike joins the window before the baseline is derived
//! let spike = Reading::new("Machine_01", "2025-03-01T10:02:30Z", 90.0);
//! windows.observe(&spike.device_id, spike.temperature);
//! let baseline = windows.baseline(&spike.device_id);
//! let result = classifier.classify(&spike, baseline.as_ref());
//! assert!(result.is_anomalous());
//! ```
//!
//! ## Modules
//!
//! - [`reading`]: Reading type and payload decoding
//! - [`window`]: Windowed statistics engine
//! - [`baseline`]: Mean / standard deviation derivation
//! - [`classifier`]: Anomaly classification
//! - [`config`]: Detection settings
//! - [`tls`]: Certificate material loading

pub mod baseline;
pub mod classifier;
pub mod config;
pub mod error;
pub mod reading;
pub mod tls;
pub mod window;

// Re-exports for convenient access
pub use baseline::Baseline;
pub use classifier::{Classification, Classifier, UPPER_BOUND_SIGMAS};
pub use config::{load_env_file, DetectionConfig, ENV_FILE};
pub use error::{ConfigError, DecodeError, TlsError};
pub use reading::Reading;
pub use tls::{TlsMaterial, TlsPaths};
pub use window::{Window, WindowStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Unit reported alongside temperatures
pub const TEMPERATURE_UNIT: &str = "°C";
