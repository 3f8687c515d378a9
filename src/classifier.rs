// Peed - Rolling-baseline anomaly detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Anomaly classification module
//!
//! Decides whether a reading is normal or anomalous against the baseline of
//! its device. The classifier is a pure function of `(reading, baseline)`;
//! window mutation happens before it is called.

use crate::baseline::Baseline;
use crate::config::DetectionConfig;
use crate::reading::Reading;
use serde::{Deserialize, Serialize};

/// Multiplier of the one-sided upper-bound rule.
///
/// Independent from the z-score threshold: both rules are evaluated, so
/// lowering or raising the threshold leaves this bound in place.
pub const UPPER_BOUND_SIGMAS: f64 = 3.0;

/// Outcome of evaluating one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classification {
    /// Not enough samples for a baseline yet.
    Warming { device_id: String, temperature: f64 },
    /// Within the baseline.
    Normal {
        device_id: String,
        temperature: f64,
        z: f64,
        mean: f64,
        stdev: f64,
    },
    /// Deviates from the baseline.
    Anomalous {
        device_id: String,
        temperature: f64,
        z: f64,
        mean: f64,
        stdev: f64,
    },
}

impl Classification {
    pub fn device_id(&self) -> &str {
        match self {
            Self::Warming { device_id, .. }
            | Self::Normal { device_id, .. }
            | Self::Anomalous { device_id, .. } => device_id,
        }
    }

    pub fn temperature(&self) -> f64 {
        match self {
            Self::Warming { temperature, .. }
            | Self::Normal { temperature, .. }
            | Self::Anomalous { temperature, .. } => *temperature,
        }
    }

    /// Z-score, absent while warming up.
    pub fn z_score(&self) -> Option<f64> {
        match self {
            Self::Warming { .. } => None,
            Self::Normal { z, .. } | Self::Anomalous { z, .. } => Some(*z),
        }
    }

    pub fn is_anomalous(&self) -> bool {
        matches!(self, Self::Anomalous { .. })
    }

    pub fn is_warming(&self) -> bool {
        matches!(self, Self::Warming { .. })
    }

    /// Short lowercase name, used as a metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Warming { .. } => "warming",
            Self::Normal { .. } => "normal",
            Self::Anomalous { .. } => "anomalous",
        }
    }
}

/// Threshold classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    z_threshold: f64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_Z_THRESHOLD)
    }
}

impl Classifier {
    pub fn new(z_threshold: f64) -> Self {
        Self { z_threshold }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.z_threshold)
    }

    pub fn z_threshold(&self) -> f64 {
        self.z_threshold
    }

    /// Classify a reading against an optional baseline.
    ///
    /// Anomalous when `|z| >= z_threshold` or when the temperature reaches
    /// `mean + 3 * stdev`.
    pub fn classify(&self, reading: &Reading, baseline: Option<&Baseline>) -> Classification {
        let device_id = reading.device_id.clone();
        let temperature = reading.temperature;

        let Some(baseline) = baseline else {
            return Classification::Warming {
                device_id,
                temperature,
            };
        };

        let z = baseline.z_score(temperature);
        let mean = baseline.mean;
        let stdev = baseline.stdev;

        if z.abs() >= self.z_threshold || temperature >= baseline.upper_bound(UPPER_BOUND_SIGMAS) {
            Classification::Anomalous {
                device_id,
                temperature,
                z,
                mean,
                stdev,
            }
        } else {
            Classification::Normal {
                device_id,
                temperature,
                z,
                mean,
                stdev,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline(values: &[f64]) -> Baseline {
        Baseline::from_values(values, 5, 1e-9).unwrap()
    }

    fn reading(temperature: f64) -> Reading {
        Reading::new("Machine_01", "2025-03-01T10:00:00Z", temperature)
    }

    #[test]
    fn test_no_baseline_is_warming() {
        let result = Classifier::default().classify(&reading(1000.0), None);
        assert!(result.is_warming());
        assert_eq!(result.z_score(), None);
        assert_eq!(result.label(), "warming");
    }

    #[test]
    fn test_normal_reading() {
        let b = baseline(&[65.0, 66.0, 67.0, 68.0, 69.0]);
        let result = Classifier::default().classify(&reading(68.0), Some(&b));
        assert!(matches!(result, Classification::Normal { .. }));
        assert_eq!(result.device_id(), "Machine_01");
    }

    #[test]
    fn test_spike_is_anomalous() {
        let b = baseline(&[65.0, 66.0, 67.0, 68.0, 69.0]);
        let result = Classifier::default().classify(&reading(90.0), Some(&b));
        assert!(result.is_anomalous());
        let z = result.z_score().unwrap();
        assert!((z - 23.0 / 2.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_drop_is_anomalous() {
        let b = baseline(&[65.0, 66.0, 67.0, 68.0, 69.0]);
        let result = Classifier::default().classify(&reading(50.0), Some(&b));
        assert!(result.is_anomalous());
        assert!(result.z_score().unwrap() < 0.0);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        // mean 67, stdev 2 -> z = 1.5 exactly at 70
        let b = Baseline {
            mean: 67.0,
            stdev: 2.0,
            samples: 5,
        };
        let result = Classifier::new(1.5).classify(&reading(70.0), Some(&b));
        assert!(result.is_anomalous());
        let result = Classifier::new(1.6).classify(&reading(70.0), Some(&b));
        assert!(!result.is_anomalous());
    }

    #[test]
    fn test_upper_bound_rule_survives_high_threshold() {
        let b = Baseline {
            mean: 67.0,
            stdev: 2.0,
            samples: 5,
        };
        // z = 3.5: below a threshold of 5, but above mean + 3 sigma
        let result = Classifier::new(5.0).classify(&reading(74.0), Some(&b));
        assert!(result.is_anomalous());

        // The upper-bound rule is one-sided: z = -3.5 stays normal
        let result = Classifier::new(5.0).classify(&reading(60.0), Some(&b));
        assert!(matches!(result, Classification::Normal { .. }));
    }

    #[test]
    fn test_constant_window_same_value_is_normal() {
        let b = baseline(&[70.0; 6]);
        let result = Classifier::default().classify(&reading(70.0), Some(&b));
        assert!(matches!(result, Classification::Normal { z, .. } if z == 0.0));
    }
}
