// Peed - Rolling-baseline anomaly detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Baseline statistics derived from a window.

use serde::{Deserialize, Serialize};

/// Mean and population standard deviation of a window.
///
/// Never stored: computed fresh from the window on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub mean: f64,
    /// Population standard deviation, epsilon-substituted when zero.
    pub stdev: f64,
    /// Number of samples the baseline was computed from.
    pub samples: usize,
}

impl Baseline {
    /// Compute a baseline, or `None` with fewer than `min_samples` values.
    ///
    /// A standard deviation of exactly zero is replaced by `epsilon`.
    pub fn from_values(values: &[f64], min_samples: usize, epsilon: f64) -> Option<Self> {
        Self::from_samples(values.iter().copied(), min_samples, epsilon)
    }

    /// Same as [`from_values`](Self::from_values) over a re-iterable source,
    /// such as the two halves of a ring buffer.
    pub fn from_samples<I>(samples: I, min_samples: usize, epsilon: f64) -> Option<Self>
    where
        I: Iterator<Item = f64> + Clone,
    {
        let count = samples.clone().count();
        if count == 0 || count < min_samples {
            return None;
        }

        // Constant windows are exact: summation rounding must not leak a
        // spurious non-zero deviation.
        let first = samples.clone().next()?;
        let (mean, stdev) = if samples.clone().all(|v| v == first) {
            (first, 0.0)
        } else {
            let n = count as f64;
            let mean = samples.clone().sum::<f64>() / n;
            let variance = samples.map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            (mean, variance.sqrt())
        };

        Some(Self {
            mean,
            stdev: if stdev == 0.0 { epsilon } else { stdev },
            samples: count,
        })
    }

    /// Signed number of standard deviations `value` lies from the mean.
    pub fn z_score(&self, value: f64) -> f64 {
        (value - self.mean) / self.stdev
    }

    /// Upper bound `mean + k * stdev`.
    pub fn upper_bound(&self, k: f64) -> f64 {
        self.mean + k * self.stdev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_not_enough_samples() {
        assert!(Baseline::from_values(&[], 5, 1e-9).is_none());
        assert!(Baseline::from_values(&[1.0, 2.0, 3.0, 4.0], 5, 1e-9).is_none());
        assert!(Baseline::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0], 5, 1e-9).is_some());
    }

    #[test]
    fn test_population_stdev() {
        let b = Baseline::from_values(&[65.0, 66.0, 67.0, 68.0, 69.0], 5, 1e-9).unwrap();
        assert_relative_eq!(b.mean, 67.0);
        // sqrt(10 / 5), not sqrt(10 / 4)
        assert_relative_eq!(b.stdev, 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(b.samples, 5);
    }

    #[test]
    fn test_zero_stdev_uses_epsilon() {
        let b = Baseline::from_values(&[42.0; 8], 5, 1e-9).unwrap();
        assert_eq!(b.stdev, 1e-9);
        assert_eq!(b.z_score(42.0), 0.0);
    }

    #[test]
    fn test_constant_window_is_exact() {
        let b = Baseline::from_values(&[0.1; 7], 5, 1e-9).unwrap();
        assert_eq!(b.mean, 0.1);
        assert_eq!(b.stdev, 1e-9);
        assert_eq!(b.z_score(0.1), 0.0);
    }

    #[test]
    fn test_samples_match_values() {
        let values = [64.2, 70.1, 66.3, 67.9, 65.5, 68.0];
        let from_slice = Baseline::from_values(&values, 5, 1e-9).unwrap();
        let from_iter = Baseline::from_samples(values.iter().copied(), 5, 1e-9).unwrap();
        assert_eq!(from_slice, from_iter);
    }

    #[test]
    fn test_z_score_sign() {
        let b = Baseline::from_values(&[65.0, 66.0, 67.0, 68.0, 69.0], 5, 1e-9).unwrap();
        assert!(b.z_score(70.0) > 0.0);
        assert!(b.z_score(60.0) < 0.0);
        assert_relative_eq!(b.upper_bound(3.0), 67.0 + 3.0 * 2.0_f64.sqrt(), epsilon = 1e-12);
    }
}
