// Peed - Detection property tests
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Behavioural properties of the window / baseline / classifier chain.

use approx::assert_relative_eq;
use peed::*;

// ============================================================================
// Helper Functions
// ============================================================================

/// Feed temperatures for one device and return every classification,
/// following the worker order: observe, baseline, classify.
fn run(config: &DetectionConfig, temperatures: &[f64]) -> Vec<Classification> {
    let mut windows = WindowStore::new(config);
    let classifier = Classifier::from_config(config);
    temperatures
        .iter()
        .map(|&t| {
            let reading = Reading::new("Machine_01", "2025-03-01T10:00:00Z", t);
            windows.observe(&reading.device_id, reading.temperature);
            let baseline = windows.baseline(&reading.device_id);
            classifier.classify(&reading, baseline.as_ref())
        })
        .collect()
}

// ============================================================================
// Warm-up
// ============================================================================

#[test]
fn test_fewer_than_five_readings_always_warming() {
    let config = DetectionConfig::default();
    for values in [
        vec![1.0],
        vec![-40.0, 500.0],
        vec![67.0, 67.0, 1e6],
        vec![0.0, 0.0, 0.0, 1000.0],
    ] {
        let results = run(&config, &values);
        assert!(results.iter().all(|r| r.is_warming()));
    }
}

#[test]
fn test_fifth_reading_is_classified() {
    let results = run(&DetectionConfig::default(), &[65.0, 66.0, 67.0, 68.0, 69.0]);
    assert!(results[3].is_warming());
    assert!(!results[4].is_warming());
}

// ============================================================================
// Constant windows
// ============================================================================

#[test]
fn test_identical_values_give_zero_z() {
    let results = run(&DetectionConfig::default(), &[71.25; 12]);
    for r in &results[4..] {
        match r {
            Classification::Normal { z, stdev, mean, .. } => {
                assert_eq!(*z, 0.0);
                assert_eq!(*stdev, 1e-9);
                assert_eq!(*mean, 71.25);
            }
            other => panic!("expected Normal, got {:?}", other),
        }
    }
}

#[test]
fn test_tiny_deviation_from_constant_window_is_anomalous() {
    let mut values = vec![50.0; 10];
    values.push(50.001);
    let results = run(&DetectionConfig::default(), &values);
    // The new value is part of the window, so stdev is small but non-zero.
    assert!(results.last().unwrap().is_anomalous());
}

// ============================================================================
// Eviction
// ============================================================================

#[test]
fn test_window_eviction_keeps_capacity() {
    let config = DetectionConfig::with_window_size(10);
    let mut windows = WindowStore::new(&config);
    for i in 0..=10 {
        windows.observe("m", i as f64);
    }
    let window = windows.window("m").unwrap();
    assert_eq!(window.len(), 10);
    assert!(!window.values().any(|v| v == 0.0));
    assert_eq!(window.values().next(), Some(1.0));
}

#[test]
fn test_baseline_follows_window_not_history() {
    let config = DetectionConfig::with_window_size(5);
    let mut windows = WindowStore::new(&config);
    for t in [1000.0, 1000.0, 1000.0, 1000.0, 1000.0] {
        windows.observe("m", t);
    }
    for t in [10.0, 11.0, 12.0, 13.0, 14.0] {
        windows.observe("m", t);
    }
    let baseline = windows.baseline("m").unwrap();
    assert_relative_eq!(baseline.mean, 12.0);
    assert_relative_eq!(baseline.stdev, 2.0_f64.sqrt(), epsilon = 1e-12);
}

// ============================================================================
// Threshold monotonicity
// ============================================================================

#[test]
fn test_raising_threshold_never_creates_anomalies() {
    let temperatures: Vec<f64> = (0..200)
        .map(|i| 67.0 + ((i * 37) % 11) as f64 * 0.4 + if i % 20 == 19 { 15.0 } else { 0.0 })
        .collect();

    let thresholds = [1.0, 1.5, 2.0, 2.5, 3.0, 4.0, 6.0];
    let runs: Vec<Vec<bool>> = thresholds
        .iter()
        .map(|&z| {
            run(&DetectionConfig::with_z_threshold(z), &temperatures)
                .iter()
                .map(|r| r.is_anomalous())
                .collect()
        })
        .collect();

    for pair in runs.windows(2) {
        for (lower, higher) in pair[0].iter().zip(pair[1].iter()) {
            assert!(*lower || !*higher, "higher threshold produced a new anomaly");
        }
    }
}

// ============================================================================
// Reference scenario
// ============================================================================

#[test]
fn test_spike_joins_window_before_baseline() {
    let results = run(
        &DetectionConfig::default(),
        &[65.0, 66.0, 67.0, 68.0, 69.0, 90.0],
    );

    // The spike is part of the six-value window it is scored against, which
    // caps |z| at sqrt(5): too short a history to flag it.
    let window = [65.0, 66.0, 67.0, 68.0, 69.0, 90.0];
    let expected = Baseline::from_values(&window, 5, 1e-9).unwrap();

    match &results[5] {
        Classification::Normal {
            temperature,
            z,
            mean,
            stdev,
            ..
        } => {
            assert_eq!(*temperature, 90.0);
            assert_relative_eq!(*mean, expected.mean);
            assert_relative_eq!(*stdev, expected.stdev);
            assert_relative_eq!(*z, expected.z_score(90.0));
            assert!(*z < 5.0_f64.sqrt());
        }
        other => panic!("expected Normal, got {:?}", other),
    }
}

#[test]
fn test_spike_after_full_window_is_anomalous() {
    let mut temperatures: Vec<f64> = (0..29).map(|i| 65.0 + (i % 5) as f64).collect();
    temperatures.push(90.0);
    let results = run(&DetectionConfig::default(), &temperatures);

    match results.last().unwrap() {
        Classification::Anomalous {
            device_id,
            temperature,
            z,
            ..
        } => {
            assert_eq!(device_id, "Machine_01");
            assert_eq!(*temperature, 90.0);
            assert!(*z >= 3.0);
        }
        other => panic!("expected Anomalous, got {:?}", other),
    }
}

#[test]
fn test_pre_append_baseline_z_score() {
    // Against the five-value baseline alone, 90.0 lies ~16.3 sigmas out.
    let baseline = Baseline::from_values(&[65.0, 66.0, 67.0, 68.0, 69.0], 5, 1e-9).unwrap();
    assert_relative_eq!(baseline.mean, 67.0);
    assert_relative_eq!(baseline.stdev, 1.41421356, epsilon = 1e-6);
    assert_relative_eq!(baseline.z_score(90.0), 16.2634559, epsilon = 1e-6);

    let reading = Reading::new("Machine_01", "", 90.0);
    assert!(Classifier::default()
        .classify(&reading, Some(&baseline))
        .is_anomalous());
}

#[test]
fn test_decode_then_classify() {
    let payload = br#"{"device_id":"Machine_07","timestamp":"2025-03-01T10:00:00Z","temperature":"66.1"}"#;
    let reading = Reading::from_payload(payload).unwrap();
    let result = Classifier::default().classify(&reading, None);
    assert_eq!(result.device_id(), "Machine_07");
    assert_eq!(result.temperature(), 66.1);
}
