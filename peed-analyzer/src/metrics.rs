// Peed Analyzer - Prometheus metrics definitions
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Prometheus metrics for the analysis pipeline.
//!
//! This module defines all Prometheus metrics exposed by the analyzer
//! and provides functions to update them from pipeline outcomes.

use lazy_static::lazy_static;
use peed::Classification;
use prometheus::{
    register_counter, register_counter_vec, register_gauge_vec, Counter, CounterVec, Encoder,
    GaugeVec, TextEncoder,
};

lazy_static! {
    // ============================================================
    // Classification Metrics
    // ============================================================

    /// Readings processed by the worker (labeled by classification).
    pub static ref READINGS_TOTAL: CounterVec = register_counter_vec!(
        "peed_readings_total",
        "Readings processed by the analysis worker",
        &["classification"]
    ).unwrap();

    /// Last z-score per device.
    pub static ref LAST_ZSCORE: GaugeVec = register_gauge_vec!(
        "peed_last_zscore",
        "Z-score of the most recent reading per device",
        &["device"]
    ).unwrap();

    /// Last temperature per device.
    pub static ref LAST_TEMPERATURE: GaugeVec = register_gauge_vec!(
        "peed_last_temperature_celsius",
        "Most recent temperature per device",
        &["device"]
    ).unwrap();

    // ============================================================
    // Dispatch Metrics
    // ============================================================

    /// Notification attempts (labeled by outcome).
    pub static ref NOTIFICATIONS_TOTAL: CounterVec = register_counter_vec!(
        "peed_notifications_total",
        "Notification dispatch outcomes",
        &["outcome"]
    ).unwrap();

    // ============================================================
    // Ingestion Metrics
    // ============================================================

    /// Payloads dropped because they could not be decoded.
    pub static ref DECODE_ERRORS_TOTAL: Counter = register_counter!(
        "peed_decode_errors_total",
        "Transport payloads dropped as malformed"
    ).unwrap();

    /// Readings dropped because the ingestion queue was full.
    pub static ref QUEUE_DROPPED_TOTAL: Counter = register_counter!(
        "peed_queue_dropped_total",
        "Readings dropped on ingestion queue overflow"
    ).unwrap();
}

/// Record one classification outcome.
pub fn record_classification(classification: &Classification) {
    READINGS_TOTAL
        .with_label_values(&[classification.label()])
        .inc();
    LAST_TEMPERATURE
        .with_label_values(&[classification.device_id()])
        .set(classification.temperature());
    if let Some(z) = classification.z_score() {
        LAST_ZSCORE
            .with_label_values(&[classification.device_id()])
            .set(z);
    }
}

/// Record one dispatch outcome ("success" or "failure").
pub fn record_notification(outcome: &str) {
    NOTIFICATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Increment the decode error counter.
pub fn record_decode_error() {
    DECODE_ERRORS_TOTAL.inc();
}

/// Increment the queue overflow counter.
pub fn record_queue_drop() {
    QUEUE_DROPPED_TOTAL.inc();
}

/// Encode all metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_classification() {
        let before = READINGS_TOTAL.with_label_values(&["anomalous"]).get();
        record_classification(&Classification::Anomalous {
            device_id: "metrics_test_device".to_string(),
            temperature: 90.0,
            z: 16.3,
            mean: 67.0,
            stdev: 1.41,
        });
        assert_eq!(
            READINGS_TOTAL.with_label_values(&["anomalous"]).get(),
            before + 1.0
        );
        assert_eq!(
            LAST_ZSCORE
                .with_label_values(&["metrics_test_device"])
                .get(),
            16.3
        );
    }

    #[test]
    fn test_warming_leaves_zscore_untouched() {
        record_classification(&Classification::Warming {
            device_id: "metrics_warming_device".to_string(),
            temperature: 66.0,
        });
        assert_eq!(
            LAST_TEMPERATURE
                .with_label_values(&["metrics_warming_device"])
                .get(),
            66.0
        );
        assert_eq!(
            LAST_ZSCORE
                .with_label_values(&["metrics_warming_device"])
                .get(),
            0.0
        );
    }

    #[test]
    fn test_encode_metrics() {
        record_notification("success");
        record_decode_error();
        record_queue_drop();

        let output = encode_metrics();
        assert!(output.contains("peed_notifications_total"));
        assert!(output.contains("peed_decode_errors_total"));
        assert!(output.contains("peed_queue_dropped_total"));
    }
}
