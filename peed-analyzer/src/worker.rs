// Peed Analyzer - Analysis worker
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Single consumer of the ingestion queue.
//!
//! For every reading, strictly in order: append to the device window,
//! derive the baseline from the updated window, classify, audit, and on
//! anomaly dispatch a notification and audit its outcome. The worker is the
//! only writer of window state, so the statistics engine needs no locking.

use crate::audit::{AuditEntry, AuditSink};
use crate::dispatcher::{AnomalyEvent, NotificationRecord, Notifier};
use crate::metrics;
use crate::queue::IngestReceiver;
use peed::{Classification, Classifier, DetectionConfig, Reading, WindowStore};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of processing one reading.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub classification: Classification,
    /// Present only for anomalous readings
    pub notification: Option<NotificationRecord>,
}

/// Counters accumulated over a worker's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub processed: u64,
    pub warming: u64,
    pub normal: u64,
    pub anomalous: u64,
    pub notified: u64,
    pub failed: u64,
}

impl WorkerStats {
    fn record(&mut self, outcome: &ProcessOutcome) {
        self.processed += 1;
        match outcome.classification {
            Classification::Warming { .. } => self.warming += 1,
            Classification::Normal { .. } => self.normal += 1,
            Classification::Anomalous { .. } => self.anomalous += 1,
        }
        match &outcome.notification {
            Some(record) if record.is_success() => self.notified += 1,
            Some(_) => self.failed += 1,
            None => {}
        }
    }
}

/// Owns the window state and drives classification and dispatch.
pub struct AnalysisWorker<N> {
    windows: WindowStore,
    classifier: Classifier,
    notifier: N,
    audit: Arc<dyn AuditSink>,
    stats: WorkerStats,
}

impl<N: Notifier> AnalysisWorker<N> {
    pub fn new(config: &DetectionConfig, notifier: N, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            windows: WindowStore::new(config),
            classifier: Classifier::from_config(config),
            notifier,
            audit,
            stats: WorkerStats::default(),
        }
    }

    /// Process one reading to completion.
    pub async fn process(&mut self, reading: Reading) -> ProcessOutcome {
        self.windows.observe(&reading.device_id, reading.temperature);
        let baseline = self.windows.baseline(&reading.device_id);
        let classification = self.classifier.classify(&reading, baseline.as_ref());

        self.audit.record(&AuditEntry::Classified(classification.clone()));
        metrics::record_classification(&classification);

        let notification = if classification.is_anomalous() {
            let record = self.notifier.notify(&AnomalyEvent::from(&reading)).await;
            metrics::record_notification(record.outcome());
            self.audit.record(&AuditEntry::Notified {
                device_id: reading.device_id.clone(),
                record: record.clone(),
            });
            Some(record)
        } else {
            None
        };

        let outcome = ProcessOutcome {
            classification,
            notification,
        };
        self.stats.record(&outcome);
        outcome
    }

    /// Consume the queue until it is closed and drained.
    pub async fn run(mut self, mut receiver: IngestReceiver) -> WorkerStats {
        info!("Analysis worker started");
        while let Some(reading) = receiver.dequeue().await {
            let outcome = self.process(reading).await;
            debug!(
                "{} -> {}",
                outcome.classification.device_id(),
                outcome.classification.label()
            );
        }
        self.audit.flush();
        info!(
            "Analysis worker stopped: {} processed, {} anomalous, {} dropped on overflow",
            self.stats.processed,
            self.stats.anomalous,
            receiver.dropped()
        );
        self.stats
    }

    pub fn windows(&self) -> &WindowStore {
        &self.windows
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats
    }
}
