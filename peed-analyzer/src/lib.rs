// Peed Analyzer - Anomaly detection consumer
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Peed Analyzer
//!
//! Consumes temperature readings from an MQTT topic over mutual TLS,
//! classifies each one against a rolling per-device baseline and forwards
//! anomalies to an HTTP notification API.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐    ┌───────────┐    ┌─────────────────┐    ┌────────────┐
//! │   MQTT    │───▶│ Ingestion │───▶│ Analysis worker │───▶│ Dispatcher │
//! │ transport │    │   queue   │    │ window/classify │    │   (HTTP)   │
//! └───────────┘    └───────────┘    └────────┬────────┘    └─────┬──────┘
//!                                            ▼                   ▼
//!                                   ┌──────────────────────────────────┐
//!                                   │            Audit log             │
//!                                   └──────────────────────────────────┘
//! ```
//!
//! The transport never blocks on analysis, dispatch failures never reach
//! window state, and the worker is the only owner of the windows.

pub mod app;
pub mod audit;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod retry;
pub mod server;
pub mod settings;
pub mod transport;
pub mod worker;

pub use audit::{AuditEntry, AuditSink, FileAuditLog, MemoryAuditLog};
pub use dispatcher::{
    AnomalyEvent, DispatchFailure, DispatcherConfig, HttpDispatcher, NotificationPayload,
    NotificationRecord, Notifier,
};
pub use error::{AnalyzerError, Result, TransportError};
pub use queue::{ingestion_queue, EnqueueError, IngestReceiver, IngestSender};
pub use retry::RetryStrategy;
pub use settings::Settings;
pub use transport::{MqttTransport, TransportConfig};
pub use worker::{AnalysisWorker, ProcessOutcome, WorkerStats};
