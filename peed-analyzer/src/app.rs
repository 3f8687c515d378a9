// Peed Analyzer - Process bootstrap
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Wiring of the pipeline.
//!
//! Transport → ingestion queue → analysis worker (→ dispatcher) → audit log.
//! The transport runs on the current task; the worker and the optional
//! metrics server are spawned. Ctrl-C cancels the shared token, the
//! transport disconnects, and the worker drains what is already queued.

use crate::audit::{AuditSink, FileAuditLog};
use crate::dispatcher::HttpDispatcher;
use crate::error::{AnalyzerError, Result};
use crate::queue::ingestion_queue;
use crate::server;
use crate::settings::Settings;
use crate::transport::MqttTransport;
use crate::worker::{AnalysisWorker, WorkerStats};
use peed::TlsMaterial;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Run the analyzer until Ctrl-C or a fatal transport error.
pub async fn run(settings: Settings) -> Result<WorkerStats> {
    settings.validate()?;
    for line in settings.summary() {
        info!("{}", line);
    }

    let tls = TlsMaterial::load(&settings.tls_paths())?;
    let audit: Arc<dyn AuditSink> = Arc::new(FileAuditLog::open(&settings.log_file)?);
    let dispatcher = HttpDispatcher::new(settings.dispatcher())?;

    let shutdown = CancellationToken::new();
    let (sender, receiver) = ingestion_queue(settings.queue_capacity);

    let worker = AnalysisWorker::new(&settings.detection(), dispatcher, Arc::clone(&audit));
    let worker_handle = tokio::spawn(worker.run(receiver));

    if let Some(port) = settings.metrics_port {
        let token = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = server::serve(port, token).await {
                error!("Metrics server failed: {}", e);
            }
        });
    }

    {
        let token = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown requested"),
                Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
            }
            token.cancel();
        });
    }

    let transport = MqttTransport::new(settings.transport(), tls);
    let transport_result = transport.run(sender, Arc::clone(&audit), shutdown.clone()).await;

    // Sender is gone: the worker finishes the backlog and stops.
    shutdown.cancel();
    let stats = worker_handle
        .await
        .map_err(|e| AnalyzerError::Worker(e.to_string()))?;
    audit.flush();

    transport_result?;
    Ok(stats)
}
