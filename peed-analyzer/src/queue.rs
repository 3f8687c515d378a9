// Peed Analyzer - Ingestion queue
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Bounded FIFO between the transport and the analysis worker.
//!
//! The transport side never blocks: when the queue is full the newest
//! reading is dropped, counted and reported. The worker side suspends until
//! a reading arrives and sees the end of the stream once every sender has
//! been dropped and the backlog is drained.

use crate::metrics;
use peed::Reading;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Why a reading was not enqueued. The reading is handed back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnqueueError {
    #[error("ingestion queue full, reading from {} dropped", .0.device_id)]
    Full(Reading),

    #[error("ingestion queue closed, reading from {} dropped", .0.device_id)]
    Closed(Reading),
}

/// Create a queue holding at most `capacity` readings.
///
/// # Panics
///
/// Panics if `capacity` is zero; callers validate it beforehand.
pub fn ingestion_queue(capacity: usize) -> (IngestSender, IngestReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        IngestSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        IngestReceiver { rx, dropped },
    )
}

/// Producer half, cloneable.
#[derive(Debug, Clone)]
pub struct IngestSender {
    tx: mpsc::Sender<Reading>,
    dropped: Arc<AtomicU64>,
}

impl IngestSender {
    /// Enqueue without waiting.
    pub fn enqueue(&self, reading: Reading) -> Result<(), EnqueueError> {
        match self.tx.try_send(reading) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(reading)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                metrics::record_queue_drop();
                warn!(
                    "Ingestion queue full, dropping reading from {} ({} dropped so far)",
                    reading.device_id, total
                );
                Err(EnqueueError::Full(reading))
            }
            Err(mpsc::error::TrySendError::Closed(reading)) => Err(EnqueueError::Closed(reading)),
        }
    }

    /// Readings dropped on overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the analysis worker.
#[derive(Debug)]
pub struct IngestReceiver {
    rx: mpsc::Receiver<Reading>,
    dropped: Arc<AtomicU64>,
}

impl IngestReceiver {
    /// Next reading in arrival order, or `None` once closed and drained.
    pub async fn dequeue(&mut self) -> Option<Reading> {
        self.rx.recv().await
    }

    /// Readings dropped on overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(t: f64) -> Reading {
        Reading::new("Machine_01", "", t)
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (tx, mut rx) = ingestion_queue(8);
        for t in [1.0, 2.0, 3.0] {
            tx.enqueue(reading(t)).unwrap();
        }
        drop(tx);

        let mut seen = Vec::new();
        while let Some(r) = rx.dequeue().await {
            seen.push(r.temperature);
        }
        assert_eq!(seen, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_overflow_drops_newest() {
        let (tx, mut rx) = ingestion_queue(2);
        tx.enqueue(reading(1.0)).unwrap();
        tx.enqueue(reading(2.0)).unwrap();

        let err = tx.enqueue(reading(3.0)).unwrap_err();
        assert_eq!(err, EnqueueError::Full(reading(3.0)));
        assert_eq!(tx.dropped(), 1);
        assert_eq!(rx.dropped(), 1);

        drop(tx);
        assert_eq!(rx.dequeue().await.unwrap().temperature, 1.0);
        assert_eq!(rx.dequeue().await.unwrap().temperature, 2.0);
        assert!(rx.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_queue() {
        let (tx, rx) = ingestion_queue(2);
        drop(rx);
        assert!(tx.is_closed());
        assert!(matches!(
            tx.enqueue(reading(1.0)),
            Err(EnqueueError::Closed(_))
        ));
        assert_eq!(tx.dropped(), 0);
    }

    #[tokio::test]
    async fn test_dequeue_waits_for_producer() {
        let (tx, mut rx) = ingestion_queue(4);
        let producer = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            tx.enqueue(reading(42.0)).unwrap();
        });
        assert_eq!(rx.dequeue().await.unwrap().temperature, 42.0);
        producer.await.unwrap();
        assert!(rx.dequeue().await.is_none());
    }

    #[test]
    fn test_capacity() {
        let (tx, _rx) = ingestion_queue(DEFAULT_QUEUE_CAPACITY);
        assert_eq!(tx.capacity(), DEFAULT_QUEUE_CAPACITY);
    }
}
