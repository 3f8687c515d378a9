// Peed Analyzer - Audit log
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Append-only audit trail
//!
//! Every classification, dispatch outcome, rejected payload and transport
//! event becomes one line. Lines are timestamp-prefixed in the file and
//! mirrored to `tracing` under the `peed::audit` target for live
//! observation.
//!
//! # Example
//!
//! ```rust
//! use peed::Classification;
//! use peed_analyzer::audit::{AuditEntry, AuditSink, MemoryAuditLog};
//!
//! let log = MemoryAuditLog::new();
//! log.record(&AuditEntry::Classified(Classification::Warming {
//!     device_id: "Machine_01".to_string(),
//!     temperature: 66.0,
//! }));
//! assert_eq!(log.lines(), vec!["[VAL] Machine_01 temp=66.00°C (warming up)"]);
//! ```

use crate::dispatcher::{DispatchFailure, NotificationRecord};
use chrono::{SecondsFormat, Utc};
use peed::Classification;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Target used for the mirrored `tracing` events.
pub const AUDIT_TARGET: &str = "peed::audit";

/// Severity of an entry, used for the tracing mirror only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One auditable event.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEntry {
    /// Outcome of classifying one reading
    Classified(Classification),
    /// Outcome of one dispatch
    Notified {
        device_id: String,
        record: NotificationRecord,
    },
    /// Transport payload rejected by the decoder
    ParseError { reason: String },
    /// Transport lifecycle (connect, subscribe, failure)
    Transport { message: String, severity: Severity },
}

impl AuditEntry {
    /// Transport event at info level.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            severity: Severity::Info,
        }
    }

    /// Transport failure.
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Classified(c) if c.is_anomalous() => Severity::Warning,
            Self::Classified(_) => Severity::Info,
            Self::Notified {
                record: NotificationRecord::Success { .. },
                ..
            } => Severity::Info,
            Self::Notified { .. } | Self::ParseError { .. } => Severity::Error,
            Self::Transport { severity, .. } => *severity,
        }
    }

    /// Render the line body (without timestamp).
    pub fn render(&self) -> String {
        match self {
            Self::Classified(Classification::Warming {
                device_id,
                temperature,
            }) => format!("[VAL] {} temp={:.2}°C (warming up)", device_id, temperature),
            Self::Classified(Classification::Normal {
                device_id,
                temperature,
                z,
                mean,
                stdev,
            }) => format!(
                "[OK] {} temp={:.2}°C z={:.2} (mean={:.2}, std={:.2})",
                device_id, temperature, z, mean, stdev
            ),
            Self::Classified(Classification::Anomalous {
                device_id,
                temperature,
                z,
                mean,
                stdev,
            }) => format!(
                "[ALERT] {} temp={:.2}°C z={:.2} (mean={:.2}, std={:.2}) -> dispatching",
                device_id, temperature, z, mean, stdev
            ),
            Self::Notified { device_id, record } => match record {
                NotificationRecord::Success { notif_id } => {
                    format!("[NOTIFY] {} created -> {}", device_id, notif_id)
                }
                NotificationRecord::Failure(DispatchFailure::Transport(msg)) => {
                    format!("[NOTIFY][EXCEPTION] {} {}", device_id, msg)
                }
                NotificationRecord::Failure(failure) => {
                    format!("[NOTIFY][ERROR] {} {}", device_id, failure)
                }
            },
            Self::ParseError { reason } => format!("[PARSER][ERROR] {}", reason),
            Self::Transport { message, severity } => match severity {
                Severity::Error => format!("[MQTT][ERROR] {}", message),
                _ => format!("[MQTT] {}", message),
            },
        }
    }
}

/// Audit sink trait
pub trait AuditSink: Send + Sync {
    /// Record one entry. Never fails; sinks log their own I/O errors.
    fn record(&self, entry: &AuditEntry);

    /// Flush pending lines
    fn flush(&self) {}
}

fn mirror(entry: &AuditEntry, line: &str) {
    match entry.severity() {
        Severity::Info => tracing::info!(target: AUDIT_TARGET, "{}", line),
        Severity::Warning => tracing::warn!(target: AUDIT_TARGET, "{}", line),
        Severity::Error => tracing::error!(target: AUDIT_TARGET, "{}", line),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic mid-write leaves nothing worth discarding
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// File-backed audit log, opened in append mode.
#[derive(Debug)]
pub struct FileAuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileAuditLog {
    /// Open (or create) the log file for appending.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditLog {
    fn record(&self, entry: &AuditEntry) {
        let body = entry.render();
        mirror(entry, &body);

        let line = format!(
            "{} {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            body
        );
        let mut file = lock(&self.file);
        if let Err(e) = file.write_all(line.as_bytes()) {
            tracing::error!("Failed to write audit log {}: {}", self.path.display(), e);
        }
    }

    fn flush(&self) {
        if let Err(e) = lock(&self.file).flush() {
            tracing::error!("Failed to flush audit log {}: {}", self.path.display(), e);
        }
    }
}

/// In-memory audit log
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        lock(&self.entries).clone()
    }

    /// Rendered lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        lock(&self.entries).iter().map(AuditEntry::render).collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, entry: &AuditEntry) {
        mirror(entry, &entry.render());
        lock(&self.entries).push(entry.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn anomalous() -> Classification {
        Classification::Anomalous {
            device_id: "Machine_01".to_string(),
            temperature: 90.0,
            z: 16.263,
            mean: 67.0,
            stdev: 1.4142,
        }
    }

    #[test]
    fn test_render_classifications() {
        let normal = AuditEntry::Classified(Classification::Normal {
            device_id: "Machine_01".to_string(),
            temperature: 67.5,
            z: 0.354,
            mean: 67.0,
            stdev: 1.4142,
        });
        assert_eq!(
            normal.render(),
            "[OK] Machine_01 temp=67.50°C z=0.35 (mean=67.00, std=1.41)"
        );
        assert_eq!(
            AuditEntry::Classified(anomalous()).render(),
            "[ALERT] Machine_01 temp=90.00°C z=16.26 (mean=67.00, std=1.41) -> dispatching"
        );
    }

    #[test]
    fn test_render_dispatch_outcomes() {
        let ok = AuditEntry::Notified {
            device_id: "Machine_01".to_string(),
            record: NotificationRecord::Success {
                notif_id: "NOTIF20250301-100000".to_string(),
            },
        };
        assert_eq!(
            ok.render(),
            "[NOTIFY] Machine_01 created -> NOTIF20250301-100000"
        );

        let refused = AuditEntry::Notified {
            device_id: "Machine_01".to_string(),
            record: NotificationRecord::Failure(DispatchFailure::Status {
                status: 401,
                body: r#"{"error":"unauthorized"}"#.to_string(),
            }),
        };
        assert_eq!(
            refused.render(),
            r#"[NOTIFY][ERROR] Machine_01 status=401 body={"error":"unauthorized"}"#
        );

        let timeout = AuditEntry::Notified {
            device_id: "Machine_01".to_string(),
            record: NotificationRecord::Failure(DispatchFailure::Transport(
                "timed out".to_string(),
            )),
        };
        assert!(timeout.render().starts_with("[NOTIFY][EXCEPTION]"));
    }

    #[test]
    fn test_severity() {
        assert_eq!(AuditEntry::Classified(anomalous()).severity(), Severity::Warning);
        assert_eq!(
            AuditEntry::ParseError {
                reason: "x".into()
            }
            .severity(),
            Severity::Error
        );
        assert_eq!(AuditEntry::transport("connect rc=Success").severity(), Severity::Info);
        assert_eq!(
            AuditEntry::transport_error("refused").render(),
            "[MQTT][ERROR] refused"
        );
    }

    #[test]
    fn test_file_log_appends_timestamped_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");
        std::fs::write(&path, "previous line\n").unwrap();

        let log = FileAuditLog::open(&path).unwrap();
        log.record(&AuditEntry::Classified(anomalous()));
        log.record(&AuditEntry::ParseError {
            reason: "malformed JSON".to_string(),
        });
        log.flush();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "previous line");

        let (timestamp, body) = lines[1].split_once(' ').unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert!(body.starts_with("[ALERT] Machine_01"));
        assert!(lines[2].ends_with("[PARSER][ERROR] malformed JSON"));
    }

    #[test]
    fn test_memory_log() {
        let log = MemoryAuditLog::new();
        assert!(log.is_empty());
        log.record(&AuditEntry::transport("SUBSCRIBE usine/capteurs/machine1"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.lines()[0], "[MQTT] SUBSCRIBE usine/capteurs/machine1");
    }
}
