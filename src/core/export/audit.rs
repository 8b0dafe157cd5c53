//! Export audit events and sinks
//!
//! Exactly one [`ExportAuditEvent`] is produced for every export that gets
//! past validation, on whichever path it terminates. Sinks receive the event
//! by reference and don't keep it unless they are built to (see
//! [`MemoryAuditSink`]).

use crate::domain::{ExportError, ExportKey, Result, ValidatedExportRequest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How an export attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Failure {
        /// Stable label from [`ExportError::kind`]
        kind: String,
        /// Error message
        message: String,
    },
}

impl AuditOutcome {
    pub fn failure(error: &ExportError) -> Self {
        AuditOutcome::Failure {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuditOutcome::Success)
    }

    fn label(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure { .. } => "failure",
        }
    }
}

/// One export attempt
#[derive(Debug, Clone)]
pub struct ExportAuditEvent {
    pub export_key: ExportKey,
    pub request: ValidatedExportRequest,
    /// Rows emitted before the export terminated
    pub row_count: u64,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub outcome: AuditOutcome,
}

/// Receives audit events
///
/// A failing sink is logged by the caller and never changes the outcome of
/// the export.
pub trait ExportAuditSink: Send + Sync {
    fn record(&self, event: &ExportAuditEvent) -> Result<()>;
}

/// Emits each event as a structured tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl ExportAuditSink for TracingAuditSink {
    fn record(&self, event: &ExportAuditEvent) -> Result<()> {
        match &event.outcome {
            AuditOutcome::Success => tracing::info!(
                target: "csv_export::audit",
                export_key = %event.export_key,
                row_count = event.row_count,
                duration_ms = event.duration.as_millis() as u64,
                outcome = "success",
                "Export audit"
            ),
            AuditOutcome::Failure { kind, message } => tracing::warn!(
                target: "csv_export::audit",
                export_key = %event.export_key,
                row_count = event.row_count,
                duration_ms = event.duration.as_millis() as u64,
                outcome = "failure",
                error_kind = %kind,
                error = %message,
                "Export audit"
            ),
        }
        Ok(())
    }
}

/// Audit file line
#[derive(Debug, Serialize)]
struct AuditLogEntry<'a> {
    timestamp: String,
    export_key: &'a str,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    row_count: u64,
    max_rows: u64,
    duration_ms: u64,
    param_names: Vec<&'a str>,
    /// SHA-256 of the serialized parameter values (never logged in plaintext)
    params_sha256: String,
}

/// Appends audit events to a file, one line per event
pub struct JsonFileAuditSink {
    path: PathBuf,
    json_format: bool,
    lock: Mutex<()>,
}

impl JsonFileAuditSink {
    /// Create the sink, creating the parent directory if needed
    pub fn new(path: impl Into<PathBuf>, json_format: bool) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ExportError::Audit(format!(
                    "Failed to create audit log directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        Ok(Self {
            path,
            json_format,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fingerprint(request: &ValidatedExportRequest) -> Result<String> {
        let bytes = serde_json::to_vec(request.params())?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn entry<'a>(&self, event: &'a ExportAuditEvent) -> Result<AuditLogEntry<'a>> {
        let (error_kind, error) = match &event.outcome {
            AuditOutcome::Success => (None, None),
            AuditOutcome::Failure { kind, message } => {
                (Some(kind.as_str()), Some(message.as_str()))
            }
        };
        Ok(AuditLogEntry {
            timestamp: event.started_at.to_rfc3339(),
            export_key: event.export_key.as_str(),
            outcome: event.outcome.label(),
            error_kind,
            error,
            row_count: event.row_count,
            max_rows: event.request.max_rows(),
            duration_ms: event.duration.as_millis() as u64,
            param_names: event.request.params().keys().map(String::as_str).collect(),
            params_sha256: Self::fingerprint(&event.request)?,
        })
    }
}

impl ExportAuditSink for JsonFileAuditSink {
    fn record(&self, event: &ExportAuditEvent) -> Result<()> {
        let entry = self.entry(event)?;
        let line = if self.json_format {
            serde_json::to_string(&entry)?
        } else {
            format!(
                "[{}] Export: {} | Outcome: {} | Rows: {} | Time: {}ms{}",
                entry.timestamp,
                entry.export_key,
                entry.outcome,
                entry.row_count,
                entry.duration_ms,
                entry.error.map(|e| format!(" | Error: {e}")).unwrap_or_default()
            )
        };

        let _guard = self
            .lock
            .lock()
            .map_err(|_| ExportError::Audit("Audit file lock poisoned".to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ExportError::Audit(format!(
                    "Failed to open audit log {}: {e}",
                    self.path.display()
                ))
            })?;
        writeln!(file, "{line}")
            .map_err(|e| ExportError::Audit(format!("Failed to write audit entry: {e}")))?;
        Ok(())
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<ExportAuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events, oldest first
    pub fn events(&self) -> Vec<ExportAuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExportAuditSink for MemoryAuditSink {
    fn record(&self, event: &ExportAuditEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| ExportError::Audit("Audit event store poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}

/// Forwards each event to every wrapped sink
///
/// All sinks are attempted; the first failure is returned.
#[derive(Default, Clone)]
pub struct FanoutAuditSink {
    sinks: Vec<Arc<dyn ExportAuditSink>>,
}

impl FanoutAuditSink {
    pub fn new(sinks: Vec<Arc<dyn ExportAuditSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn ExportAuditSink>) {
        self.sinks.push(sink);
    }
}

impl ExportAuditSink for FanoutAuditSink {
    fn record(&self, event: &ExportAuditEvent) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.record(event) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParamValue;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn event(outcome: AuditOutcome) -> ExportAuditEvent {
        let key = ExportKey::new("claims").unwrap();
        let mut params = BTreeMap::new();
        params.insert("office".to_string(), ParamValue::String("LDN-Central".into()));
        ExportAuditEvent {
            export_key: key.clone(),
            request: ValidatedExportRequest::new(key, params, 2),
            row_count: 2,
            started_at: Utc::now(),
            duration: Duration::from_millis(15),
            outcome,
        }
    }

    struct FailingSink;

    impl ExportAuditSink for FailingSink {
        fn record(&self, _event: &ExportAuditEvent) -> Result<()> {
            Err(ExportError::Audit("disk full".to_string()))
        }
    }

    #[test]
    fn test_json_file_sink_hashes_params() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.log");
        let sink = JsonFileAuditSink::new(&path, true).unwrap();

        sink.record(&event(AuditOutcome::Success)).unwrap();
        let failure = ExportError::RowLimitExceeded {
            export_key: "claims".into(),
            max_rows: 2,
        };
        sink.record(&event(AuditOutcome::failure(&failure))).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["outcome"], "success");
        assert_eq!(lines[0]["row_count"], 2);
        assert_eq!(lines[0]["param_names"][0], "office");
        assert_eq!(lines[0]["params_sha256"].as_str().unwrap().len(), 64);
        assert!(lines[0].get("error").is_none());
        assert_eq!(lines[1]["outcome"], "failure");
        assert_eq!(lines[1]["error_kind"], "row_limit_exceeded");
        assert!(!content.contains("LDN-Central"));
    }

    #[test]
    fn test_plain_text_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let sink = JsonFileAuditSink::new(&path, false).unwrap();

        sink.record(&event(AuditOutcome::Success)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Export: claims | Outcome: success | Rows: 2"));
    }

    #[test]
    fn test_memory_sink_keeps_events() {
        let sink = MemoryAuditSink::new();
        assert!(sink.is_empty());
        sink.record(&event(AuditOutcome::Success)).unwrap();
        assert_eq!(sink.len(), 1);
        assert!(sink.events()[0].outcome.is_success());
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let memory = Arc::new(MemoryAuditSink::new());
        let fanout = FanoutAuditSink::new(vec![
            Arc::new(FailingSink),
            memory.clone(),
            Arc::new(TracingAuditSink),
        ]);

        let result = fanout.record(&event(AuditOutcome::Success));
        assert!(matches!(result, Err(ExportError::Audit(_))));
        assert_eq!(memory.len(), 1);
    }
}
