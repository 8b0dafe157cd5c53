//! Export orchestration and audit
//!
//! - [`ExportService`] - runs one export from request to audited outcome
//! - [`ExportAuditEvent`] and the [`ExportAuditSink`] implementations

pub mod audit;
pub mod service;

pub use audit::{
    AuditOutcome, ExportAuditEvent, ExportAuditSink, FanoutAuditSink, JsonFileAuditSink,
    MemoryAuditSink, TracingAuditSink,
};
pub use service::ExportService;
