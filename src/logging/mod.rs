//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output filtered by `RUST_LOG` or the configured level
//! - JSON file logging with daily or hourly rotation
//! - Export lifecycle macros with consistent field names
//!
//! # Example
//!
//! ```no_run
//! use csv_export::logging::init_logging;
//! use csv_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(export_key = "claims", "Export requested");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export
///
/// # Example
///
/// ```no_run
/// use csv_export::log_export_start;
///
/// log_export_start!("claims", 50_000u64);
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($export_key:expr, $max_rows:expr) => {
        tracing::info!(
            export_key = %$export_key,
            max_rows = $max_rows,
            "Starting export"
        );
    };
}

/// Log the successful completion of an export
///
/// # Example
///
/// ```no_run
/// use csv_export::log_export_complete;
/// use std::time::Duration;
///
/// log_export_complete!("claims", 42u64, Duration::from_millis(120));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($export_key:expr, $row_count:expr, $duration:expr) => {
        tracing::info!(
            export_key = %$export_key,
            row_count = $row_count,
            duration_ms = $duration.as_millis() as u64,
            "Export completed"
        );
    };
}

/// Log an export that failed after rows started streaming
///
/// # Example
///
/// ```no_run
/// use csv_export::log_export_failed;
/// use csv_export::domain::ExportError;
/// use std::time::Duration;
///
/// let error = ExportError::Provider("cursor closed".to_string());
/// log_export_failed!("claims", 10u64, Duration::from_millis(80), &error);
/// ```
#[macro_export]
macro_rules! log_export_failed {
    ($export_key:expr, $row_count:expr, $duration:expr, $error:expr) => {
        tracing::error!(
            export_key = %$export_key,
            row_count = $row_count,
            duration_ms = $duration.as_millis() as u64,
            error_kind = $error.kind(),
            error = %$error,
            "Export failed"
        );
    };
}

/// Log a request rejected before any provider was involved
///
/// # Example
///
/// ```no_run
/// use csv_export::log_export_rejected;
/// use csv_export::domain::ExportError;
///
/// let error = ExportError::DefinitionNotFound("claims".to_string());
/// log_export_rejected!("claims", &error);
/// ```
#[macro_export]
macro_rules! log_export_rejected {
    ($export_key:expr, $error:expr) => {
        tracing::warn!(
            export_key = %$export_key,
            error_kind = $error.kind(),
            error = %$error,
            "Export rejected"
        );
    };
}
