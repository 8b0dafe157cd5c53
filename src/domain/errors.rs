//! Domain error types
//!
//! This module defines the error taxonomy for the export engine. Errors are
//! domain-specific and don't expose third-party types; driver and transport
//! failures are carried as messages.

use thiserror::Error;

/// Main export error type
///
/// This is the primary error type used throughout the crate. Variants map
/// one-to-one onto the failure classes a caller must distinguish: startup
/// configuration problems, request rejections that happen before any provider
/// is touched, and failures raised while rows are streaming.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Configuration-related errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unknown export key
    #[error("Export definition not found: {0}")]
    DefinitionNotFound(String),

    /// No provider is registered for the export key
    #[error("Export provider not found: {0}")]
    ProviderNotFound(String),

    /// Security gate rejected the caller
    #[error("Access denied to export: {export_key}")]
    AccessDenied {
        /// Export the caller attempted to run
        export_key: String,
    },

    /// Malformed, missing, or disallowed request parameter
    #[error("Invalid parameter '{parameter}': {reason}")]
    Validation {
        /// Offending parameter name
        parameter: String,
        /// Human-readable reason
        reason: String,
    },

    /// Row ceiling crossed mid-stream
    #[error("Export '{export_key}' exceeded the maximum of {max_rows} rows")]
    RowLimitExceeded {
        /// Export that was running
        export_key: String,
        /// Configured ceiling
        max_rows: u64,
    },

    /// Provider failed while producing rows
    #[error("Provider error: {0}")]
    Provider(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(String),

    /// Remote API errors
    #[error("Remote API error: {0}")]
    Remote(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors (including a closed output sink)
    #[error("I/O error: {0}")]
    Io(String),

    /// Audit sink errors
    #[error("Audit error: {0}")]
    Audit(String),
}

impl ExportError {
    /// Shorthand for a validation failure
    pub fn validation(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        ExportError::Validation {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Stable short label used in audit records and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ExportError::Configuration(_) => "configuration",
            ExportError::DefinitionNotFound(_) => "not_found",
            ExportError::ProviderNotFound(_) => "provider_not_found",
            ExportError::AccessDenied { .. } => "access_denied",
            ExportError::Validation { .. } => "validation",
            ExportError::RowLimitExceeded { .. } => "row_limit_exceeded",
            ExportError::Provider(_) => "provider",
            ExportError::Database(_) => "database",
            ExportError::Remote(_) => "remote",
            ExportError::Serialization(_) => "serialization",
            ExportError::Io(_) => "io",
            ExportError::Audit(_) => "audit",
        }
    }

    /// Whether the error was raised before any provider was invoked
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ExportError::DefinitionNotFound(_)
                | ExportError::AccessDenied { .. }
                | ExportError::Validation { .. }
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

// Conversion from csv record errors
impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Serialization(format!("CSV encoding failed: {err}"))
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ExportError {
    fn from(err: toml::de::Error) -> Self {
        ExportError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_error_display() {
        let err = ExportError::Configuration("missing provider".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing provider");
    }

    #[test]
    fn test_validation_error_names_parameter() {
        let err = ExportError::validation("officeCode", "required parameter is missing");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'officeCode': required parameter is missing"
        );
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_row_limit_display() {
        let err = ExportError::RowLimitExceeded {
            export_key: "claims".to_string(),
            max_rows: 2,
        };
        assert_eq!(
            err.to_string(),
            "Export 'claims' exceeded the maximum of 2 rows"
        );
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_rejections() {
        assert!(ExportError::DefinitionNotFound("x".into()).is_rejection());
        assert!(ExportError::AccessDenied {
            export_key: "x".into()
        }
        .is_rejection());
        assert!(!ExportError::Provider("boom".into()).is_rejection());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink closed");
        let err: ExportError = io_err.into();
        assert!(matches!(err, ExportError::Io(_)));
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ExportError = json_err.into();
        assert!(matches!(err, ExportError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: ExportError = toml_err.into();
        assert!(matches!(err, ExportError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
