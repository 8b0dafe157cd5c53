//! Result type alias for the export engine

use super::errors::ExportError;

/// Result type alias for export operations
///
/// # Examples
///
/// ```
/// use csv_export::domain::result::Result;
/// use csv_export::domain::errors::ExportError;
///
/// fn failing_function() -> Result<()> {
///     Err(ExportError::DefinitionNotFound("claims".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ExportError>;
