//! Domain models and types for the export engine.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Export key newtype** ([`ExportKey`])
//! - **Definitions** ([`ExportDefinition`], [`ExportColumn`], [`ExportParamDefinition`])
//! - **Requests** ([`RawParams`], [`ValidatedExportRequest`])
//! - **Row model** ([`RowSchema`], [`CellValue`], [`ExportRow`])
//! - **Error types** ([`ExportError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ExportError>`]:
//!
//! ```rust
//! use csv_export::domain::{ExportError, Result};
//!
//! fn lookup(key: &str) -> Result<()> {
//!     Err(ExportError::DefinitionNotFound(key.to_string()))
//! }
//! ```

pub mod definition;
pub mod errors;
pub mod ids;
pub mod request;
pub mod result;
pub mod row;

// Re-export commonly used types for convenience
pub use definition::{ExportColumn, ExportDefinition, ExportParamDefinition, ParamType, ParamValue};
pub use errors::ExportError;
pub use ids::ExportKey;
pub use request::{RawParams, ValidatedExportRequest};
pub use result::Result;
pub use row::{AttributeKind, CellValue, ExportRow, RowAttribute, RowSchema, SchemaRow};
