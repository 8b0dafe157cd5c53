//! Core export engine.
//!
//! # Modules
//!
//! - [`registry`] - immutable catalog of export definitions and providers
//! - [`validation`] - raw parameters to typed, validated requests
//! - [`security`] - per-definition allow/deny gate
//! - [`stream`] - row streams and the read-only stream runner
//! - [`csv`] - column resolution, formatting and the streaming writer
//! - [`export`] - the export service and audit sinks
//!
//! # Export Workflow
//!
//! 1. **Resolve**: look up the definition by key
//! 2. **Authorize**: check the caller against the definition's roles
//! 3. **Validate**: coerce raw parameters into a typed request
//! 4. **Stream**: open the provider inside a read-only unit of work and
//!    write each row as CSV, stopping at the row ceiling
//! 5. **Audit**: record one event with the outcome and row count
//!
//! # Example
//!
//! ```rust,no_run
//! use csv_export::adapters::{memory::StaticRowsProvider, ExportPlugins};
//! use csv_export::config::parse_config;
//! use csv_export::core::export::{ExportService, TracingAuditSink};
//! use csv_export::core::registry::ExportDefinitionRegistry;
//! use csv_export::core::security::PermitAllSecurity;
//! use csv_export::domain::{AttributeKind, CellValue, RawParams, RowAttribute, RowSchema};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = parse_config(
//!     r#"
//! [[exports]]
//! key = "claims"
//! provider = "claims"
//! "#,
//! )?;
//!
//! let schema = RowSchema::new("ClaimRow", vec![RowAttribute::new("id", AttributeKind::Text)])?;
//! let rows = vec![vec![CellValue::from("A")], vec![CellValue::from("B")]];
//! let plugins = ExportPlugins::new()
//!     .with_provider("claims", Arc::new(StaticRowsProvider::new(schema, rows)))?;
//!
//! let registry = ExportDefinitionRegistry::from_config(&config, &plugins)?;
//! let service = ExportService::new(
//!     Arc::new(registry),
//!     Arc::new(PermitAllSecurity),
//!     Arc::new(TracingAuditSink),
//! );
//!
//! let mut out = Vec::new();
//! let rows = service.stream_csv("claims", &RawParams::new(), &mut out).await?;
//! println!("{rows} rows");
//! # Ok(())
//! # }
//! ```

pub mod csv;
pub mod export;
pub mod registry;
pub mod security;
pub mod stream;
pub mod validation;
