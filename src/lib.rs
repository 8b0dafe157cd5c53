// csv-export - Streaming CSV Export Engine
// Copyright (c) 2025 CSV Export Contributors
// Licensed under the MIT License

//! # csv-export
//!
//! A catalog-driven CSV export engine. Each export is declared once, with
//! its columns, typed parameters, row ceiling and allowed roles, and bound
//! to a data provider. Requests are validated, authorized, streamed row by
//! row through a hard row limit into a CSV sink, and audited.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Registry, validation, security, streaming, CSV writing, audit
//! - [`adapters`] - Row providers (PostgreSQL, REST, in-memory)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use csv_export::adapters::create_plugins;
//! use csv_export::config::load_config;
//! use csv_export::core::export::{ExportService, TracingAuditSink};
//! use csv_export::core::registry::ExportDefinitionRegistry;
//! use csv_export::core::security::PermitAllSecurity;
//! use csv_export::domain::RawParams;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("exports.toml")?;
//!     let plugins = create_plugins(&config)?;
//!     let registry = ExportDefinitionRegistry::from_config(&config, &plugins)?;
//!
//!     let service = ExportService::new(
//!         Arc::new(registry),
//!         Arc::new(PermitAllSecurity),
//!         Arc::new(TracingAuditSink),
//!     );
//!
//!     let params = RawParams::from_query("status=READY");
//!     let mut out = tokio::io::stdout();
//!     let rows = service.stream_csv("claims", &params, &mut out).await?;
//!     eprintln!("Exported {rows} rows");
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`], whose error type
//! [`domain::ExportError`] carries a stable [`kind`](domain::ExportError::kind)
//! label used in logs and audit records.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
