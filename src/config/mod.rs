//! Configuration management.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! Configuration files support:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `CSV_EXPORT_<SECTION>_<KEY>` overrides applied after parsing
//! - Default values for optional settings
//! - Secrets that never show up in `Debug` output
//!
//! # Example Configuration
//!
//! ```toml
//! [export]
//! default_max_rows = 100000
//!
//! [security]
//! mode = "roles"
//!
//! [postgresql]
//! connection_string = "${CLAIMS_DATABASE_URL}"
//!
//! [[providers]]
//! kind = "postgres"
//! name = "claims_db"
//! query = "SELECT submission_id, office_code, submitted_on FROM claims WHERE office_code = $1"
//! bind = ["office"]
//! attributes = [
//!     { name = "submission_id", type = "text" },
//!     { name = "office_code", type = "text" },
//!     { name = "submitted_on", type = "date" },
//! ]
//!
//! [enum_types]
//! ClaimStatus = ["READY", "SUBMITTED", "REJECTED"]
//!
//! [[exports]]
//! key = "claims"
//! description = "Submitted claims per office"
//! allowed_roles = ["CASEWORKER"]
//! provider = "claims_db"
//! max_rows = 50000
//!
//! [[exports.columns]]
//! key = "submission_id"
//! header = "Submission Id"
//!
//! [[exports.columns]]
//! key = "submitted_on"
//! header = "Submitted"
//! format = "%d/%m/%Y"
//!
//! [[exports.params]]
//! name = "office"
//! type = "STRING"
//! required = true
//! ```
//!
//! # Validation
//!
//! ```rust,no_run
//! use csv_export::config::load_config;
//!
//! match load_config("exports.toml") {
//!     Ok(config) => println!("{} exports configured", config.exports.len()),
//!     Err(e) => eprintln!("Configuration error: {e}"),
//! }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, AuditConfig, ColumnConfig, ExportConfig, ExportDefinitionConfig,
    ExporterConfig, LoggingConfig, ParamConfig, PostgreSQLConfig, PostgresProviderConfig,
    ProviderConfig, RestProviderConfig, SecurityConfig, SecurityMode,
};
pub use secret::{secret_string, SecretString, SecretValue};
