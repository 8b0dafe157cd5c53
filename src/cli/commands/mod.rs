//! CLI command implementations
//!
//! Commands return process exit codes:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 2 | Configuration error |
//! | 3 | Unknown export, access denied or invalid parameter |
//! | 4 | Row limit exceeded |
//! | 5 | Any other failure |

pub mod export;
pub mod list;
pub mod validate;

use crate::adapters::create_plugins;
use crate::config::{AuditConfig, ExporterConfig, SecurityMode};
use crate::core::export::{
    ExportAuditSink, ExportService, FanoutAuditSink, JsonFileAuditSink, TracingAuditSink,
};
use crate::core::registry::ExportDefinitionRegistry;
use crate::core::security::{
    ExportSecurity, FixedPrincipal, PermitAllSecurity, Principal, RoleBasedSecurity,
};
use crate::domain::{ExportError, Result};
use std::sync::Arc;

pub const EXIT_OK: i32 = 0;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_REJECTED: i32 = 3;
pub const EXIT_ROW_LIMIT: i32 = 4;
pub const EXIT_FATAL: i32 = 5;

/// Exit code for an export error
pub fn exit_code(error: &ExportError) -> i32 {
    match error {
        ExportError::Configuration(_) | ExportError::ProviderNotFound(_) => EXIT_CONFIG,
        ExportError::DefinitionNotFound(_)
        | ExportError::AccessDenied { .. }
        | ExportError::Validation { .. } => EXIT_REJECTED,
        ExportError::RowLimitExceeded { .. } => EXIT_ROW_LIMIT,
        _ => EXIT_FATAL,
    }
}

/// Build providers and the definition registry
pub fn build_registry(config: &ExporterConfig) -> Result<ExportDefinitionRegistry> {
    let plugins = create_plugins(config)?;
    ExportDefinitionRegistry::from_config(config, &plugins)
}

/// Wire the export service for one CLI invocation
///
/// `principal` is only consulted in `roles` security mode.
pub fn build_service(
    config: &ExporterConfig,
    principal: Option<Principal>,
) -> Result<ExportService> {
    let registry = Arc::new(build_registry(config)?);

    let security: Arc<dyn ExportSecurity> = match config.security.mode {
        SecurityMode::PermitAll => Arc::new(PermitAllSecurity),
        SecurityMode::Roles => {
            let source = principal.map_or_else(FixedPrincipal::anonymous, FixedPrincipal::new);
            Arc::new(RoleBasedSecurity::with_wildcard(
                Arc::new(source),
                config.security.wildcard_role.clone(),
            ))
        }
    };

    Ok(ExportService::new(registry, security, build_audit_sink(&config.audit)?))
}

fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn ExportAuditSink>> {
    let mut sink = FanoutAuditSink::new(vec![Arc::new(TracingAuditSink)]);
    if config.file_enabled {
        sink.push(Arc::new(JsonFileAuditSink::new(&config.file_path, config.json_format)?));
    }
    Ok(Arc::new(sink))
}
