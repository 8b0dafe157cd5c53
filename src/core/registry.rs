//! Export definition registry
//!
//! The registry is built once at startup from the export catalog and the
//! registered plug-ins, and is read-only afterwards. Every catalog problem is
//! reported as [`ExportError::Configuration`] while building, so a running
//! registry only ever holds definitions whose provider, columns and
//! parameters have been checked.

use crate::adapters::provider::{ExportPlugins, ExportQueryProvider};
use crate::config::{ExportDefinitionConfig, ExporterConfig, ParamConfig};
use crate::core::csv::validate_pattern;
use crate::domain::{
    ExportColumn, ExportDefinition, ExportError, ExportKey, ExportParamDefinition, ParamType,
    Result,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

struct RegisteredExport {
    definition: Arc<ExportDefinition>,
    provider: Arc<dyn ExportQueryProvider>,
}

/// Immutable catalog of export definitions and their resolved providers
pub struct ExportDefinitionRegistry {
    exports: BTreeMap<String, RegisteredExport>,
}

impl ExportDefinitionRegistry {
    /// Build the registry from a loaded configuration
    pub fn from_config(config: &ExporterConfig, plugins: &ExportPlugins) -> Result<Self> {
        Self::build(&config.exports, config.export.default_max_rows, plugins)
    }

    /// Build the registry from catalog entries
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Configuration`] on the first invalid entry:
    /// a blank or unknown provider reference, a duplicate key, a zero row
    /// ceiling, an unknown column key or invalid format pattern, or an
    /// invalid parameter declaration.
    pub fn build(
        definitions: &[ExportDefinitionConfig],
        default_max_rows: u64,
        plugins: &ExportPlugins,
    ) -> Result<Self> {
        let mut exports = BTreeMap::new();

        for entry in definitions {
            let registered = build_entry(entry, default_max_rows, plugins)?;
            let key = registered.definition.key().as_str().to_string();
            if exports.contains_key(&key) {
                return Err(ExportError::Configuration(format!(
                    "Duplicate export key '{key}'"
                )));
            }
            tracing::debug!(
                export_key = %key,
                provider = registered.definition.provider(),
                max_rows = registered.definition.max_rows(),
                "Registered export definition"
            );
            exports.insert(key, registered);
        }

        tracing::info!(count = exports.len(), "Export registry built");
        Ok(Self { exports })
    }

    /// Definition for `key`, or [`ExportError::DefinitionNotFound`]
    pub fn get_required(&self, key: &str) -> Result<Arc<ExportDefinition>> {
        self.exports
            .get(key)
            .map(|e| e.definition.clone())
            .ok_or_else(|| ExportError::DefinitionNotFound(key.to_string()))
    }

    /// Provider resolved for `key`, or [`ExportError::ProviderNotFound`]
    pub fn get_provider(&self, key: &str) -> Result<Arc<dyn ExportQueryProvider>> {
        self.exports
            .get(key)
            .map(|e| e.provider.clone())
            .ok_or_else(|| ExportError::ProviderNotFound(key.to_string()))
    }

    /// Snapshot of the registered keys, in sorted order
    pub fn keys(&self) -> Vec<ExportKey> {
        self.exports
            .values()
            .map(|e| e.definition.key().clone())
            .collect()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ExportDefinition> {
        self.exports.values().map(|e| e.definition.as_ref())
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }
}

impl std::fmt::Debug for ExportDefinitionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportDefinitionRegistry")
            .field("exports", &self.exports.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn config_error(key: &str, message: impl std::fmt::Display) -> ExportError {
    ExportError::Configuration(format!("Export '{key}': {message}"))
}

fn build_entry(
    entry: &ExportDefinitionConfig,
    default_max_rows: u64,
    plugins: &ExportPlugins,
) -> Result<RegisteredExport> {
    let key = ExportKey::new(entry.key.clone()).map_err(ExportError::Configuration)?;
    let key_str = key.as_str();

    let provider_name = entry
        .provider
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| config_error(key_str, "missing provider"))?;
    let provider = plugins
        .provider(provider_name)
        .cloned()
        .ok_or_else(|| config_error(key_str, format!("unknown provider '{provider_name}'")))?;

    let max_rows = entry.max_rows.unwrap_or(default_max_rows);
    if max_rows == 0 {
        return Err(config_error(key_str, "max_rows must be > 0"));
    }

    let schema = provider.row_schema();
    let mut columns = Vec::with_capacity(entry.columns.len());
    for column in &entry.columns {
        let Some(attribute) = schema.attribute(&column.key) else {
            return Err(config_error(
                key_str,
                format!(
                    "column '{}' is not an attribute of row type '{}'",
                    column.key,
                    schema.type_name()
                ),
            ));
        };
        if let Some(pattern) = column.format.as_deref().filter(|p| !p.trim().is_empty()) {
            validate_pattern(pattern, attribute.kind)
                .map_err(|e| config_error(key_str, format!("column '{}': {e}", column.key)))?;
        }
        columns.push(ExportColumn::new(
            column.key.clone(),
            column.header.clone(),
            column.format.clone(),
        ));
    }

    let mut params = Vec::with_capacity(entry.params.len());
    let mut seen = BTreeSet::new();
    for param in &entry.params {
        if !seen.insert(param.name.trim()) {
            return Err(config_error(
                key_str,
                format!("parameter '{}' is declared more than once", param.name),
            ));
        }
        params.push(build_param(key_str, param, plugins)?);
    }

    if let Some(unbound) = provider
        .bound_parameters()
        .iter()
        .find(|name| !seen.contains(name.as_str()))
    {
        return Err(config_error(
            key_str,
            format!("provider '{provider_name}' binds undeclared parameter '{unbound}'"),
        ));
    }

    let allowed_roles: BTreeSet<String> = entry
        .allowed_roles
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();

    let definition = ExportDefinition::new(
        key.clone(),
        entry.description.clone(),
        allowed_roles,
        max_rows,
        provider_name,
        columns,
        params,
    );

    Ok(RegisteredExport {
        definition: Arc::new(definition),
        provider,
    })
}

fn build_param(
    key: &str,
    param: &ParamConfig,
    plugins: &ExportPlugins,
) -> Result<ExportParamDefinition> {
    let name = param.name.trim();
    if name.is_empty() {
        return Err(config_error(key, "parameter name cannot be empty"));
    }

    let param_type: ParamType = param
        .param_type
        .parse()
        .map_err(|e| config_error(key, format!("parameter '{name}': {e}")))?;

    let enum_class = param
        .enum_class
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let allowed_values = match (param_type, enum_class) {
        (ParamType::Enum, Some(_)) if !param.allowed_values.is_empty() => {
            return Err(config_error(
                key,
                format!("parameter '{name}': set either enum_class or allowed_values, not both"),
            ));
        }
        (ParamType::Enum, Some(class)) => plugins
            .enum_type(class)
            .map(<[String]>::to_vec)
            .ok_or_else(|| {
                config_error(key, format!("parameter '{name}': unknown enum class '{class}'"))
            })?,
        (ParamType::Enum, None) if param.allowed_values.is_empty() => {
            return Err(config_error(
                key,
                format!("parameter '{name}': ENUM requires enum_class or allowed_values"),
            ));
        }
        (_, Some(_)) => {
            return Err(config_error(
                key,
                format!("parameter '{name}': enum_class only applies to ENUM parameters"),
            ));
        }
        _ => param.allowed_values.clone(),
    };

    let default = match param.default.as_deref() {
        None => None,
        Some(raw) => {
            let value = param_type.coerce(raw).map_err(|e| {
                config_error(key, format!("parameter '{name}': invalid default: {e}"))
            })?;
            if !allowed_values.is_empty() && !allowed_values.iter().any(|v| v == raw) {
                return Err(config_error(
                    key,
                    format!("parameter '{name}': default '{raw}' is not an allowed value"),
                ));
            }
            Some(value)
        }
    };

    Ok(ExportParamDefinition::new(
        name,
        param_type,
        param.required,
        default,
        enum_class.map(str::to_string),
        allowed_values,
    ))
}
