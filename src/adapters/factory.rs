//! Provider factory
//!
//! Builds the [`ExportPlugins`] described by a configuration file: one
//! provider per `[[providers]]` entry plus the `[enum_types]` classes.

use crate::adapters::postgresql::{PostgreSQLClient, PostgresQueryProvider};
use crate::adapters::provider::{ExportPlugins, ExportQueryProvider};
use crate::adapters::rest::RestQueryProvider;
use crate::config::{ExporterConfig, ProviderConfig};
use crate::domain::{ExportError, Result, RowSchema};
use std::sync::Arc;

/// Create every configured provider and enum class
///
/// PostgreSQL providers share a single pool, created only when at least one
/// of them is configured. No connection is opened here.
///
/// # Errors
///
/// Returns [`ExportError::Configuration`] if a provider is misconfigured or
/// a name is registered twice.
pub fn create_plugins(config: &ExporterConfig) -> Result<ExportPlugins> {
    let mut plugins = ExportPlugins::new();
    let mut pg_client: Option<Arc<PostgreSQLClient>> = None;

    for provider in &config.providers {
        let type_name = match provider {
            ProviderConfig::Postgres(p) => p.row_type.as_deref(),
            ProviderConfig::Rest(p) => p.row_type.as_deref(),
        }
        .unwrap_or(provider.name());
        let schema = Arc::new(RowSchema::new(type_name, provider.attributes().to_vec())?);

        let built: Arc<dyn ExportQueryProvider> = match provider {
            ProviderConfig::Postgres(p) => {
                let client = match &pg_client {
                    Some(client) => client.clone(),
                    None => {
                        let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                            ExportError::Configuration(format!(
                                "Provider '{}' needs a [postgresql] section",
                                p.name
                            ))
                        })?;
                        tracing::info!("Creating PostgreSQL connection pool");
                        let client = Arc::new(PostgreSQLClient::new(pg_config)?);
                        pg_client = Some(client.clone());
                        client
                    }
                };
                Arc::new(PostgresQueryProvider::new(client, p, schema))
            }
            ProviderConfig::Rest(p) => Arc::new(RestQueryProvider::new(p, schema)?),
        };

        tracing::debug!(provider = provider.name(), row_type = type_name, "Registered provider");
        plugins.register_provider(provider.name(), built)?;
    }

    for (name, literals) in &config.enum_types {
        plugins.register_enum_type(name.clone(), literals.clone())?;
    }

    Ok(plugins)
}
