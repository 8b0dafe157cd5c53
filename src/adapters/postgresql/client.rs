//! PostgreSQL connection pool
//!
//! One pool is shared by every `postgres` provider in a configuration.
//! Connections are created lazily, so building the client never touches
//! the database.

use crate::config::PostgreSQLConfig;
use crate::domain::{ExportError, Result};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::NoTls;

/// Pooled PostgreSQL access for export providers
pub struct PostgreSQLClient {
    pool: Pool,
    statement_timeout: Duration,
    safe_connection_string: String,
}

impl PostgreSQLClient {
    /// Create the pool from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Configuration`] if the connection string does
    /// not parse, or [`ExportError::Database`] if the pool cannot be built.
    pub fn new(config: &PostgreSQLConfig) -> Result<Self> {
        let connection_string = config.connection_string.expose_secret().as_ref();
        let pg_config: tokio_postgres::Config = connection_string.parse().map_err(|e| {
            ExportError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
        })?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| ExportError::Database(format!("Failed to create connection pool: {e}")))?;

        Ok(Self {
            pool,
            statement_timeout: Duration::from_secs(config.statement_timeout_seconds),
            safe_connection_string: connection_string_safe(connection_string),
        })
    }

    /// Get a connection from the pool
    pub async fn get_connection(&self) -> Result<Object> {
        self.pool.get().await.map_err(|e| {
            ExportError::Database(format!(
                "Failed to get connection from pool for {}: {e}",
                self.safe_connection_string
            ))
        })
    }

    /// Run `SELECT 1` on a pooled connection
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| ExportError::Database(format!("Connection test failed: {e}")))?;

        tracing::info!(
            target = %self.safe_connection_string,
            "PostgreSQL connection test successful"
        );
        Ok(())
    }

    /// Per-statement timeout applied inside export transactions; zero disables it
    pub fn statement_timeout(&self) -> Duration {
        self.statement_timeout
    }

    /// Connection string with the password masked, for logs
    pub fn connection_string_safe(&self) -> &str {
        &self.safe_connection_string
    }
}

/// Mask the password in a URL or key/value connection string
fn connection_string_safe(connection_string: &str) -> String {
    if let Ok(mut url) = url::Url::parse(connection_string) {
        if url.password().is_some() {
            // Fails only for URLs without a host, which carry no password
            let _ = url.set_password(Some("****"));
        }
        return url.to_string();
    }

    connection_string
        .split_whitespace()
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key.eq_ignore_ascii_case("password") => format!("{key}=****"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
