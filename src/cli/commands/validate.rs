//! Validate config command implementation
//!
//! Loads the configuration, builds every provider and the definition
//! registry, and reports the first problem found. With
//! `--test-connection` it also checks that PostgreSQL is reachable.

use super::{build_registry, exit_code, EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use crate::adapters::postgresql::PostgreSQLClient;
use crate::config::{load_config, ProviderConfig, SecurityMode};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also open a PostgreSQL connection and run `SELECT 1`
    #[arg(long)]
    pub test_connection: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let registry = match build_registry(&config) {
            Ok(r) => {
                println!("✅ Export catalog is valid");
                r
            }
            Err(e) => {
                println!("❌ Export catalog validation failed");
                println!("   Error: {e}");
                return Ok(exit_code(&e));
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Default Max Rows: {}", config.export.default_max_rows);
        println!(
            "  Security: {}",
            match config.security.mode {
                SecurityMode::PermitAll => "permit_all".to_string(),
                SecurityMode::Roles => {
                    format!("roles (wildcard '{}')", config.security.wildcard_role)
                }
            }
        );
        println!(
            "  Audit File: {}",
            if config.audit.file_enabled {
                config.audit.file_path.as_str()
            } else {
                "disabled"
            }
        );
        println!("  Providers:");
        for provider in &config.providers {
            let kind = match provider {
                ProviderConfig::Postgres(_) => "postgres",
                ProviderConfig::Rest(_) => "rest",
            };
            println!(
                "    - {} ({kind}, {} attributes)",
                provider.name(),
                provider.attributes().len()
            );
        }
        println!("  Exports: {}", registry.len());
        println!();

        if self.test_connection {
            let Some(pg_config) = &config.postgresql else {
                println!("No [postgresql] section, skipping connection test");
                return Ok(EXIT_OK);
            };
            let client = match PostgreSQLClient::new(pg_config) {
                Ok(c) => c,
                Err(e) => {
                    println!("❌ {e}");
                    return Ok(EXIT_CONFIG);
                }
            };
            if let Err(e) = client.test_connection().await {
                println!("❌ PostgreSQL at {} is not reachable", client.connection_string_safe());
                println!("   Error: {e}");
                return Ok(EXIT_FATAL);
            }
            println!("✅ PostgreSQL at {} is reachable", client.connection_string_safe());
        }

        Ok(EXIT_OK)
    }
}
