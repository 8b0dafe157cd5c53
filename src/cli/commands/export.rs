//! Export command implementation
//!
//! Streams one export as CSV to a file or stdout. Progress and errors go to
//! stderr so stdout carries nothing but CSV.

use super::{build_service, exit_code, EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use crate::core::security::Principal;
use crate::domain::RawParams;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export key
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Request parameter (repeatable)
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Write CSV to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Caller name for role checks
    #[arg(long, env = "CSV_EXPORT_USER")]
    pub user: Option<String>,

    /// Role held by the caller (repeatable)
    #[arg(long = "role", value_name = "ROLE")]
    pub roles: Vec<String>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(export_key = %self.key, "Starting export command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let service = match build_service(&config, self.principal()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize export service");
                eprintln!("Failed to initialize export: {e}");
                return Ok(exit_code(&e));
            }
        };

        let raw: RawParams = self.params.iter().cloned().collect();

        let result = match &self.output {
            Some(path) => {
                let mut file = tokio::fs::File::create(path)
                    .await
                    .with_context(|| format!("Failed to create output file {}", path.display()))?;
                service.stream_csv(&self.key, &raw, &mut file).await
            }
            None => {
                let mut stdout = tokio::io::stdout();
                service.stream_csv(&self.key, &raw, &mut stdout).await
            }
        };

        match result {
            Ok(rows) => {
                eprintln!("Exported {rows} rows from '{}'", self.key);
                Ok(EXIT_OK)
            }
            Err(e) => {
                eprintln!("Export '{}' failed: {e}", self.key);
                Ok(exit_code(&e))
            }
        }
    }

    /// Caller identity; anonymous unless a user or role was given
    fn principal(&self) -> Option<Principal> {
        if self.user.is_none() && self.roles.is_empty() {
            return None;
        }
        let name = self.user.clone().unwrap_or_else(|| "cli".to_string());
        Some(Principal::new(name, self.roles.iter().cloned()))
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}
