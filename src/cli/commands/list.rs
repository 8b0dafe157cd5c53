//! List command implementation

use super::{build_registry, exit_code, EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use clap::Args;

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {}

impl ListArgs {
    /// Print every registered export with its ceiling and description
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let registry = match build_registry(&config) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Invalid export catalog: {e}");
                return Ok(exit_code(&e));
            }
        };

        if registry.is_empty() {
            println!("No exports configured");
            return Ok(EXIT_OK);
        }

        println!("{:<32} {:>10}  {:<16} DESCRIPTION", "KEY", "MAX ROWS", "PROVIDER");
        for definition in registry.definitions() {
            println!(
                "{:<32} {:>10}  {:<16} {}",
                definition.key().as_str(),
                definition.max_rows(),
                definition.provider(),
                definition.description()
            );
        }
        Ok(EXIT_OK)
    }
}
