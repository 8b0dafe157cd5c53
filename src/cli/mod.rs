//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for csv-export using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// csv-export - streaming CSV exports
#[derive(Parser, Debug)]
#[command(name = "csv-export")]
#[command(version, about, long_about = None)]
#[command(author = "CSV Export Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "exports.toml", env = "CSV_EXPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CSV_EXPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream an export as CSV
    Export(commands::export::ExportArgs),

    /// List configured exports
    List(commands::list::ListArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),
}
