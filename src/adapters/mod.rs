//! Row providers and their registration
//!
//! - [`provider`]: the [`ExportQueryProvider`] contract and the
//!   [`ExportPlugins`] map the registry resolves provider names against
//! - [`postgresql`]: streaming SQL query over a pooled connection
//! - [`rest`]: paginated JSON API
//! - [`memory`]: rows held in memory
//! - [`factory`]: builds the configured providers
//!
//! # Example
//!
//! ```rust,no_run
//! use csv_export::adapters::create_plugins;
//! use csv_export::config::load_config;
//!
//! # fn example() -> csv_export::domain::Result<()> {
//! let config = load_config("exports.toml")?;
//! let plugins = create_plugins(&config)?;
//! for name in plugins.provider_names() {
//!     println!("{name}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod factory;
pub mod memory;
pub mod postgresql;
pub mod provider;
pub mod rest;

pub use factory::create_plugins;
pub use memory::StaticRowsProvider;
pub use provider::{ExportPlugins, ExportQueryProvider};
