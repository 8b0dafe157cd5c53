//! Provider plug-in contract and registration map

use crate::core::stream::RowStream;
use crate::domain::{ExportError, Result, RowSchema, ValidatedExportRequest};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Source of rows for one or more export definitions
///
/// A provider declares its row type up front so the CSV writer can resolve
/// columns before the first row arrives. `open` returns a lazy stream; no
/// rows are fetched until the stream is polled.
#[async_trait]
pub trait ExportQueryProvider: Send + Sync {
    /// Row type of every row this provider yields
    fn row_schema(&self) -> &RowSchema;

    /// Request parameter names the provider reads from a validated request
    ///
    /// Every export using the provider must declare each of them.
    fn bound_parameters(&self) -> &[String] {
        &[]
    }

    /// Open a lazy, single-pass row sequence for a validated request
    async fn open(&self, request: &ValidatedExportRequest) -> Result<RowStream>;
}

/// Providers and named enum classes registered at startup
#[derive(Default, Clone)]
pub struct ExportPlugins {
    providers: BTreeMap<String, Arc<dyn ExportQueryProvider>>,
    enum_types: BTreeMap<String, Vec<String>>,
}

impl ExportPlugins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under a unique name
    pub fn register_provider(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn ExportQueryProvider>,
    ) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ExportError::Configuration(
                "Provider name cannot be empty".to_string(),
            ));
        }
        if self.providers.contains_key(&name) {
            return Err(ExportError::Configuration(format!(
                "Provider '{name}' is registered more than once"
            )));
        }
        self.providers.insert(name, provider);
        Ok(())
    }

    /// Builder form of [`register_provider`](Self::register_provider)
    pub fn with_provider(
        mut self,
        name: impl Into<String>,
        provider: Arc<dyn ExportQueryProvider>,
    ) -> Result<Self> {
        self.register_provider(name, provider)?;
        Ok(self)
    }

    /// Register a named enum class and its literals
    pub fn register_enum_type(
        &mut self,
        name: impl Into<String>,
        literals: Vec<String>,
    ) -> Result<()> {
        let name = name.into();
        if literals.is_empty() {
            return Err(ExportError::Configuration(format!(
                "Enum type '{name}' has no values"
            )));
        }
        if self.enum_types.contains_key(&name) {
            return Err(ExportError::Configuration(format!(
                "Enum type '{name}' is registered more than once"
            )));
        }
        self.enum_types.insert(name, literals);
        Ok(())
    }

    pub fn with_enum_type(
        mut self,
        name: impl Into<String>,
        literals: Vec<String>,
    ) -> Result<Self> {
        self.register_enum_type(name, literals)?;
        Ok(self)
    }

    pub fn provider(&self, name: &str) -> Option<&Arc<dyn ExportQueryProvider>> {
        self.providers.get(name)
    }

    pub fn enum_type(&self, name: &str) -> Option<&[String]> {
        self.enum_types.get(name).map(Vec::as_slice)
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

impl fmt::Debug for ExportPlugins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportPlugins")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("enum_types", &self.enum_types)
            .finish()
    }
}
