//! Paginated REST provider
//!
//! Issues `GET base_url + path` with the validated parameters as query
//! string plus page and size parameters. Pages are fetched on demand as the
//! writer pulls rows; a page shorter than the page size (or empty) ends the
//! stream.

use crate::adapters::provider::ExportQueryProvider;
use crate::adapters::rest::convert::item_to_row;
use crate::config::RestProviderConfig;
use crate::core::stream::{BoxedRow, RowStream};
use crate::domain::{ExportError, Result, RowSchema, ValidatedExportRequest};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Provider reading rows from a paginated JSON API
pub struct RestQueryProvider {
    name: String,
    fetcher: PageFetcher,
    first_page: u32,
    schema: Arc<RowSchema>,
}

impl RestQueryProvider {
    /// Build the provider and its HTTP client
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Configuration`] for an invalid endpoint URL or
    /// if the HTTP client cannot be built.
    pub fn new(config: &RestProviderConfig, schema: Arc<RowSchema>) -> Result<Self> {
        let endpoint = endpoint(&config.base_url, &config.path)?;
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                ExportError::Configuration(format!(
                    "Failed to build HTTP client for provider '{}': {e}",
                    config.name
                ))
            })?;

        Ok(Self {
            name: config.name.clone(),
            fetcher: PageFetcher {
                client,
                endpoint,
                settings: Arc::new(config.clone()),
                query: Arc::new(Vec::new()),
            },
            first_page: config.first_page,
            schema,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &Url {
        &self.fetcher.endpoint
    }
}

#[async_trait]
impl ExportQueryProvider for RestQueryProvider {
    fn row_schema(&self) -> &RowSchema {
        &self.schema
    }

    async fn open(&self, request: &ValidatedExportRequest) -> Result<RowStream> {
        let query = request
            .params()
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        let fetcher = PageFetcher {
            query: Arc::new(query),
            ..self.fetcher.clone()
        };
        let page_size = fetcher.settings.page_size as usize;

        tracing::debug!(
            provider = %self.name,
            export_key = %request.export_key(),
            endpoint = %fetcher.endpoint,
            page_size,
            "Opening paginated stream"
        );

        let pages = futures::stream::try_unfold(Some(self.first_page), move |next| {
            let fetcher = fetcher.clone();
            async move {
                let Some(page) = next else {
                    return Ok::<_, ExportError>(None);
                };
                let items = fetcher.fetch(page).await?;
                let following = if items.len() < page_size {
                    None
                } else {
                    page.checked_add(1)
                };
                Ok(Some((items, following)))
            }
        });

        let schema = self.schema.clone();
        let rows = pages
            .map_ok(|items| futures::stream::iter(items.into_iter().map(Ok::<Value, ExportError>)))
            .try_flatten()
            .map(move |item| {
                item.and_then(|item| item_to_row(&schema, item))
                    .map(|row| Box::new(row) as BoxedRow)
            });

        Ok(RowStream::new(rows.boxed()))
    }
}

/// Everything needed to fetch one page
#[derive(Clone)]
struct PageFetcher {
    client: Client,
    endpoint: Url,
    settings: Arc<RestProviderConfig>,
    query: Arc<Vec<(String, String)>>,
}

impl PageFetcher {
    async fn fetch(&self, page: u32) -> Result<Vec<Value>> {
        let settings = &self.settings;
        let mut request = self
            .client
            .get(self.endpoint.clone())
            .query(self.query.as_slice())
            .query(&[
                (settings.page_param.as_str(), page.to_string()),
                (settings.size_param.as_str(), settings.page_size.to_string()),
            ]);

        if let Some(token) = &settings.bearer_token {
            request = request.bearer_auth(token.expose_secret().as_ref());
        }

        let response = request.send().await.map_err(|e| {
            ExportError::Remote(format!("GET {} page {page} failed: {e}", self.endpoint))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExportError::Remote(format!(
                "GET {} page {page} returned status {status}: {body}",
                self.endpoint
            )));
        }

        let mut body: Value = response.json().await.map_err(|e| {
            ExportError::Remote(format!("Invalid JSON from {} page {page}: {e}", self.endpoint))
        })?;

        match body.get_mut(&settings.items_field).map(Value::take) {
            Some(Value::Array(items)) => {
                tracing::trace!(page, items = items.len(), "Fetched page");
                Ok(items)
            }
            _ => Err(ExportError::Remote(format!(
                "Response from {} page {page} has no array field '{}'",
                self.endpoint, settings.items_field
            ))),
        }
    }
}

fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let path = path.trim_start_matches('/');
    let joined = if path.is_empty() {
        base_url.to_string()
    } else {
        format!("{}/{path}", base_url.trim_end_matches('/'))
    };
    Url::parse(&joined)
        .map_err(|e| ExportError::Configuration(format!("Invalid REST endpoint '{joined}': {e}")))
}
