//! Lazy row sequences with a scoped resource
//!
//! A [`RowStream`] pairs a single-pass stream of rows with the resource that
//! keeps it alive (a pooled connection holding a cursor, an HTTP client
//! session). [`RowStream::close`] releases that resource exactly once. If a
//! stream is dropped without being closed the release is spawned onto the
//! current Tokio runtime instead.

use crate::domain::{ExportRow, Result};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};

/// Boxed row as yielded by providers
pub type BoxedRow = Box<dyn ExportRow>;

/// Resource backing a row stream
#[async_trait]
pub trait StreamResource: Send {
    /// Release the resource; called at most once
    async fn release(self: Box<Self>) -> Result<()>;
}

/// Lazy, finite, single-pass sequence of rows
pub struct RowStream {
    rows: BoxStream<'static, Result<BoxedRow>>,
    resource: Option<Box<dyn StreamResource>>,
}

impl RowStream {
    /// Wrap a stream that holds no external resource
    pub fn new(rows: BoxStream<'static, Result<BoxedRow>>) -> Self {
        Self {
            rows,
            resource: None,
        }
    }

    /// Wrap a stream whose resource must be released after iteration
    pub fn with_resource(
        rows: BoxStream<'static, Result<BoxedRow>>,
        resource: Box<dyn StreamResource>,
    ) -> Self {
        Self {
            rows,
            resource: Some(resource),
        }
    }

    /// Build a stream from rows already in memory
    pub fn from_rows(rows: Vec<BoxedRow>) -> Self {
        Self::new(futures::stream::iter(rows.into_iter().map(Ok)).boxed())
    }

    /// Pull the next row
    pub async fn next_row(&mut self) -> Option<Result<BoxedRow>> {
        self.rows.next().await
    }

    /// Release the underlying resource
    ///
    /// The row stream is dropped first, so a partially read cursor never
    /// holds up the release.
    pub async fn close(mut self) -> Result<()> {
        self.rows = futures::stream::empty().boxed();
        match self.resource.take() {
            Some(resource) => resource.release().await,
            None => Ok(()),
        }
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        let Some(resource) = self.resource.take() else {
            return;
        };

        tracing::warn!("Row stream dropped without being closed, releasing in background");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = resource.release().await {
                        tracing::warn!(error = %e, "Background release of row stream failed");
                    }
                });
            }
            Err(_) => {
                tracing::error!("No runtime available to release row stream resource");
            }
        }
    }
}
