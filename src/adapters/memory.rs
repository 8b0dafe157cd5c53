//! In-memory provider
//!
//! Serves a fixed list of rows. Useful for embedding the engine and for
//! tests that exercise the full export path without a database.

use crate::adapters::provider::ExportQueryProvider;
use crate::core::stream::{BoxedRow, RowStream};
use crate::domain::{CellValue, Result, RowSchema, SchemaRow, ValidatedExportRequest};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

/// Provider backed by rows held in memory
#[derive(Debug, Clone)]
pub struct StaticRowsProvider {
    schema: Arc<RowSchema>,
    rows: Arc<Vec<Vec<CellValue>>>,
}

impl StaticRowsProvider {
    /// Each inner vector holds one row's values in schema order
    pub fn new(schema: RowSchema, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            schema: Arc::new(schema),
            rows: Arc::new(rows),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl ExportQueryProvider for StaticRowsProvider {
    fn row_schema(&self) -> &RowSchema {
        &self.schema
    }

    async fn open(&self, request: &ValidatedExportRequest) -> Result<RowStream> {
        tracing::debug!(
            export_key = %request.export_key(),
            rows = self.rows.len(),
            "Serving rows from memory"
        );

        let schema = self.schema.clone();
        let rows = self.rows.clone();
        let stream = futures::stream::iter(0..rows.len()).map(move |idx| {
            SchemaRow::new(schema.clone(), rows[idx].clone()).map(|row| Box::new(row) as BoxedRow)
        });
        Ok(RowStream::new(stream.boxed()))
    }
}
