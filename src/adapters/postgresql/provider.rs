//! Streaming SQL query provider
//!
//! Each export takes a pooled connection, opens a `READ ONLY` transaction
//! and streams the configured query with `query_raw`, so rows reach the CSV
//! writer as the server produces them. The connection stays checked out
//! until the stream is closed, which rolls the transaction back and returns
//! the connection to the pool.

use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::provider::ExportQueryProvider;
use crate::config::PostgresProviderConfig;
use crate::core::stream::{BoxedRow, RowStream, StreamResource};
use crate::domain::{
    AttributeKind, CellValue, ExportError, ParamValue, Result, RowAttribute, RowSchema, SchemaRow,
    ValidatedExportRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use deadpool_postgres::Object;
use futures::StreamExt;
use std::sync::Arc;
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, Row};
use uuid::Uuid;

type BoxedParam = Box<dyn ToSql + Sync + Send>;

/// Provider running one SQL query per export
pub struct PostgresQueryProvider {
    name: String,
    client: Arc<PostgreSQLClient>,
    query: String,
    bind: Vec<String>,
    schema: Arc<RowSchema>,
}

impl PostgresQueryProvider {
    pub fn new(
        client: Arc<PostgreSQLClient>,
        config: &PostgresProviderConfig,
        schema: Arc<RowSchema>,
    ) -> Self {
        Self {
            name: config.name.clone(),
            client,
            query: config.query.clone(),
            bind: config.bind.clone(),
            schema,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the query inside the already-open transaction
    async fn start(
        &self,
        client: &Client,
        request: &ValidatedExportRequest,
    ) -> Result<tokio_postgres::RowStream> {
        let timeout_ms = self.client.statement_timeout().as_millis();
        if timeout_ms > 0 {
            client
                .batch_execute(&format!("SET LOCAL statement_timeout = {timeout_ms}"))
                .await
                .map_err(|e| {
                    ExportError::Database(format!("Failed to set statement timeout: {e}"))
                })?;
        }

        let statement = client.prepare(&self.query).await.map_err(|e| {
            ExportError::Database(format!(
                "Failed to prepare query for provider '{}': {e}",
                self.name
            ))
        })?;

        if statement.params().len() != self.bind.len() {
            return Err(ExportError::Configuration(format!(
                "Provider '{}' binds {} parameters but its query has {} placeholders",
                self.name,
                self.bind.len(),
                statement.params().len()
            )));
        }

        let params: Vec<BoxedParam> = self
            .bind
            .iter()
            .zip(statement.params())
            .map(|(name, ty)| bind_value(request.get(name), ty))
            .collect();

        client
            .query_raw(
                &statement,
                params.iter().map(|p| p.as_ref() as &(dyn ToSql + Sync)),
            )
            .await
            .map_err(|e| {
                ExportError::Database(format!("Query failed for provider '{}': {e}", self.name))
            })
    }
}

#[async_trait]
impl ExportQueryProvider for PostgresQueryProvider {
    fn row_schema(&self) -> &RowSchema {
        &self.schema
    }

    fn bound_parameters(&self) -> &[String] {
        &self.bind
    }

    async fn open(&self, request: &ValidatedExportRequest) -> Result<RowStream> {
        let connection = self.client.get_connection().await?;
        connection
            .batch_execute("BEGIN READ ONLY")
            .await
            .map_err(|e| {
                ExportError::Database(format!("Failed to begin read-only transaction: {e}"))
            })?;
        let transaction = ReadOnlyTransaction { connection };

        let rows = match self.start(&transaction.connection, request).await {
            Ok(rows) => rows,
            Err(e) => {
                if let Err(release_error) = Box::new(transaction).release().await {
                    tracing::warn!(
                        provider = %self.name,
                        error = %release_error,
                        "Rollback after failed query also failed"
                    );
                }
                return Err(e);
            }
        };

        tracing::debug!(
            provider = %self.name,
            export_key = %request.export_key(),
            "Query stream opened"
        );

        let schema = self.schema.clone();
        let rows = rows.map(move |row| {
            let row = row.map_err(|e| ExportError::Database(format!("Failed to read row: {e}")))?;
            convert_row(&schema, &row).map(|row| Box::new(row) as BoxedRow)
        });

        Ok(RowStream::with_resource(rows.boxed(), Box::new(transaction)))
    }
}

/// Pooled connection holding the export's read-only transaction
struct ReadOnlyTransaction {
    connection: Object,
}

#[async_trait]
impl StreamResource for ReadOnlyTransaction {
    async fn release(self: Box<Self>) -> Result<()> {
        self.connection
            .batch_execute("ROLLBACK")
            .await
            .map_err(|e| {
                ExportError::Database(format!("Failed to roll back export transaction: {e}"))
            })
    }
}

/// Typed parameter for a placeholder; unset values become a NULL of the
/// placeholder's type
fn bind_value(value: Option<&ParamValue>, ty: &Type) -> BoxedParam {
    match value {
        Some(ParamValue::String(s)) | Some(ParamValue::Enum(s)) => Box::new(s.clone()),
        Some(ParamValue::Uuid(v)) => Box::new(*v),
        Some(ParamValue::Int(v)) if *ty == Type::INT8 => Box::new(i64::from(*v)),
        Some(ParamValue::Int(v)) => Box::new(*v),
        Some(ParamValue::Long(v)) => Box::new(*v),
        Some(ParamValue::Boolean(v)) => Box::new(*v),
        Some(ParamValue::Date(v)) => Box::new(*v),
        None => typed_null(ty),
    }
}

fn typed_null(ty: &Type) -> BoxedParam {
    if *ty == Type::DATE {
        Box::new(None::<NaiveDate>)
    } else if *ty == Type::INT2 {
        Box::new(None::<i16>)
    } else if *ty == Type::INT4 {
        Box::new(None::<i32>)
    } else if *ty == Type::INT8 {
        Box::new(None::<i64>)
    } else if *ty == Type::BOOL {
        Box::new(None::<bool>)
    } else if *ty == Type::UUID {
        Box::new(None::<Uuid>)
    } else if *ty == Type::TIMESTAMP {
        Box::new(None::<NaiveDateTime>)
    } else if *ty == Type::TIMESTAMPTZ {
        Box::new(None::<DateTime<Utc>>)
    } else {
        Box::new(None::<String>)
    }
}

fn convert_row(schema: &Arc<RowSchema>, row: &Row) -> Result<SchemaRow> {
    let values = schema
        .attributes()
        .iter()
        .map(|attribute| read_cell(row, attribute))
        .collect::<Result<Vec<_>>>()?;
    SchemaRow::new(schema.clone(), values)
}

fn read_cell(row: &Row, attribute: &RowAttribute) -> Result<CellValue> {
    let idx = row
        .columns()
        .iter()
        .position(|c| c.name() == attribute.name)
        .ok_or_else(|| {
            ExportError::Provider(format!("Query result has no column '{}'", attribute.name))
        })?;
    let ty = row.columns()[idx].type_();

    let cell = match attribute.kind {
        AttributeKind::Text => {
            get::<String>(row, idx, attribute)?.map_or(CellValue::Null, CellValue::Text)
        }
        AttributeKind::Integer => {
            let value = if *ty == Type::INT2 {
                get::<i16>(row, idx, attribute)?.map(i64::from)
            } else if *ty == Type::INT4 {
                get::<i32>(row, idx, attribute)?.map(i64::from)
            } else {
                get::<i64>(row, idx, attribute)?
            };
            value.map_or(CellValue::Null, CellValue::Integer)
        }
        AttributeKind::Decimal => {
            if *ty == Type::NUMERIC {
                return Err(ExportError::Provider(format!(
                    "Column '{}' is NUMERIC; cast it to float8 or text in the query",
                    attribute.name
                )));
            }
            let value = if *ty == Type::FLOAT4 {
                get::<f32>(row, idx, attribute)?.map(f64::from)
            } else {
                get::<f64>(row, idx, attribute)?
            };
            value.map_or(CellValue::Null, CellValue::Decimal)
        }
        AttributeKind::Boolean => {
            get::<bool>(row, idx, attribute)?.map_or(CellValue::Null, CellValue::Boolean)
        }
        AttributeKind::Uuid => {
            get::<Uuid>(row, idx, attribute)?.map_or(CellValue::Null, CellValue::Uuid)
        }
        AttributeKind::Date => {
            get::<NaiveDate>(row, idx, attribute)?.map_or(CellValue::Null, CellValue::Date)
        }
        AttributeKind::DateTime => {
            get::<NaiveDateTime>(row, idx, attribute)?.map_or(CellValue::Null, CellValue::DateTime)
        }
        AttributeKind::Time => {
            get::<NaiveTime>(row, idx, attribute)?.map_or(CellValue::Null, CellValue::Time)
        }
        AttributeKind::Instant => {
            get::<DateTime<Utc>>(row, idx, attribute)?.map_or(CellValue::Null, CellValue::Instant)
        }
        AttributeKind::OffsetDateTime => get::<DateTime<FixedOffset>>(row, idx, attribute)?
            .map_or(CellValue::Null, CellValue::OffsetDateTime),
    };
    Ok(cell)
}

fn get<'a, T: FromSql<'a>>(
    row: &'a Row,
    idx: usize,
    attribute: &RowAttribute,
) -> Result<Option<T>> {
    row.try_get::<_, Option<T>>(idx).map_err(|e| {
        ExportError::Database(format!(
            "Failed to read column '{}' as {:?}: {e}",
            attribute.name, attribute.kind
        ))
    })
}
