//! Streaming CSV writer
//!
//! Rows are serialized and written to the sink one at a time as the producer
//! yields them; nothing beyond the current record is buffered. Records are
//! encoded with the `csv` crate into a reusable line buffer, quoting a field
//! only when it holds a comma, double quote, CR or LF. The sink is flushed
//! once after the producer is exhausted, and best-effort on failure so that
//! rows already written reach the caller.

use crate::core::csv::columns::resolve_columns;
use crate::core::csv::format::format_cell;
use crate::core::stream::{RowConsumer, RowStream};
use crate::domain::{ExportColumn, ExportError, ExportRow, Result, RowSchema};
use async_trait::async_trait;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use tokio::io::{AsyncWrite, AsyncWriteExt};

const RECORD_BUFFER_CAPACITY: usize = 1024;

/// Pushes rows into a consumer
#[async_trait]
pub trait RowProducer: Send {
    async fn produce(&mut self, consumer: &mut dyn RowConsumer) -> Result<()>;
}

/// Producer that drains an already opened [`RowStream`]
pub struct StreamProducer(Option<RowStream>);

impl StreamProducer {
    pub fn new(rows: RowStream) -> Self {
        Self(Some(rows))
    }
}

#[async_trait]
impl RowProducer for StreamProducer {
    async fn produce(&mut self, consumer: &mut dyn RowConsumer) -> Result<()> {
        let Some(mut rows) = self.0.take() else {
            return Err(ExportError::Provider(
                "Row stream has already been consumed".to_string(),
            ));
        };

        let mut drained = Ok(());
        while let Some(row) = rows.next_row().await {
            drained = match row {
                Ok(row) => consumer.accept(row.as_ref()).await,
                Err(e) => Err(e),
            };
            if drained.is_err() {
                break;
            }
        }
        drained.and(rows.close().await)
    }
}

/// Writes header and data lines for one export
pub struct CsvRowWriter<'w, W> {
    sink: &'w mut W,
    columns: Vec<ExportColumn>,
    encoder: WriterBuilder,
    cells: Vec<String>,
    line: Vec<u8>,
    rows_written: u64,
}

impl<'w, W> CsvRowWriter<'w, W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Create a writer, resolving `columns` against the row schema
    pub fn new(sink: &'w mut W, schema: &RowSchema, columns: &[ExportColumn]) -> Result<Self> {
        let columns = resolve_columns(schema, columns)?;
        let mut encoder = WriterBuilder::new();
        encoder
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .buffer_capacity(RECORD_BUFFER_CAPACITY);

        Ok(Self {
            sink,
            cells: Vec::with_capacity(columns.len()),
            columns,
            encoder,
            line: Vec::new(),
            rows_written: 0,
        })
    }

    /// Effective columns in output order
    pub fn columns(&self) -> &[ExportColumn] {
        &self.columns
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub async fn write_header(&mut self) -> Result<()> {
        self.cells.clear();
        self.cells.extend(self.columns.iter().map(|c| c.header().to_string()));
        self.write_record().await
    }

    pub async fn write_row(&mut self, row: &dyn ExportRow) -> Result<()> {
        self.cells.clear();
        for column in &self.columns {
            let value = row.value(column.key()).ok_or_else(|| {
                ExportError::Provider(format!(
                    "Row does not expose attribute '{}'",
                    column.key()
                ))
            })?;
            self.cells.push(format_cell(&value, column.format())?);
        }
        self.write_record().await?;
        self.rows_written += 1;
        Ok(())
    }

    /// Final flush; returns the number of data lines written
    pub async fn finish(self) -> Result<u64> {
        self.sink.flush().await?;
        Ok(self.rows_written)
    }

    /// Encode the current cells as one record and hand it to the sink
    async fn write_record(&mut self) -> Result<()> {
        self.line.clear();
        {
            let mut record = self.encoder.from_writer(&mut self.line);
            record.write_record(&self.cells)?;
            record.flush()?;
        }
        self.sink.write_all(&self.line).await?;
        Ok(())
    }

    async fn flush_quietly(&mut self) {
        if let Err(e) = self.sink.flush().await {
            tracing::debug!(error = %e, "Flush after failed export did not complete");
        }
    }
}

#[async_trait]
impl<W> RowConsumer for CsvRowWriter<'_, W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn accept(&mut self, row: &dyn ExportRow) -> Result<()> {
        self.write_row(row).await
    }
}

/// Write a complete CSV document: header, then every produced row
///
/// Returns the number of data lines written. On failure, lines already
/// written stay in the sink.
pub async fn write_all<W>(
    sink: &mut W,
    schema: &RowSchema,
    columns: &[ExportColumn],
    producer: &mut dyn RowProducer,
) -> Result<u64>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut writer = CsvRowWriter::new(sink, schema, columns)?;
    writer.write_header().await?;

    match producer.produce(&mut writer).await {
        Ok(()) => writer.finish().await,
        Err(e) => {
            writer.flush_quietly().await;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stream::BoxedRow;
    use crate::domain::{AttributeKind, CellValue, RowAttribute, SchemaRow};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use test_case::test_case;

    fn schema() -> Arc<RowSchema> {
        Arc::new(
            RowSchema::new(
                "ClaimRow",
                vec![
                    RowAttribute::new("submissionId", AttributeKind::Text),
                    RowAttribute::new("note", AttributeKind::Text),
                    RowAttribute::new("submitted", AttributeKind::Date),
                ],
            )
            .unwrap(),
        )
    }

    fn row(id: &str, note: Option<&str>, day: u32) -> BoxedRow {
        Box::new(
            SchemaRow::new(
                schema(),
                vec![
                    CellValue::from(id),
                    CellValue::from(note),
                    CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, day).unwrap()),
                ],
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_write_all_with_explicit_columns() {
        let columns = vec![
            ExportColumn::new("submissionId", Some("Submission Id".into()), None),
            ExportColumn::new("note", Some("Note, free text".into()), None),
            ExportColumn::new("submitted", Some("Submitted".into()), Some("%d/%m/%Y".into())),
        ];
        let mut producer = StreamProducer::new(RowStream::from_rows(vec![
            row("A", Some("plain"), 1),
            row("B", Some("has,comma"), 2),
            row("C", None, 3),
        ]));
        let mut out: Vec<u8> = Vec::new();

        let written = write_all(&mut out, &schema(), &columns, &mut producer)
            .await
            .unwrap();

        assert_eq!(written, 3);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Submission Id,\"Note, free text\",Submitted\n\
             A,plain,01/03/2024\n\
             B,\"has,comma\",02/03/2024\n\
             C,,03/03/2024\n"
        );
    }

    #[tokio::test]
    async fn test_write_all_without_columns_uses_schema() {
        let mut producer = StreamProducer::new(RowStream::from_rows(vec![row("A", None, 9)]));
        let mut out: Vec<u8> = Vec::new();

        write_all(&mut out, &schema(), &[], &mut producer)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "submissionId,note,submitted\nA,,2024-03-09\n"
        );
    }

    #[tokio::test]
    async fn test_empty_stream_writes_header_only() {
        let mut producer = StreamProducer::new(RowStream::from_rows(Vec::new()));
        let mut out: Vec<u8> = Vec::new();

        let written = write_all(&mut out, &schema(), &[], &mut producer)
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "submissionId,note,submitted\n"
        );
    }

    #[tokio::test]
    async fn test_producer_error_keeps_written_rows() {
        let rows = futures::stream::iter(vec![
            Ok(row("A", None, 1)),
            Err(ExportError::Provider("page 2 failed".into())),
        ]);
        let mut producer = StreamProducer::new(RowStream::new(Box::pin(rows)));
        let mut out: Vec<u8> = Vec::new();

        let err = write_all(&mut out, &schema(), &[], &mut producer)
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Provider(_)));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "submissionId,note,submitted\nA,,2024-03-01\n"
        );
    }

    async fn render(cells: [&str; 2]) -> String {
        let schema = Arc::new(
            RowSchema::new(
                "NoteRow",
                vec![
                    RowAttribute::new("title", AttributeKind::Text),
                    RowAttribute::new("body", AttributeKind::Text),
                ],
            )
            .unwrap(),
        );
        let row = SchemaRow::new(
            schema.clone(),
            cells.iter().map(|c| CellValue::from(*c)).collect(),
        )
        .unwrap();
        let mut producer = StreamProducer::new(RowStream::from_rows(vec![Box::new(row)]));
        let mut out: Vec<u8> = Vec::new();
        write_all(&mut out, &schema, &[], &mut producer)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test_case("plain", "plain"; "plain text")]
    #[test_case("", ""; "empty")]
    #[test_case("a,b", "\"a,b\""; "comma")]
    #[test_case("a\"b", "\"a\"\"b\""; "quote")]
    #[test_case("line\nbreak", "\"line\nbreak\""; "line feed")]
    #[test_case("cr\rhere", "\"cr\rhere\""; "carriage return")]
    #[test_case(" spaced ", " spaced "; "spaces untouched")]
    #[tokio::test]
    async fn test_cells_quoted_only_when_needed(cell: &str, expected: &str) {
        let out = render([cell, "x"]).await;
        assert_eq!(out, format!("title,body\n{expected},x\n"));
    }

    #[tokio::test]
    async fn test_lone_empty_field_is_quoted() {
        let mut producer = StreamProducer::new(RowStream::from_rows(vec![row("", None, 1)]));
        let mut out: Vec<u8> = Vec::new();
        let columns = [ExportColumn::plain("note")];

        write_all(&mut out, &schema(), &columns, &mut producer)
            .await
            .unwrap();

        // A bare empty line would read back as no record at all
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("note\n\"\"\n"), "{text}");
    }

    #[tokio::test]
    async fn test_unknown_column_fails_before_header() {
        let mut producer = StreamProducer::new(RowStream::from_rows(Vec::new()));
        let mut out: Vec<u8> = Vec::new();

        let result = write_all(
            &mut out,
            &schema(),
            &[ExportColumn::plain("missing")],
            &mut producer,
        )
        .await;

        assert!(result.is_err());
        assert!(out.is_empty());
    }
}
