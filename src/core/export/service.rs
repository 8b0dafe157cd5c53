//! Export service: the orchestrator behind every CSV export
//!
//! One call to [`ExportService::stream_csv`] runs one export end to end:
//! definition lookup, security gate, parameter validation, then the provider
//! stream drained through the row limit into the CSV writer, and finally
//! exactly one audit event for anything that got past validation.

use crate::adapters::provider::ExportQueryProvider;
use crate::core::csv::{write_all, RowProducer};
use crate::core::export::audit::{AuditOutcome, ExportAuditEvent, ExportAuditSink};
use crate::core::registry::ExportDefinitionRegistry;
use crate::core::security::ExportSecurity;
use crate::core::stream::{RowConsumer, TransactionalStreamRunner};
use crate::core::validation::RequestValidator;
use crate::domain::{
    ExportDefinition, ExportError, ExportRow, RawParams, Result, ValidatedExportRequest,
};
use crate::{log_export_complete, log_export_failed, log_export_rejected, log_export_start};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWrite;

/// Streams validated, row-limited, audited CSV exports
pub struct ExportService {
    registry: Arc<ExportDefinitionRegistry>,
    security: Arc<dyn ExportSecurity>,
    validator: RequestValidator,
    runner: TransactionalStreamRunner,
    audit: Arc<dyn ExportAuditSink>,
}

impl ExportService {
    pub fn new(
        registry: Arc<ExportDefinitionRegistry>,
        security: Arc<dyn ExportSecurity>,
        audit: Arc<dyn ExportAuditSink>,
    ) -> Self {
        Self {
            registry,
            security,
            validator: RequestValidator::new(),
            runner: TransactionalStreamRunner::default(),
            audit,
        }
    }

    /// Replace the runner, e.g. to supply a real transaction manager
    pub fn with_runner(mut self, runner: TransactionalStreamRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn registry(&self) -> &ExportDefinitionRegistry {
        &self.registry
    }

    /// Stream the export `export_key` as CSV into `sink`
    ///
    /// Returns the number of data rows written.
    ///
    /// Not-found, access-denied and validation errors are returned before
    /// any output is produced and are not audited. Every later failure
    /// (unknown provider, provider error, write error, row limit) is
    /// audited with the rows emitted so far and then returned unchanged.
    /// In that case the sink may already hold a header and some rows.
    #[tracing::instrument(
        name = "stream_csv",
        skip(self, raw, sink),
        fields(export_key = %export_key)
    )]
    pub async fn stream_csv<W>(
        &self,
        export_key: &str,
        raw: &RawParams,
        sink: &mut W,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let (definition, request) = match self.admit(export_key, raw) {
            Ok(admitted) => admitted,
            Err(e) => {
                log_export_rejected!(export_key, &e);
                return Err(e);
            }
        };

        log_export_start!(definition.key(), request.max_rows());
        let started_at = Utc::now();
        let timer = Instant::now();
        let mut row_count = 0u64;

        let result = self
            .execute(&definition, &request, sink, &mut row_count)
            .await;
        let duration = timer.elapsed();

        let outcome = match &result {
            Ok(()) => {
                log_export_complete!(definition.key(), row_count, duration);
                AuditOutcome::Success
            }
            Err(e) => {
                log_export_failed!(definition.key(), row_count, duration, e);
                AuditOutcome::failure(e)
            }
        };

        self.record(ExportAuditEvent {
            export_key: definition.key().clone(),
            request,
            row_count,
            started_at,
            duration,
            outcome,
        });

        result.map(|()| row_count)
    }

    fn admit(
        &self,
        export_key: &str,
        raw: &RawParams,
    ) -> Result<(Arc<ExportDefinition>, ValidatedExportRequest)> {
        let definition = self.registry.get_required(export_key)?;
        self.security.check_allowed(&definition)?;
        let request = self.validator.validate(&definition, raw)?;
        Ok((definition, request))
    }

    async fn execute<W>(
        &self,
        definition: &ExportDefinition,
        request: &ValidatedExportRequest,
        sink: &mut W,
        row_count: &mut u64,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let provider = self.registry.get_provider(definition.key().as_str())?;
        let mut producer = LimitedProducer {
            runner: &self.runner,
            provider: provider.as_ref(),
            request,
            row_count,
        };
        write_all(sink, provider.row_schema(), definition.columns(), &mut producer).await?;
        Ok(())
    }

    fn record(&self, event: ExportAuditEvent) {
        if let Err(e) = self.audit.record(&event) {
            tracing::warn!(
                export_key = %event.export_key,
                error = %e,
                "Failed to record export audit event"
            );
        }
    }
}

/// Feeds provider rows through the row limit inside the stream runner
struct LimitedProducer<'a> {
    runner: &'a TransactionalStreamRunner,
    provider: &'a dyn ExportQueryProvider,
    request: &'a ValidatedExportRequest,
    row_count: &'a mut u64,
}

#[async_trait]
impl RowProducer for LimitedProducer<'_> {
    async fn produce(&mut self, consumer: &mut dyn RowConsumer) -> Result<()> {
        let mut limited = RowLimit {
            inner: consumer,
            count: &mut *self.row_count,
            max_rows: self.request.max_rows(),
            export_key: self.request.export_key().as_str(),
        };
        self.runner
            .run(self.provider.open(self.request), &mut limited)
            .await
    }
}

/// Counts rows and refuses the first one past the ceiling
struct RowLimit<'a> {
    inner: &'a mut dyn RowConsumer,
    count: &'a mut u64,
    max_rows: u64,
    export_key: &'a str,
}

#[async_trait]
impl RowConsumer for RowLimit<'_> {
    async fn accept(&mut self, row: &dyn ExportRow) -> Result<()> {
        let next = *self.count + 1;
        if next > self.max_rows {
            return Err(ExportError::RowLimitExceeded {
                export_key: self.export_key.to_string(),
                max_rows: self.max_rows,
            });
        }
        *self.count = next;
        self.inner.accept(row).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::StaticRowsProvider;
    use crate::adapters::provider::ExportPlugins;
    use crate::config::{ColumnConfig, ExportDefinitionConfig, ParamConfig};
    use crate::core::export::audit::MemoryAuditSink;
    use crate::core::security::PermitAllSecurity;
    use crate::domain::{AttributeKind, CellValue, RowAttribute, RowSchema};

    fn service(rows: &[&str], max_rows: u64) -> (ExportService, Arc<MemoryAuditSink>) {
        let schema = RowSchema::new(
            "ClaimRow",
            vec![RowAttribute::new("submissionId", AttributeKind::Text)],
        )
        .unwrap();
        let provider = StaticRowsProvider::new(
            schema,
            rows.iter().map(|r| vec![CellValue::from(*r)]).collect(),
        );
        let plugins = ExportPlugins::new()
            .with_provider("claims_db", Arc::new(provider))
            .unwrap();
        let entry = ExportDefinitionConfig {
            key: "claims".into(),
            description: String::new(),
            allowed_roles: Vec::new(),
            max_rows: Some(max_rows),
            provider: Some("claims_db".into()),
            columns: vec![ColumnConfig {
                key: "submissionId".into(),
                header: Some("Submission Id".into()),
                format: None,
            }],
            params: vec![ParamConfig {
                name: "limit".into(),
                param_type: "INT".into(),
                required: false,
                default: None,
                enum_class: None,
                allowed_values: Vec::new(),
            }],
        };
        let registry = ExportDefinitionRegistry::build(&[entry], 100, &plugins).unwrap();
        let audit = Arc::new(MemoryAuditSink::new());
        let service =
            ExportService::new(Arc::new(registry), Arc::new(PermitAllSecurity), audit.clone());
        (service, audit)
    }

    #[tokio::test]
    async fn test_rows_within_limit() {
        let (service, audit) = service(&["A", "B"], 2);
        let mut out = Vec::new();

        let rows = service
            .stream_csv("claims", &RawParams::new(), &mut out)
            .await
            .unwrap();

        assert_eq!(rows, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "Submission Id\nA\nB\n");
        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].outcome.is_success());
        assert_eq!(events[0].row_count, 2);
    }

    #[tokio::test]
    async fn test_row_limit_truncates_and_audits() {
        let (service, audit) = service(&["A", "B", "C"], 2);
        let mut out = Vec::new();

        let err = service
            .stream_csv("claims", &RawParams::new(), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::RowLimitExceeded { max_rows: 2, .. }));
        assert_eq!(String::from_utf8(out).unwrap(), "Submission Id\nA\nB\n");
        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].row_count, 2);
        assert!(matches!(
            events[0].outcome,
            AuditOutcome::Failure { ref kind, .. } if kind == "row_limit_exceeded"
        ));
    }

    #[tokio::test]
    async fn test_rejections_are_not_audited() {
        let (service, audit) = service(&["A"], 2);
        let mut out = Vec::new();

        let not_found = service
            .stream_csv("unknown", &RawParams::new(), &mut out)
            .await;
        assert!(matches!(not_found, Err(ExportError::DefinitionNotFound(_))));

        let raw: RawParams = [("limit", "many")].into_iter().collect();
        let invalid = service.stream_csv("claims", &raw, &mut out).await;
        assert!(matches!(invalid, Err(ExportError::Validation { .. })));

        assert!(out.is_empty());
        assert!(audit.is_empty());
    }
}
