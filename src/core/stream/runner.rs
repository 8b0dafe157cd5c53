//! Transactional stream runner
//!
//! Wraps row production in a read-only unit of work. The unit of work is
//! never committed: it only exists to hold a consistent read view while the
//! provider's sequence is drained, and it is always rolled back on exit.

use crate::core::stream::rows::RowStream;
use crate::domain::{ExportRow, Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Receives rows one at a time, in production order
#[async_trait]
pub trait RowConsumer: Send {
    async fn accept(&mut self, row: &dyn ExportRow) -> Result<()>;
}

/// Read-only unit of work opened by a [`TransactionManager`]
#[async_trait]
pub trait ReadOnlyTransaction: Send {
    /// End the unit of work without committing anything
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Capability to begin bounded, read-only units of work
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin_read_only(&self) -> Result<Box<dyn ReadOnlyTransaction>>;
}

/// Transaction manager for providers that scope their own resources
///
/// The database-backed providers open their read-only transaction on the
/// connection that holds the cursor, so at the engine level the unit of work
/// only marks the boundaries in the logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransactionManager;

struct NoopTransaction;

#[async_trait]
impl ReadOnlyTransaction for NoopTransaction {
    async fn rollback(self: Box<Self>) -> Result<()> {
        tracing::trace!("Read-only unit of work closed");
        Ok(())
    }
}

#[async_trait]
impl TransactionManager for NoopTransactionManager {
    async fn begin_read_only(&self) -> Result<Box<dyn ReadOnlyTransaction>> {
        tracing::trace!("Read-only unit of work opened");
        Ok(Box::new(NoopTransaction))
    }
}

/// Runs a provider's row sequence inside a read-only unit of work
#[derive(Clone)]
pub struct TransactionalStreamRunner {
    transactions: Arc<dyn TransactionManager>,
}

impl TransactionalStreamRunner {
    pub fn new(transactions: Arc<dyn TransactionManager>) -> Self {
        Self { transactions }
    }

    /// Drain the stream produced by `open` into `consumer`
    ///
    /// The stream's resource is released on every exit path before the unit
    /// of work ends: normal exhaustion, a consumer error, or a provider
    /// error. The first error encountered is returned; release and rollback
    /// failures are only surfaced when nothing failed before them.
    pub async fn run<F>(&self, open: F, consumer: &mut dyn RowConsumer) -> Result<()>
    where
        F: Future<Output = Result<RowStream>> + Send,
    {
        let transaction = self.transactions.begin_read_only().await?;

        let outcome = match open.await {
            Ok(mut rows) => {
                let drained = drain(&mut rows, consumer).await;
                let released = rows.close().await;
                if let (Err(e), Err(_)) = (&released, &drained) {
                    tracing::warn!(
                        error = %e,
                        "Failed to release row stream after an earlier error"
                    );
                }
                drained.and(released)
            }
            Err(e) => Err(e),
        };

        match transaction.rollback().await {
            Ok(()) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to roll back read-only unit of work");
                outcome.and(Err(e))
            }
        }
    }
}

impl Default for TransactionalStreamRunner {
    fn default() -> Self {
        Self::new(Arc::new(NoopTransactionManager))
    }
}

async fn drain(rows: &mut RowStream, consumer: &mut dyn RowConsumer) -> Result<()> {
    while let Some(row) = rows.next_row().await {
        let row = row?;
        consumer.accept(row.as_ref()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stream::rows::{BoxedRow, StreamResource};
    use crate::domain::{CellValue, ExportError};
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Letter(String);

    impl ExportRow for Letter {
        fn value(&self, _attribute: &str) -> Option<CellValue> {
            Some(CellValue::Text(self.0.clone()))
        }
    }

    #[derive(Default)]
    struct Collect(Vec<String>, Option<usize>);

    #[async_trait]
    impl RowConsumer for Collect {
        async fn accept(&mut self, row: &dyn ExportRow) -> Result<()> {
            if Some(self.0.len()) == self.1 {
                return Err(ExportError::Io("sink closed".to_string()));
            }
            self.0.push(row.value("v").unwrap_or(CellValue::Null).to_string());
            Ok(())
        }
    }

    struct Released(Arc<AtomicUsize>);

    #[async_trait]
    impl StreamResource for Released {
        async fn release(self: Box<Self>) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingTransactions(Arc<Mutex<Vec<&'static str>>>);

    struct RecordingTransaction(Arc<Mutex<Vec<&'static str>>>);

    #[async_trait]
    impl ReadOnlyTransaction for RecordingTransaction {
        async fn rollback(self: Box<Self>) -> Result<()> {
            self.0.lock().unwrap().push("rollback");
            Ok(())
        }
    }

    #[async_trait]
    impl TransactionManager for RecordingTransactions {
        async fn begin_read_only(&self) -> Result<Box<dyn ReadOnlyTransaction>> {
            self.0.lock().unwrap().push("begin");
            Ok(Box::new(RecordingTransaction(self.0.clone())))
        }
    }

    fn stream_of(items: Vec<Result<BoxedRow>>, released: Arc<AtomicUsize>) -> RowStream {
        RowStream::with_resource(
            futures::stream::iter(items).boxed(),
            Box::new(Released(released)),
        )
    }

    fn letter(s: &str) -> Result<BoxedRow> {
        Ok(Box::new(Letter(s.to_string())))
    }

    #[tokio::test]
    async fn test_run_drains_and_releases() {
        let released = Arc::new(AtomicUsize::new(0));
        let log = Arc::new(Mutex::new(Vec::new()));
        let runner = TransactionalStreamRunner::new(Arc::new(RecordingTransactions(log.clone())));
        let mut consumer = Collect::default();

        let rows = stream_of(vec![letter("A"), letter("B")], released.clone());
        runner
            .run(async { Ok(rows) }, &mut consumer)
            .await
            .unwrap();

        assert_eq!(consumer.0, vec!["A", "B"]);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(*log.lock().unwrap(), vec!["begin", "rollback"]);
    }

    #[tokio::test]
    async fn test_provider_error_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let runner = TransactionalStreamRunner::default();
        let mut consumer = Collect::default();

        let rows = stream_of(
            vec![
                letter("A"),
                Err(ExportError::Provider("cursor broke".to_string())),
                letter("C"),
            ],
            released.clone(),
        );
        let err = runner
            .run(async { Ok(rows) }, &mut consumer)
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Provider(_)));
        assert_eq!(consumer.0, vec!["A"]);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_consumer_error_releases_and_rolls_back() {
        let released = Arc::new(AtomicUsize::new(0));
        let log = Arc::new(Mutex::new(Vec::new()));
        let runner = TransactionalStreamRunner::new(Arc::new(RecordingTransactions(log.clone())));
        let mut consumer = Collect(Vec::new(), Some(1));

        let rows = stream_of(vec![letter("A"), letter("B")], released.clone());
        let err = runner
            .run(async { Ok(rows) }, &mut consumer)
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Io(_)));
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(*log.lock().unwrap(), vec!["begin", "rollback"]);
    }

    #[tokio::test]
    async fn test_open_failure_still_rolls_back() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let runner = TransactionalStreamRunner::new(Arc::new(RecordingTransactions(log.clone())));
        let mut consumer = Collect::default();

        let err = runner
            .run(
                async { Err(ExportError::Database("connection refused".to_string())) },
                &mut consumer,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Database(_)));
        assert_eq!(*log.lock().unwrap(), vec!["begin", "rollback"]);
    }
}
