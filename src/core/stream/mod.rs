//! Row streaming primitives
//!
//! - [`RowStream`] - lazy provider output with a scoped resource
//! - [`TransactionalStreamRunner`] - drains a stream inside a read-only unit of work

pub mod rows;
pub mod runner;

pub use rows::{BoxedRow, RowStream, StreamResource};
pub use runner::{
    NoopTransactionManager, ReadOnlyTransaction, RowConsumer, TransactionManager,
    TransactionalStreamRunner,
};
