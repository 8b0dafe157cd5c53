//! CSV serialization
//!
//! - [`resolve_columns`] - effective column layout for a row type
//! - [`format_cell`] / [`validate_pattern`] - value rendering
//! - [`write_all`] / [`CsvRowWriter`] - streaming writer

pub mod columns;
pub mod format;
pub mod writer;

pub use columns::resolve_columns;
pub use format::{format_cell, validate_pattern};
pub use writer::{write_all, CsvRowWriter, RowProducer, StreamProducer};
