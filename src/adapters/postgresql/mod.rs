//! PostgreSQL streaming provider
//!
//! [`PostgreSQLClient`] owns the connection pool shared by every `postgres`
//! provider; [`PostgresQueryProvider`] runs one configured query per export
//! inside a read-only transaction.

pub mod client;
pub mod provider;

pub use client::PostgreSQLClient;
pub use provider::PostgresQueryProvider;
