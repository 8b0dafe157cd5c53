//! Paginated JSON API provider

pub mod convert;
pub mod provider;

pub use provider::RestQueryProvider;
