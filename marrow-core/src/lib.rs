//! Marrow Core - a minimal record-mapping layer over plain SQL
//!
//! This crate provides a fluent statement builder that renders
//! parameter-bound SQL, and a record/repository layer that maps table
//! rows to typed instances through a pluggable connection interface.

pub mod builder;
pub mod config;
pub mod connection;
pub mod error;
pub mod record;
pub mod repository;
pub mod value;

// Re-export main types
pub use builder::{FieldMap, IntoParams, Operation, SortDirection, StatementBuilder};
pub use config::{DatabaseConfig, Engine};
pub use connection::sqlite::SqliteConnection;
pub use connection::{open, Connection, Row};
pub use error::{Error, Result};
pub use record::{check_row_shape, Record};
pub use repository::{Query, Repository};
pub use value::Value;

/// Create a new statement builder for the given table
pub fn table(name: &str) -> StatementBuilder {
    StatementBuilder::new(name)
}
