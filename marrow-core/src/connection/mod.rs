//! Database connection interface and adapter factory
//!
//! The repository layer talks to the database exclusively through the
//! [`Connection`] trait: a synchronous, blocking, session-scoped
//! capability interface. Adapters own the engine-specific details.

pub mod sqlite;

use std::collections::HashMap;

use crate::{DatabaseConfig, Engine, Error, Result, Value};

/// A fetched row: column name to value
pub type Row = HashMap<String, Value>;

/// Capability interface for one database session
///
/// Calls block until the engine responds. `execute` auto-commits; no
/// transaction spans more than one statement. Absence of a row is a
/// normal return value, never an error.
pub trait Connection {
    /// Establish the underlying session
    fn connect(&mut self) -> Result<()>;

    /// Release the session. Must be a no-op when never connected.
    fn disconnect(&mut self) -> Result<()>;

    /// Run a mutating statement and return the number of affected rows
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Fetch the first matching row, or `None` when nothing matches
    fn fetch_one(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>>;

    /// Fetch every matching row
    fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// The identifier the engine assigned to the most recent INSERT in
    /// this session, if any
    fn last_insert_id(&mut self) -> Result<Option<i64>>;
}

/// Resolve a configuration to a connection adapter
///
/// Fails with an unsupported configuration error when the named engine
/// has no adapter, so misconfiguration surfaces at registration time
/// rather than on first use.
pub fn open(config: &DatabaseConfig) -> Result<Box<dyn Connection>> {
    match config.engine {
        Engine::Sqlite => Ok(Box::new(sqlite::SqliteConnection::new(&config.database))),
        other => Err(Error::unsupported_configuration(format!(
            "no connection adapter for engine '{other}'"
        ))),
    }
}
