//! SQLite connection adapter backed by rusqlite

use rusqlite::params_from_iter;
use rusqlite::types::{ToSqlOutput, Value as SqliteValue, ValueRef};

use super::{Connection, Row};
use crate::{Error, Result, Value};

/// SQLite session over a database file or `:memory:`
///
/// The session is opened by [`Connection::connect`] and held until
/// [`Connection::disconnect`]; statements run in auto-commit mode.
pub struct SqliteConnection {
    database: String,
    session: Option<rusqlite::Connection>,
}

impl SqliteConnection {
    /// Create an adapter for the database at the given path, without
    /// opening a session yet
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            session: None,
        }
    }

    fn session(&mut self) -> Result<&mut rusqlite::Connection> {
        self.session
            .as_mut()
            .ok_or_else(|| Error::connection("no active database session"))
    }
}

impl Connection for SqliteConnection {
    fn connect(&mut self) -> Result<()> {
        let session = rusqlite::Connection::open(&self.database)
            .map_err(|e| Error::connection(e.to_string()))?;
        self.session = Some(session);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        match self.session.take() {
            None => Ok(()),
            Some(session) => session
                .close()
                .map_err(|(_, e)| Error::disconnection(e.to_string())),
        }
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let session = self.session()?;
        let affected = session
            .execute(sql, params_from_iter(params.iter()))
            .map_err(|e| Error::query(e.to_string()))?;
        Ok(affected as u64)
    }

    fn fetch_one(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        let session = self.session()?;
        let mut statement = session.prepare(sql).map_err(|e| Error::query(e.to_string()))?;
        let names: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mut rows = statement
            .query(params_from_iter(params.iter()))
            .map_err(|e| Error::query(e.to_string()))?;
        match rows.next().map_err(|e| Error::query(e.to_string()))? {
            Some(row) => Ok(Some(map_row(&names, row)?)),
            None => Ok(None),
        }
    }

    fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let session = self.session()?;
        let mut statement = session.prepare(sql).map_err(|e| Error::query(e.to_string()))?;
        let names: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mut rows = statement
            .query(params_from_iter(params.iter()))
            .map_err(|e| Error::query(e.to_string()))?;

        let mut fetched = Vec::new();
        while let Some(row) = rows.next().map_err(|e| Error::query(e.to_string()))? {
            fetched.push(map_row(&names, row)?);
        }
        Ok(fetched)
    }

    fn last_insert_id(&mut self) -> Result<Option<i64>> {
        let session = self.session()?;
        // SQLite rowids start at 1; zero means no insert happened yet.
        match session.last_insert_rowid() {
            0 => Ok(None),
            id => Ok(Some(id)),
        }
    }
}

fn map_row(names: &[String], row: &rusqlite::Row<'_>) -> Result<Row> {
    let mut mapped = Row::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        let value = row
            .get_ref(index)
            .map_err(|e| Error::query(e.to_string()))?;
        mapped.insert(name.clone(), column_value(value));
    }
    Ok(mapped)
}

fn column_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::I64(i),
        ValueRef::Real(f) => Value::F64(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let out = match self {
            Value::Null => ToSqlOutput::Owned(SqliteValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqliteValue::Integer(i64::from(*b))),
            Value::I32(i) => ToSqlOutput::Owned(SqliteValue::Integer(i64::from(*i))),
            Value::I64(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            Value::F32(f) => ToSqlOutput::Owned(SqliteValue::Real(f64::from(*f))),
            Value::F64(f) => ToSqlOutput::Owned(SqliteValue::Real(*f)),
            Value::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Json(j) => ToSqlOutput::Owned(SqliteValue::Text(j.to_string())),
        };
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_backed() -> (tempfile::TempDir, SqliteConnection) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let connection = SqliteConnection::new(path.to_str().unwrap());
        (dir, connection)
    }

    #[test]
    fn test_execute_without_session_fails() {
        let (_dir, mut connection) = file_backed();
        let result = connection.execute("SELECT 1", &[]);
        assert!(matches!(result, Err(Error::Connection { .. })));
    }

    #[test]
    fn test_disconnect_when_never_connected_is_noop() {
        let (_dir, mut connection) = file_backed();
        assert!(connection.disconnect().is_ok());
    }

    #[test]
    fn test_execute_fetch_round_trip() {
        let (_dir, mut connection) = file_backed();
        connection.connect().unwrap();
        connection
            .execute(
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER)",
                &[],
            )
            .unwrap();
        connection
            .execute(
                "INSERT INTO users (name, age) VALUES (?, ?)",
                &[Value::from("Ann"), Value::from(30i64)],
            )
            .unwrap();

        let rows = connection.fetch_all("SELECT * FROM users", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&Value::String("Ann".to_string())));
        assert_eq!(rows[0].get("age"), Some(&Value::I64(30)));
        assert_eq!(rows[0].get("id"), Some(&Value::I64(1)));

        connection.disconnect().unwrap();
    }

    #[test]
    fn test_last_insert_id() {
        let (_dir, mut connection) = file_backed();
        connection.connect().unwrap();
        assert_eq!(connection.last_insert_id().unwrap(), None);

        connection
            .execute("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)", &[])
            .unwrap();
        connection
            .execute("INSERT INTO notes (body) VALUES (?)", &[Value::from("first")])
            .unwrap();
        assert_eq!(connection.last_insert_id().unwrap(), Some(1));
        connection.disconnect().unwrap();
    }

    #[test]
    fn test_fetch_one_absence_is_none() {
        let (_dir, mut connection) = file_backed();
        connection.connect().unwrap();
        connection
            .execute("CREATE TABLE empty_table (id INTEGER PRIMARY KEY)", &[])
            .unwrap();
        let row = connection
            .fetch_one("SELECT * FROM empty_table WHERE id = ?", &[Value::from(1i64)])
            .unwrap();
        assert!(row.is_none());
        connection.disconnect().unwrap();
    }

    #[test]
    fn test_query_error_passes_engine_message_through() {
        let (_dir, mut connection) = file_backed();
        connection.connect().unwrap();
        let result = connection.fetch_all("SELECT * FROM missing_table", &[]);
        match result {
            Err(Error::Query { message }) => assert!(message.contains("missing_table")),
            other => panic!("expected query error, got {other:?}"),
        }
        connection.disconnect().unwrap();
    }

    #[test]
    fn test_null_round_trip() {
        let (_dir, mut connection) = file_backed();
        connection.connect().unwrap();
        connection
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)", &[])
            .unwrap();
        connection
            .execute("INSERT INTO t (v) VALUES (?)", &[Value::Null])
            .unwrap();
        let row = connection.fetch_one("SELECT v FROM t", &[]).unwrap().unwrap();
        assert_eq!(row.get("v"), Some(&Value::Null));
        connection.disconnect().unwrap();
    }
}
