//! Record repositories: CRUD entry points built atop the statement builder
//!
//! A repository binds one record type to one connection, resolved once at
//! construction time. Every operation follows the same connect-per-call
//! discipline: acquire the session, run, release the session on every
//! exit path.

use std::marker::PhantomData;

use tracing::debug;

use crate::builder::{FieldMap, IntoParams, SortDirection, StatementBuilder};
use crate::connection::{self, Connection, Row};
use crate::record::{check_row_shape, Record};
use crate::{DatabaseConfig, Error, Result, Value};

/// CRUD access to one table through one connection
pub struct Repository<T: Record> {
    connection: Box<dyn Connection>,
    marker: PhantomData<T>,
}

impl<T: Record> Repository<T> {
    /// Resolve the configured engine and bind it to the record type.
    /// Fails fast with an unsupported configuration error when the
    /// engine has no adapter.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self::with_connection(connection::open(config)?))
    }

    /// Bind an already-constructed connection to the record type
    pub fn with_connection(connection: Box<dyn Connection>) -> Self {
        Self {
            connection,
            marker: PhantomData,
        }
    }

    /// Start a lazy query against the record's table. No I/O happens
    /// until the query is fetched.
    pub fn query(&mut self) -> Query<'_, T> {
        Query {
            statement: StatementBuilder::new(T::TABLE),
            repository: self,
        }
    }

    /// Shorthand for `query().where_(...)`
    pub fn where_(&mut self, condition: &str, params: impl IntoParams) -> Query<'_, T> {
        self.query().where_(condition, params)
    }

    /// Fetch every row of the table. An empty table yields an empty Vec.
    pub fn all(&mut self) -> Result<Vec<T>> {
        let (sql, params) = StatementBuilder::new(T::TABLE).render()?;
        debug!(table = T::TABLE, sql = %sql, "fetching all rows");
        let rows = self.with_session(|session| session.fetch_all(&sql, &params))?;
        rows.iter().map(map_row::<T>).collect()
    }

    /// Fetch one row by primary key; `Ok(None)` when absent
    pub fn find_by_pk(&mut self, key: impl Into<Value>) -> Result<Option<T>> {
        let (sql, params) = StatementBuilder::new(T::TABLE)
            .where_(&format!("{} = ?", T::PRIMARY_KEY), [key.into()])
            .limit(1)
            .render()?;
        debug!(table = T::TABLE, sql = %sql, "fetching by primary key");
        let row = self.with_session(|session| session.fetch_one(&sql, &params))?;
        row.as_ref().map(map_row::<T>).transpose()
    }

    /// Insert one row built from the field map and return the mapped
    /// instance with its engine-assigned primary key populated
    pub fn create(&mut self, fields: FieldMap) -> Result<T> {
        let (sql, params) = StatementBuilder::new(T::TABLE)
            .insert(fields.clone())
            .render()?;
        debug!(table = T::TABLE, sql = %sql, "inserting row");
        let id = self.with_session(|session| {
            session.execute(&sql, &params)?;
            session.last_insert_id()
        })?;

        let mut row: Row = fields.into_entries().into_iter().collect();
        if let Some(id) = id {
            row.insert(T::PRIMARY_KEY.to_string(), Value::I64(id));
        }
        map_row::<T>(&row)
    }

    /// Insert many rows in one statement and return the inserted count.
    /// Empty input is a no-op returning `Ok(None)`; no statement is
    /// issued. The bulk path does not materialize instances.
    pub fn create_many(&mut self, rows: Vec<FieldMap>) -> Result<Option<u64>> {
        if rows.is_empty() {
            return Ok(None);
        }
        let (sql, params) = StatementBuilder::new(T::TABLE)
            .insert_many(rows)?
            .render()?;
        debug!(table = T::TABLE, sql = %sql, "inserting rows");
        let inserted = self.with_session(|session| session.execute(&sql, &params))?;
        Ok(Some(inserted))
    }

    /// Persist the record: UPDATE when its primary key is set, INSERT
    /// (followed by primary key population) when it is not
    pub fn save(&mut self, record: &mut T) -> Result<()> {
        let key = record.primary_key_value();
        if key.is_null() {
            self.insert_record(record)
        } else {
            self.update_record(record, key)
        }
    }

    /// Delete the record's row. Fails with a state error, without
    /// issuing a statement, when the primary key is unset.
    pub fn delete(&mut self, record: &T) -> Result<()> {
        let key = record.primary_key_value();
        if key.is_null() {
            return Err(Error::state("cannot delete a record without a primary key"));
        }
        let (sql, params) = StatementBuilder::new(T::TABLE)
            .delete()
            .where_(&format!("{} = ?", T::PRIMARY_KEY), [key])
            .render()?;
        debug!(table = T::TABLE, sql = %sql, "deleting row");
        self.with_session(|session| session.execute(&sql, &params))?;
        Ok(())
    }

    fn insert_record(&mut self, record: &mut T) -> Result<()> {
        let mut fields = FieldMap::new();
        for (column, value) in record.to_fields().into_entries() {
            if column == T::PRIMARY_KEY && value.is_null() {
                continue;
            }
            fields = fields.set(&column, value);
        }
        let (sql, params) = StatementBuilder::new(T::TABLE).insert(fields).render()?;
        debug!(table = T::TABLE, sql = %sql, "inserting record");
        let id = self.with_session(|session| {
            session.execute(&sql, &params)?;
            session.last_insert_id()
        })?;
        if let Some(id) = id {
            record.set_primary_key_value(Value::I64(id));
        }
        Ok(())
    }

    fn update_record(&mut self, record: &T, key: Value) -> Result<()> {
        let mut assignments = Vec::new();
        let mut values = Vec::new();
        for (column, value) in record.to_fields().into_entries() {
            if column == T::PRIMARY_KEY {
                continue;
            }
            assignments.push(format!("{column} = ?"));
            values.push(value);
        }
        if assignments.is_empty() {
            return Err(Error::validation(
                "record has no non-key fields to update",
            ));
        }
        let (sql, params) = StatementBuilder::new(T::TABLE)
            .update(&assignments.join(", "), values)
            .where_(&format!("{} = ?", T::PRIMARY_KEY), [key])
            .render()?;
        debug!(table = T::TABLE, sql = %sql, "updating record");
        self.with_session(|session| session.execute(&sql, &params))?;
        Ok(())
    }

    /// Run one operation inside a connect/release pair. Release runs on
    /// every exit path; when both the operation and the release fail,
    /// both failures are preserved.
    fn with_session<R>(
        &mut self,
        operation: impl FnOnce(&mut dyn Connection) -> Result<R>,
    ) -> Result<R> {
        self.connection.connect()?;
        let outcome = operation(self.connection.as_mut());
        match (outcome, self.connection.disconnect()) {
            (outcome, Ok(())) => outcome,
            (Ok(_), Err(release)) => Err(release),
            (Err(failure), Err(release)) => Err(Error::release_failed(failure, release)),
        }
    }
}

/// Lazy SELECT over a record's table, fetched on demand
pub struct Query<'a, T: Record> {
    statement: StatementBuilder,
    repository: &'a mut Repository<T>,
}

impl<'a, T: Record> Query<'a, T> {
    /// Append a raw predicate fragment with its positional parameters
    pub fn where_(mut self, condition: &str, params: impl IntoParams) -> Self {
        self.statement = self.statement.where_(condition, params);
        self
    }

    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.statement = self.statement.order_by(column, direction);
        self
    }

    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Asc)
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Desc)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.statement = self.statement.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.statement = self.statement.offset(offset);
        self
    }

    /// Execute the query and map every row
    pub fn fetch_all(self) -> Result<Vec<T>> {
        let Query {
            statement,
            repository,
        } = self;
        let (sql, params) = statement.render()?;
        debug!(table = T::TABLE, sql = %sql, "fetching query rows");
        let rows = repository.with_session(|session| session.fetch_all(&sql, &params))?;
        rows.iter().map(map_row::<T>).collect()
    }

    /// Execute the query capped at one row; `Ok(None)` when absent
    pub fn fetch_one(self) -> Result<Option<T>> {
        let Query {
            statement,
            repository,
        } = self;
        let (sql, params) = statement.limit(1).render()?;
        debug!(table = T::TABLE, sql = %sql, "fetching query row");
        let row = repository.with_session(|session| session.fetch_one(&sql, &params))?;
        row.as_ref().map(map_row::<T>).transpose()
    }
}

fn map_row<T: Record>(row: &Row) -> Result<T> {
    check_row_shape::<T>(row)?;
    T::from_row(row)
}
