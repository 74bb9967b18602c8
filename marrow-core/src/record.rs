//! Record contract binding a concrete type to a table
//!
//! A record type declares its table, primary key and field names up
//! front. Row construction is validated against the declared field set,
//! so a schema drift surfaces as a validation error instead of silently
//! producing half-populated instances.

use crate::builder::FieldMap;
use crate::connection::Row;
use crate::{Error, Result, Value};

/// A typed in-memory projection of one table row
///
/// Instances are ephemeral: two fetches of the same row produce two
/// distinct instances, and deleting the row does not touch instances
/// already in memory. A primary key of [`Value::Null`] means "not yet
/// persisted" and is the sole signal [`crate::Repository::save`] uses to
/// choose between INSERT and UPDATE.
pub trait Record: Sized {
    /// Table this type maps to
    const TABLE: &'static str;

    /// Primary key column
    const PRIMARY_KEY: &'static str = "id";

    /// Every column this type knows about, primary key included
    const FIELDS: &'static [&'static str];

    /// Construct an instance from a fetched row. Callers are expected to
    /// run [`check_row_shape`] first; implementations may assume every
    /// declared field is present.
    fn from_row(row: &Row) -> Result<Self>;

    /// The instance's fields as ordered column/value pairs
    fn to_fields(&self) -> FieldMap;

    /// Current primary key value; [`Value::Null`] when unset
    fn primary_key_value(&self) -> Value;

    /// Populate the primary key, e.g. from an engine-assigned identifier
    fn set_primary_key_value(&mut self, value: Value);
}

/// Validate a fetched row's columns against a record type's declared
/// field set. Unknown and missing columns both fail.
pub fn check_row_shape<T: Record>(row: &Row) -> Result<()> {
    for column in row.keys() {
        if !T::FIELDS.contains(&column.as_str()) {
            return Err(Error::validation(format!(
                "unknown column '{column}' for table '{}'",
                T::TABLE
            )));
        }
    }
    for field in T::FIELDS {
        if !row.contains_key(*field) {
            return Err(Error::validation(format!(
                "missing column '{field}' for table '{}'",
                T::TABLE
            )));
        }
    }
    Ok(())
}
