//! SQL statement builder
//!
//! A `StatementBuilder` accumulates the description of exactly one SQL
//! statement in a fluent chain and renders it to statement text plus an
//! ordered parameter list. Bound values only ever travel through `?`
//! placeholders; the builder never interpolates them into the text.

use crate::{Error, Result, Value};

/// The statement verb a builder will render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Trait for positional parameter lists attached to a clause fragment
///
/// Accepts an array of anything convertible to [`Value`], a prepared
/// `Vec<Value>`, or `()` for a fragment with no bound values. Mixed-type
/// lists use an array of `Value`:
///
/// ```
/// use marrow_core::{table, Value};
///
/// let (sql, params) = table("users")
///     .where_("age > ? AND name = ?", [Value::from(18), Value::from("Ann")])
///     .render()
///     .unwrap();
/// assert_eq!(sql, "SELECT * FROM users WHERE age > ? AND name = ?");
/// assert_eq!(params.len(), 2);
/// ```
pub trait IntoParams {
    fn into_params(self) -> Vec<Value>;
}

impl IntoParams for () {
    fn into_params(self) -> Vec<Value> {
        Vec::new()
    }
}

impl<T, const N: usize> IntoParams for [T; N]
where
    T: Into<Value>,
{
    fn into_params(self) -> Vec<Value> {
        self.into_iter().map(Into::into).collect()
    }
}

impl IntoParams for Vec<Value> {
    fn into_params(self) -> Vec<Value> {
        self
    }
}

/// Ordered column/value pairs for an INSERT payload or a record's fields
///
/// Unlike a hash map this preserves the order columns were supplied in,
/// which fixes both the rendered column list and the parameter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, Value)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column's value. Replaces an existing entry in place, so the
    /// column order of the first assignment wins.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column.to_string(), value)),
        }
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Column names in insertion order
    pub fn columns(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn into_entries(self) -> Vec<(String, Value)> {
        self.entries
    }
}

/// Builder for a single SQL statement
///
/// Created fresh per operation, mutated through the fluent chain, rendered
/// once with [`StatementBuilder::render`], then discarded. Rendering is
/// pure: calling it repeatedly on the same builder yields identical output.
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    table: String,
    operation: Operation,
    columns: Vec<String>,
    predicates: Vec<String>,
    ordering: Vec<(String, SortDirection)>,
    limit: Option<u64>,
    offset: Option<u64>,
    set_fragment: Option<String>,
    value_rows: usize,
    payload: Vec<Value>,
    predicate_params: Vec<Value>,
    unrestricted: bool,
}

impl StatementBuilder {
    /// Create a new builder for the given table, defaulting to SELECT
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            operation: Operation::Select,
            columns: Vec::new(),
            predicates: Vec::new(),
            ordering: Vec::new(),
            limit: None,
            offset: None,
            set_fragment: None,
            value_rows: 0,
            payload: Vec::new(),
            predicate_params: Vec::new(),
            unrestricted: false,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Switch to SELECT and append columns to the projection. Repeated
    /// calls accumulate; an empty projection renders as `*`.
    pub fn select<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.operation = Operation::Select;
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Switch to INSERT with a single row of values. The column list and
    /// parameter order follow the field map's insertion order.
    pub fn insert(mut self, fields: FieldMap) -> Self {
        self.operation = Operation::Insert;
        self.columns = fields.columns().iter().map(|c| c.to_string()).collect();
        self.value_rows = 1;
        self.payload = fields
            .into_entries()
            .into_iter()
            .map(|(_, value)| value)
            .collect();
        self
    }

    /// Switch to INSERT with several rows sharing one column shape.
    ///
    /// Fails with a validation error if `rows` is empty or any row's
    /// column sequence differs from the first row's.
    pub fn insert_many(mut self, rows: Vec<FieldMap>) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(Error::validation("INSERT requires at least one row"));
        };
        if first.is_empty() {
            return Err(Error::validation("INSERT requires at least one column"));
        }
        let columns: Vec<String> = first.columns().iter().map(|c| c.to_string()).collect();

        self.operation = Operation::Insert;
        self.value_rows = rows.len();
        self.payload = Vec::with_capacity(columns.len() * rows.len());
        for row in rows {
            if row.columns() != columns {
                return Err(Error::validation(
                    "INSERT rows must share one column shape",
                ));
            }
            self.payload
                .extend(row.into_entries().into_iter().map(|(_, value)| value));
        }
        self.columns = columns;
        Ok(self)
    }

    /// Switch to UPDATE with a raw SET fragment, stored verbatim. The
    /// fragment's bound values precede any predicate values in the
    /// rendered parameter list.
    pub fn update(mut self, set_fragment: &str, params: impl IntoParams) -> Self {
        self.operation = Operation::Update;
        self.set_fragment = Some(set_fragment.to_string());
        self.payload = params.into_params();
        self
    }

    /// Switch to DELETE
    pub fn delete(mut self) -> Self {
        self.operation = Operation::Delete;
        self
    }

    /// Append a raw predicate fragment with its positional parameters.
    /// Multiple predicates are combined with `AND`.
    pub fn where_(mut self, condition: &str, params: impl IntoParams) -> Self {
        self.predicates.push(condition.to_string());
        self.predicate_params.extend(params.into_params());
        self
    }

    /// Append an ORDER BY term. Only rendered for SELECT statements.
    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.ordering.push((column.to_string(), direction));
        self
    }

    /// Add an ORDER BY ASC clause (convenience method)
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Asc)
    }

    /// Add an ORDER BY DESC clause (convenience method)
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Desc)
    }

    /// Set the LIMIT bound. Zero is a real bound and renders `LIMIT 0`;
    /// "no limit" is expressed by never calling this.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the OFFSET bound. Zero renders `OFFSET 0`.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Opt into rendering an UPDATE or DELETE with no predicates.
    /// Without this, a whole-table mutation fails validation.
    pub fn unrestricted(mut self) -> Self {
        self.unrestricted = true;
        self
    }

    /// Render the statement text and its ordered parameter list.
    ///
    /// Parameter order matches placeholder emission order: mutation
    /// payload first (INSERT values or SET fragment values), then
    /// predicate values.
    pub fn render(&self) -> Result<(String, Vec<Value>)> {
        let sql = match self.operation {
            Operation::Select => self.render_select(),
            Operation::Insert => self.render_insert()?,
            Operation::Update => self.render_update()?,
            Operation::Delete => self.render_delete()?,
        };

        let mut params = Vec::with_capacity(self.payload.len() + self.predicate_params.len());
        // Only mutating operations emit payload placeholders; a builder
        // steered back to SELECT must not leak stale payload values.
        if matches!(self.operation, Operation::Insert | Operation::Update) {
            params.extend(self.payload.iter().cloned());
        }
        params.extend(self.predicate_params.iter().cloned());
        Ok((sql, params))
    }

    fn render_select(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);
        self.push_where(&mut sql);

        if !self.ordering.is_empty() {
            sql.push_str(" ORDER BY ");
            let terms: Vec<String> = self
                .ordering
                .iter()
                .map(|(column, direction)| format!("{column} {direction}"))
                .collect();
            sql.push_str(&terms.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        sql
    }

    fn render_insert(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Err(Error::validation("INSERT requires at least one column"));
        }
        if self.value_rows == 0 || self.payload.len() != self.columns.len() * self.value_rows {
            return Err(Error::validation(
                "INSERT payload does not match the column list",
            ));
        }

        let mut sql = String::from("INSERT INTO ");
        sql.push_str(&self.table);
        sql.push_str(" (");
        sql.push_str(&self.columns.join(", "));
        sql.push_str(") VALUES ");

        let placeholders = vec!["?"; self.columns.len()].join(", ");
        let groups: Vec<String> = (0..self.value_rows)
            .map(|_| format!("({placeholders})"))
            .collect();
        sql.push_str(&groups.join(", "));
        Ok(sql)
    }

    fn render_update(&self) -> Result<String> {
        let set_fragment = match self.set_fragment.as_deref() {
            Some(fragment) if !fragment.trim().is_empty() => fragment,
            _ => return Err(Error::validation("UPDATE requires a SET fragment")),
        };
        self.check_restricted("UPDATE")?;

        let mut sql = String::from("UPDATE ");
        sql.push_str(&self.table);
        sql.push_str(" SET ");
        sql.push_str(set_fragment);
        self.push_where(&mut sql);
        Ok(sql)
    }

    fn render_delete(&self) -> Result<String> {
        self.check_restricted("DELETE")?;

        let mut sql = String::from("DELETE FROM ");
        sql.push_str(&self.table);
        self.push_where(&mut sql);
        Ok(sql)
    }

    fn push_where(&self, sql: &mut String) {
        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.join(" AND "));
        }
    }

    fn check_restricted(&self, verb: &str) -> Result<()> {
        if self.predicates.is_empty() && !self.unrestricted {
            return Err(Error::validation(format!(
                "{verb} without predicates mutates the whole table; call unrestricted() to allow it"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table;

    #[test]
    fn test_select_defaults_to_star() {
        let (sql, params) = table("users").render().unwrap();
        assert_eq!(sql, "SELECT * FROM users");
        assert!(params.is_empty());
    }

    #[test]
    fn test_select_columns() {
        let (sql, _) = table("users").select(["id", "name"]).render().unwrap();
        assert_eq!(sql, "SELECT id, name FROM users");
    }

    #[test]
    fn test_select_accumulates_columns() {
        let (sql, _) = table("users")
            .select(["id"])
            .select(["name"])
            .render()
            .unwrap();
        assert_eq!(sql, "SELECT id, name FROM users");
    }

    #[test]
    fn test_where_params_follow_call_order() {
        let (sql, params) = table("users")
            .where_("a = ?", [1])
            .where_("b = ?", [2])
            .render()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE a = ? AND b = ?");
        assert_eq!(params, vec![Value::I32(1), Value::I32(2)]);
    }

    #[test]
    fn test_order_limit_offset() {
        let (sql, _) = table("users")
            .order_by_desc("created_at")
            .order_by("name", SortDirection::Asc)
            .limit(10)
            .offset(5)
            .render()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users ORDER BY created_at DESC, name ASC LIMIT 10 OFFSET 5"
        );
    }

    #[test]
    fn test_limit_zero_renders() {
        let (sql, _) = table("users").limit(0).offset(0).render().unwrap();
        assert_eq!(sql, "SELECT * FROM users LIMIT 0 OFFSET 0");
    }

    #[test]
    fn test_insert() {
        let (sql, params) = table("users")
            .insert(FieldMap::new().set("name", "Ann").set("age", 30))
            .render()
            .unwrap();
        assert_eq!(sql, "INSERT INTO users (name, age) VALUES (?, ?)");
        assert_eq!(
            params,
            vec![Value::String("Ann".to_string()), Value::I32(30)]
        );
    }

    #[test]
    fn test_insert_many() {
        let rows = vec![
            FieldMap::new().set("a", 1),
            FieldMap::new().set("a", 2),
        ];
        let (sql, params) = table("t").insert_many(rows).unwrap().render().unwrap();
        assert_eq!(sql, "INSERT INTO t (a) VALUES (?), (?)");
        assert_eq!(params, vec![Value::I32(1), Value::I32(2)]);
    }

    #[test]
    fn test_insert_many_empty_fails() {
        let result = table("t").insert_many(Vec::new());
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_insert_many_mixed_shapes_fail() {
        let rows = vec![
            FieldMap::new().set("a", 1),
            FieldMap::new().set("b", 2),
        ];
        let result = table("t").insert_many(rows);
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_insert_without_columns_fails() {
        let result = table("t").insert(FieldMap::new()).render();
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_update() {
        let (sql, params) = table("users")
            .update("name = ?", ["Bob"])
            .where_("id = ?", [5])
            .render()
            .unwrap();
        assert_eq!(sql, "UPDATE users SET name = ? WHERE id = ?");
        assert_eq!(
            params,
            vec![Value::String("Bob".to_string()), Value::I32(5)]
        );
    }

    #[test]
    fn test_update_payload_precedes_predicates_regardless_of_call_order() {
        let (_, params) = table("users")
            .where_("id = ?", [5])
            .update("name = ?", ["Bob"])
            .render()
            .unwrap();
        assert_eq!(
            params,
            vec![Value::String("Bob".to_string()), Value::I32(5)]
        );
    }

    #[test]
    fn test_update_without_set_fails() {
        let result = table("users").update("", ()).where_("id = ?", [5]).render();
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_delete() {
        let (sql, params) = table("users").delete().where_("id = ?", [5]).render().unwrap();
        assert_eq!(sql, "DELETE FROM users WHERE id = ?");
        assert_eq!(params, vec![Value::I32(5)]);
    }

    #[test]
    fn test_delete_without_predicates_needs_opt_in() {
        let restricted = table("users").delete().render();
        assert!(matches!(restricted, Err(Error::Validation { .. })));

        let (sql, _) = table("users").delete().unrestricted().render().unwrap();
        assert_eq!(sql, "DELETE FROM users");
    }

    #[test]
    fn test_update_without_predicates_needs_opt_in() {
        let restricted = table("users").update("age = ?", [0]).render();
        assert!(matches!(restricted, Err(Error::Validation { .. })));

        let (sql, _) = table("users")
            .update("age = ?", [0])
            .unrestricted()
            .render()
            .unwrap();
        assert_eq!(sql, "UPDATE users SET age = ?");
    }

    #[test]
    fn test_ordering_ignored_outside_select() {
        let (sql, _) = table("users")
            .order_by_asc("name")
            .limit(3)
            .delete()
            .where_("id = ?", [1])
            .render()
            .unwrap();
        assert_eq!(sql, "DELETE FROM users WHERE id = ?");
    }

    #[test]
    fn test_render_is_idempotent() {
        let builder = table("users")
            .select(["id"])
            .where_("age > ?", [18])
            .order_by_asc("id")
            .limit(2);
        assert_eq!(builder.operation(), Operation::Select);
        let first = builder.render().unwrap();
        let second = builder.render().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_placeholder_count_matches_params() {
        let (sql, params) = table("users")
            .insert(FieldMap::new().set("a", 1).set("b", 2).set("c", 3))
            .render()
            .unwrap();
        let placeholders = sql.matches('?').count();
        assert_eq!(placeholders, params.len());
    }

    #[test]
    fn test_field_map_set_replaces_in_place() {
        let fields = FieldMap::new().set("a", 1).set("b", 2).set("a", 9);
        assert_eq!(fields.columns(), vec!["a", "b"]);
        assert_eq!(fields.get("a"), Some(&Value::I32(9)));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_reentering_select_drops_stale_payload() {
        let (sql, params) = table("users")
            .insert(FieldMap::new().set("name", "Ann"))
            .select(["id"])
            .render()
            .unwrap();
        assert_eq!(sql.matches('?').count(), params.len());
        assert!(sql.starts_with("SELECT"));
    }
}
