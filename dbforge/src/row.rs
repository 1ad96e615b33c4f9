//! Driver-independent catalog row

use crate::error::{Error, Result};
use crate::traits::FromValue;
use crate::value::Value;

/// A single row returned by a catalog query.
///
/// Columns keep their query order. Lookup by name is case-insensitive
/// because catalogs differ in how they report column labels
/// (`TABLE_NAME` vs `table_name`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column (builder style).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Append a column.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }

    /// Column labels in query order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column name.
    pub fn get_value(&self, column: &str) -> Result<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .map(|i| &self.values[i])
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))
    }

    /// Get a value by position.
    pub fn get_index(&self, index: usize) -> Result<&Value> {
        self.values
            .get(index)
            .ok_or_else(|| Error::ColumnNotFound(format!("#{}", index)))
    }

    /// Get a typed value by column name.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T> {
        T::from_value(self.get_value(column)?.clone())
    }

    /// Get an optional string, treating a missing column like NULL.
    pub fn get_opt_string(&self, column: &str) -> Result<Option<String>> {
        match self.get_value(column) {
            Ok(value) => Option::<String>::from_value(value.clone()),
            Err(Error::ColumnNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let row = Row::new().with("TABLE_NAME", "users").with("n", 3i64);
        assert_eq!(row.get::<String>("table_name").unwrap(), "users");
        assert_eq!(row.get::<i64>("N").unwrap(), 3);
        assert!(matches!(
            row.get::<String>("missing"),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_get_opt_string() {
        let row = Row::new().with("comment", Value::Null);
        assert_eq!(row.get_opt_string("comment").unwrap(), None);
        assert_eq!(row.get_opt_string("absent").unwrap(), None);
    }
}
