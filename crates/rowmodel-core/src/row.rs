//! Query result representation.

use crate::error::{Error, TypeError};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Column metadata shared across all rows in a result set.
///
/// Wrapped in `Arc` so all rows from the same query share the same column
/// information.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    /// Column names in order
    names: Vec<String>,
    /// Name -> index mapping for O(1) lookup
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    /// Create new column info from a list of column names.
    pub fn new(names: Vec<String>) -> Self {
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            name_to_index,
        }
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the index of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Check if a column exists.
    pub fn contains(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Get all column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A single row returned from a query.
#[derive(Debug, Clone)]
pub struct Row {
    /// Column values in order
    values: Vec<Value>,
    /// Shared column metadata
    columns: Arc<ColumnInfo>,
}

impl Row {
    /// Create a new row with the given columns and values.
    ///
    /// For multiple rows from the same result set, prefer `with_columns` to
    /// share the column metadata.
    pub fn new(column_names: Vec<String>, values: Vec<Value>) -> Self {
        let columns = Arc::new(ColumnInfo::new(column_names));
        Self { values, columns }
    }

    /// Create a new row with shared column metadata.
    pub fn with_columns(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get the shared column metadata.
    pub fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }

    /// Get the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if this row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Get a value by column name, failing with a type error when the
    /// column does not exist.
    pub fn require(&self, name: &str) -> Result<&Value, Error> {
        self.get_by_name(name).ok_or_else(|| {
            Error::Type(TypeError::new("column", format!("missing column '{name}'")))
        })
    }

    /// Iterate over `(name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// An ordered set of rows returned from one query.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    rows: Vec<Row>,
}

impl ResultSet {
    /// Create a result set from rows.
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Create an empty result set.
    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result set has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Take the first row, if any.
    pub fn fetch_one(mut self) -> Option<Row> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.rows.remove(0))
        }
    }

    /// Take all rows.
    pub fn fetch_all(self) -> Vec<Row> {
        self.rows
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        Row::new(
            vec!["id".to_string(), "name".to_string()],
            vec![Value::BigInt(1), Value::Text("alice".to_string())],
        )
    }

    #[test]
    fn name_based_access() {
        let row = sample_row();
        assert_eq!(row.get_by_name("id"), Some(&Value::BigInt(1)));
        assert_eq!(row.get_by_name("missing"), None);
        assert!(row.require("missing").is_err());
    }

    #[test]
    fn shared_column_info() {
        let row = sample_row();
        let columns = row.column_info();
        let second = Row::with_columns(columns, vec![Value::BigInt(2), Value::Null]);
        assert_eq!(second.get_by_name("id"), Some(&Value::BigInt(2)));
    }

    #[test]
    fn fetch_semantics() {
        let set = ResultSet::new(vec![sample_row(), sample_row()]);
        assert_eq!(set.len(), 2);
        assert!(set.clone().fetch_one().is_some());
        assert_eq!(set.fetch_all().len(), 2);
        assert!(ResultSet::empty().fetch_one().is_none());
    }
}
