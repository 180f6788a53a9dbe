//! The execution collaborator contract.
//!
//! The query core never talks to a database directly. It emits fragment
//! sequences and hands them to a [`Connection`], which owns placeholder
//! rendering, escaping, and execution. Implementations are synchronous;
//! the library supports exactly one query in flight per connection.

use crate::error::Result;
use crate::fragment::Fragment;
use crate::row::ResultSet;
use crate::value::Value;

/// Description of one column, as reported by the backing store.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescription {
    /// Column name
    pub name: String,
    /// Default value for new rows, if the store defines one
    pub default_value: Option<Value>,
}

impl ColumnDescription {
    /// Create a column description.
    pub fn new(name: impl Into<String>, default_value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            default_value,
        }
    }
}

/// A synchronous query execution collaborator.
///
/// Errors from implementations pass through the library unmodified; no
/// retry or recovery is layered on top.
pub trait Connection {
    /// Run a row-returning query.
    fn query(&self, fragments: &[Fragment]) -> Result<ResultSet>;

    /// Run a statement, returning the number of affected rows.
    fn execute(&self, fragments: &[Fragment]) -> Result<u64>;

    /// Identifier generated by the most recent insert.
    fn last_insert_id(&self) -> Result<i64>;

    /// Describe the columns of a table.
    fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescription>>;
}
