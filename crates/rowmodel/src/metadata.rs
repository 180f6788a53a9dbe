//! Table metadata cache.
//!
//! Column listings and defaults come from the execution collaborator's
//! `describe_columns` and are cached per table for the lifetime of the
//! owning session. There is no process-wide cache.

use chrono::Utc;
use rowmodel_core::connection::Connection;
use rowmodel_core::error::Result;
use rowmodel_core::filter::DATETIME_FORMAT;
use rowmodel_core::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Cached description of one table.
#[derive(Debug, Clone)]
pub struct TableMetadata {
    /// Column names in declaration order
    pub columns: Vec<String>,
    /// Column defaults, already materialized
    pub defaults: HashMap<String, Value>,
}

/// Per-session cache of table metadata.
#[derive(Debug, Default)]
pub struct MetadataCache {
    tables: RefCell<HashMap<String, Arc<TableMetadata>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the metadata for a table, describing it on first use.
    ///
    /// A textual `CURRENT_TIMESTAMP` default materializes as the current
    /// time in datetime storage format.
    pub fn describe<C: Connection>(&self, connection: &C, table: &str) -> Result<Arc<TableMetadata>> {
        if let Some(cached) = self.tables.borrow().get(table) {
            return Ok(Arc::clone(cached));
        }

        let described = connection.describe_columns(table)?;
        let mut columns = Vec::with_capacity(described.len());
        let mut defaults = HashMap::new();
        for column in described {
            if let Some(default) = column.default_value {
                defaults.insert(column.name.clone(), materialize_default(default));
            }
            columns.push(column.name);
        }

        let metadata = Arc::new(TableMetadata { columns, defaults });
        self.tables
            .borrow_mut()
            .insert(table.to_string(), Arc::clone(&metadata));
        Ok(metadata)
    }
}

fn materialize_default(default: Value) -> Value {
    match &default {
        Value::Text(s) if s.eq_ignore_ascii_case("CURRENT_TIMESTAMP") => {
            Value::Text(Utc::now().format(DATETIME_FORMAT).to_string())
        }
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmodel_core::connection::ColumnDescription;
    use rowmodel_core::fragment::Fragment;
    use rowmodel_core::row::ResultSet;
    use std::cell::Cell;

    struct CountingConnection {
        describes: Cell<usize>,
    }

    impl Connection for CountingConnection {
        fn query(&self, _fragments: &[Fragment]) -> Result<ResultSet> {
            Ok(ResultSet::empty())
        }

        fn execute(&self, _fragments: &[Fragment]) -> Result<u64> {
            Ok(0)
        }

        fn last_insert_id(&self) -> Result<i64> {
            Ok(0)
        }

        fn describe_columns(&self, _table: &str) -> Result<Vec<ColumnDescription>> {
            self.describes.set(self.describes.get() + 1);
            Ok(vec![
                ColumnDescription::new("id", None),
                ColumnDescription::new("status", Some(Value::Text("new".into()))),
                ColumnDescription::new(
                    "created_at",
                    Some(Value::Text("CURRENT_TIMESTAMP".into())),
                ),
            ])
        }
    }

    #[test]
    fn describes_once_per_table() {
        let connection = CountingConnection {
            describes: Cell::new(0),
        };
        let cache = MetadataCache::new();
        let first = cache.describe(&connection, "tasks").unwrap();
        let second = cache.describe(&connection, "tasks").unwrap();
        assert_eq!(connection.describes.get(), 1);
        assert_eq!(first.columns, second.columns);
    }

    #[test]
    fn current_timestamp_materializes() {
        let connection = CountingConnection {
            describes: Cell::new(0),
        };
        let cache = MetadataCache::new();
        let metadata = cache.describe(&connection, "tasks").unwrap();

        assert_eq!(
            metadata.defaults.get("status"),
            Some(&Value::Text("new".into()))
        );
        match metadata.defaults.get("created_at") {
            Some(Value::Text(s)) => {
                assert!(!s.eq_ignore_ascii_case("CURRENT_TIMESTAMP"));
                assert_eq!(s.len(), "1970-01-01 00:00:00".len());
            }
            other => panic!("expected materialized text default, got {other:?}"),
        }
        assert!(!metadata.defaults.contains_key("id"));
    }
}
