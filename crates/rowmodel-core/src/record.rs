//! Array-backed records.
//!
//! A record is an attribute map plus a slot for related records resolved by
//! the relation loader. Filters are bound at construction; attribute reads
//! and writes go through them explicitly rather than via property
//! interception.

use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::row::Row;
use crate::value::Value;
use std::collections::HashMap;

/// Related data attached to a record under a relation name.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// To-one relation: a single record
    One(Record),
    /// To-many relation: an ordered list of records
    Many(Vec<Record>),
}

/// An attribute-mapped entity backed by a row of dynamic values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    attributes: HashMap<String, Value>,
    related: HashMap<String, Related>,
    filters: HashMap<String, Filter>,
}

impl Record {
    /// Create an empty record with no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with the given filter bindings.
    pub fn with_filters(filters: HashMap<String, Filter>) -> Self {
        Self {
            attributes: HashMap::new(),
            related: HashMap::new(),
            filters,
        }
    }

    /// Build a record from a result row, keeping raw storage values.
    pub fn from_row(row: &Row, filters: HashMap<String, Filter>) -> Self {
        let attributes = row
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        Self {
            attributes,
            related: HashMap::new(),
            filters,
        }
    }

    /// Read an attribute, applying its output filter. Missing attributes
    /// read as NULL.
    pub fn get(&self, name: &str) -> Result<Value> {
        let value = match self.attributes.get(name) {
            Some(value) => value.clone(),
            None => return Ok(Value::Null),
        };
        match self.filters.get(name) {
            Some(filter) => filter.output(value).map_err(|e| on_attribute(e, name)),
            None => Ok(value),
        }
    }

    /// Write an attribute, applying its input filter.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = match self.filters.get(name) {
            Some(filter) => filter
                .input(value.into())
                .map_err(|e| on_attribute(e, name))?,
            None => value.into(),
        };
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    /// Read the raw storage value of an attribute, bypassing filters.
    pub fn get_raw(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Write the raw storage value of an attribute, bypassing filters.
    pub fn set_raw(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    /// Check if an attribute is present (possibly NULL).
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Attribute `(name, raw value)` pairs in sorted name order.
    ///
    /// Sorting keeps emitted INSERT/UPDATE column lists deterministic.
    pub fn sorted_attributes(&self) -> Vec<(&str, &Value)> {
        let mut pairs: Vec<(&str, &Value)> = self
            .attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        pairs.sort_by_key(|(name, _)| *name);
        pairs
    }

    /// Replace the whole attribute map, keeping filters and related data.
    pub fn replace_attributes(&mut self, attributes: HashMap<String, Value>) {
        self.attributes = attributes;
    }

    /// Raw attribute map.
    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    /// Whether the record lacks an identity under the given primary key.
    pub fn is_new(&self, primary_key: &str) -> bool {
        match self.attributes.get(primary_key) {
            None | Some(Value::Null) => true,
            Some(_) => false,
        }
    }

    /// Related data resolved under a relation name, if any.
    pub fn related(&self, name: &str) -> Option<&Related> {
        self.related.get(name)
    }

    /// Set a to-one related record. Last write wins.
    pub fn attach_one(&mut self, name: &str, record: Record) {
        self.related.insert(name.to_string(), Related::One(record));
    }

    /// Append a record to a to-many relation slot.
    pub fn attach_many(&mut self, name: &str, record: Record) {
        match self.related.get_mut(name) {
            Some(Related::Many(records)) => records.push(record),
            _ => {
                self.related
                    .insert(name.to_string(), Related::Many(vec![record]));
            }
        }
    }
}

fn on_attribute(error: Error, name: &str) -> Error {
    match error {
        Error::Type(te) => Error::Type(te.on_attribute(name)),
        other => other,
    }
}
