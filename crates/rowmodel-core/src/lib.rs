//! Core types and traits for Rowmodel.
//!
//! This crate provides the foundational abstractions for the record layer:
//!
//! - `Value` dynamic values and the hashable `Key` subset
//! - `Fragment` deferred query fragments
//! - `Row` / `ResultSet` query results
//! - `Connection` trait for execution collaborators
//! - `Record` array-backed entities with attribute filters
//! - validators and the shared error module

pub mod connection;
pub mod error;
pub mod filter;
pub mod fragment;
pub mod record;
pub mod row;
pub mod validate;
pub mod value;

pub use connection::{ColumnDescription, Connection};
pub use error::{
    ConfigError, Error, FieldValidationError, QueryError, Result, TypeError, ValidationError,
    ValidationErrorKind,
};
pub use filter::{DATETIME_FORMAT, Filter};
pub use fragment::{Fragment, preview};
pub use record::{Record, Related};
pub use row::{ColumnInfo, ResultSet, Row};
pub use validate::{
    CallbackFn, InRules, PatternRules, TextRules, ValidatorBinding, ValidatorKind, run_validators,
};
pub use value::{Key, Value};
