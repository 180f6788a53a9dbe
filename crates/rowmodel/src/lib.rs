//! Rowmodel: an ActiveRecord-style record layer over deferred query
//! fragments.
//!
//! Models are registered by name in a [`Registry`]; a [`Session`] owns a
//! connection and orchestrates fetching, batched relation resolution, and
//! persistence. Queries are built with [`Criteria`] and executed by a
//! [`Connection`] implementation supplied by the caller.
//!
//! ```no_run
//! use rowmodel::{Criteria, ModelDef, Operator, Registry, RelationDef, Session};
//! # fn demo(connection: impl rowmodel::Connection) -> rowmodel::Result<()> {
//! let registry = Registry::builder()
//!     .register(
//!         ModelDef::builder("User", "users")
//!             .relation("orders", RelationDef::has_many("Order", "user_id"))
//!             .build(),
//!     )
//!     .register(ModelDef::builder("Order", "orders").build())
//!     .build();
//!
//! let session = Session::new(connection, registry);
//! let mut criteria = Criteria::new();
//! criteria
//!     .compare("t.active", 1, false, Operator::And)
//!     .with("orders");
//! let users = session.find_all("User", &criteria)?;
//! # Ok(())
//! # }
//! ```

pub mod metadata;
pub mod relation;
pub mod schema;
pub mod session;

pub use metadata::{MetadataCache, TableMetadata};
pub use relation::RelationIndex;
pub use schema::{
    DeleteHook, ModelDef, ModelDefBuilder, Registry, RegistryBuilder, RelationDef, RelationKind,
    SaveHook,
};
pub use session::Session;

// Re-export the lower layers so callers need only one crate.
pub use rowmodel_core::{
    ColumnDescription, ColumnInfo, ConfigError, Connection, Error, FieldValidationError, Filter,
    Fragment, InRules, Key, PatternRules, QueryError, Record, Related, Result, ResultSet, Row,
    TextRules, TypeError, ValidationError, ValidationErrorKind, ValidatorBinding, ValidatorKind,
    Value, preview, run_validators,
};
pub use rowmodel_query::{Condition, Criteria, Join, JoinKind, Operator};
