//! Query building for Rowmodel.
//!
//! Conditions, joins, and the `Criteria` accumulator that renders them
//! into deferred fragment sequences. Nothing in this crate talks to a
//! database; rendering placeholders is the execution collaborator's job.

pub mod condition;
pub mod criteria;
pub mod join;

pub use condition::{Condition, Operator};
pub use criteria::Criteria;
pub use join::{Join, JoinKind};
