//! Storage-neutral predicate algebra
//!
//! Compiled filters are expressed as [`Predicate`] trees. The SQL renderer in
//! [`crate::data::sql`] and the in-memory evaluator in this module consume them.

mod eval;
mod types;

pub use types::{FieldPath, Literal, NumberOp, Predicate, TextOp};
