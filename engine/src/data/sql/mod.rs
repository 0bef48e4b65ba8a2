//! SQL storage adapter
//!
//! ## Usage
//!
//! ```
//! use gridfilter::data::predicate::{FieldPath, NumberOp, Predicate};
//! use gridfilter::data::sql::{DuckDb, SqlParams, SqlRenderer};
//!
//! let predicate = Predicate::number(FieldPath::root("value"), NumberOp::Ge, 10.0);
//! let mut params = SqlParams::default();
//! let sql = SqlRenderer::new(&DuckDb).render(&predicate, &mut params);
//! assert_eq!(sql, r#"CAST("value" AS DOUBLE) >= ?"#);
//! ```

mod dialect;
mod render;

pub use dialect::{Dialect, DuckDb, Postgres, SqlDialect};
pub use render::{SqlParams, SqlRenderer, SqlValue};
