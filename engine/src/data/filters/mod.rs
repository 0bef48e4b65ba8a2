//! Filter descriptors and the predicate compiler
//!
//! Descriptors are `column / operator / value` triples with an optional
//! numeric tolerance. The compiler validates them and produces a storage
//! neutral [`Predicate`](crate::data::predicate::Predicate).
//!
//! ## Usage
//!
//! ```
//! use gridfilter::data::filters::{parse_filters, PredicateCompiler, ResultScope};
//! use uuid::Uuid;
//!
//! struct Violations;
//!
//! impl ResultScope for Violations {
//!     fn result_id_column(&self) -> &str { "result_uuid" }
//!     fn id_column(&self) -> &str { "id" }
//! }
//!
//! let json = r#"[{"dataType": "text", "type": "contains", "value": "gen", "column": "subject_id"}]"#;
//! let filters = parse_filters(json).unwrap();
//! let predicate = PredicateCompiler::default()
//!     .compile_for_result(&Violations, Uuid::nil(), &filters)
//!     .unwrap();
//! assert_eq!(predicate.leaf_count(), 2);
//! ```

mod builder;
mod parser;
mod types;

pub use builder::{PredicateCompiler, ResultScope};
pub use parser::{parse_filters, parse_filters_with_limit};
pub use types::{DataType, FilterType, FilterValue, ResourceFilter, ScalarValue};
