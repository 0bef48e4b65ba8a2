pub mod error;
pub mod filters;
pub mod predicate;
pub mod sql;
pub mod stores;

pub use error::FilterError;
