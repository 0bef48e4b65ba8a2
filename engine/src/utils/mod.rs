//! Shared helpers

pub mod file;
pub mod retry;
pub mod sql;
