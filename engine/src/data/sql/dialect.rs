//! SQL dialects
//!
//! Placeholder, quoting and cast syntax for the backends compiled predicates
//! are rendered for.

use std::fmt;

use serde::{Deserialize, Serialize};

pub trait Dialect: Send + Sync {
    /// Wraps an identifier in the dialect's quotation marks.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Placeholder for the bind parameter at `index` (0-based).
    ///
    /// - DuckDB uses `?`
    /// - PostgreSQL uses `$1`, `$2`, etc.
    fn placeholder(&self, index: usize) -> String;

    /// Cast an expression to text
    fn text_cast(&self, expr: &str) -> String {
        format!("CAST({} AS VARCHAR)", expr)
    }

    /// Cast an expression to a double precision number
    fn number_cast(&self, expr: &str) -> String;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl Dialect for DuckDb {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', r#""""#))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn number_cast(&self, expr: &str) -> String {
        format!("CAST({} AS DOUBLE)", expr)
    }

    fn name(&self) -> &'static str {
        "DuckDB"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', r#""""#))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }

    fn number_cast(&self, expr: &str) -> String {
        format!("CAST({} AS DOUBLE PRECISION)", expr)
    }

    fn name(&self) -> &'static str {
        "PostgreSQL"
    }
}

static DUCKDB: DuckDb = DuckDb;
static POSTGRES: Postgres = Postgres;

/// Dialect selector used by configuration and the CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Duckdb,
    Postgres,
}

impl SqlDialect {
    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            SqlDialect::Duckdb => &DUCKDB,
            SqlDialect::Postgres => &POSTGRES,
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlDialect::Duckdb => write!(f, "duckdb"),
            SqlDialect::Postgres => write!(f, "postgres"),
        }
    }
}
