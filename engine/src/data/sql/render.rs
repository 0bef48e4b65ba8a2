//! SQL rendering of predicates
//!
//! Turns a [`Predicate`] into a parameterized WHERE clause fragment. Text
//! comparisons and text membership run on the upper-cased text cast of the
//! column; operands are upper-cased here so only bind values carry user input.

use std::fmt;

use uuid::Uuid;

use crate::data::predicate::{FieldPath, Literal, Predicate, TextOp};
use crate::utils::sql::escape_like_pattern;

use super::dialect::Dialect;

/// Typed bind value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Number(f64),
    Uuid(Uuid),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            SqlValue::Number(n) => write!(f, "{}", n),
            SqlValue::Uuid(u) => write!(f, "'{}'", u),
        }
    }
}

/// Collects SQL parameters during rendering (maintains insertion order)
#[derive(Debug, Default)]
pub struct SqlParams {
    pub values: Vec<SqlValue>,
}

impl SqlParams {
    fn bind(&mut self, dialect: &dyn Dialect, value: SqlValue) -> String {
        let placeholder = dialect.placeholder(self.values.len());
        self.values.push(value);
        placeholder
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Renders predicates for one dialect
///
/// Root columns are qualified with the table alias when one is set. Nested
/// paths are qualified with their relation names, which callers use as join
/// aliases (`"limit_violations"."subject_id"`).
pub struct SqlRenderer<'a> {
    dialect: &'a dyn Dialect,
    alias: &'a str,
}

impl<'a> SqlRenderer<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect, alias: "" }
    }

    /// Qualify root columns with a table alias (empty for none)
    pub fn with_alias(mut self, alias: &'a str) -> Self {
        self.alias = alias;
        self
    }

    /// Render `predicate`, appending its bind values to `params`
    pub fn render(&self, predicate: &Predicate, params: &mut SqlParams) -> String {
        match predicate {
            Predicate::Const(true) => "1=1".to_string(),
            Predicate::Const(false) => "1=0".to_string(),
            Predicate::And(parts) => self.render_group(parts, " AND ", params),
            Predicate::Or(parts) => self.render_group(parts, " OR ", params),
            Predicate::Not(inner) => format!("NOT ({})", self.render(inner, params)),
            Predicate::Equals { path, value } => {
                let col = self.column(path);
                let placeholder = params.bind(self.dialect, literal_value(value));
                format!("{} = {}", col, placeholder)
            }
            Predicate::Text { path, op, value } => {
                let col = format!("UPPER({})", self.dialect.text_cast(&self.column(path)));
                let upper = value.to_uppercase();
                match op {
                    TextOp::Equals => {
                        let placeholder = params.bind(self.dialect, SqlValue::Text(upper));
                        format!("{} = {}", col, placeholder)
                    }
                    TextOp::Contains => {
                        let pattern = format!("%{}%", escape_like_pattern(&upper));
                        let placeholder = params.bind(self.dialect, SqlValue::Text(pattern));
                        format!("{} LIKE {} ESCAPE '\\'", col, placeholder)
                    }
                    TextOp::StartsWith => {
                        let pattern = format!("{}%", escape_like_pattern(&upper));
                        let placeholder = params.bind(self.dialect, SqlValue::Text(pattern));
                        format!("{} LIKE {} ESCAPE '\\'", col, placeholder)
                    }
                }
            }
            Predicate::Number { path, op, value } => {
                let col = self.dialect.number_cast(&self.column(path));
                let placeholder = params.bind(self.dialect, SqlValue::Number(*value));
                format!("{} {} {}", col, op.as_sql(), placeholder)
            }
            Predicate::Between { path, low, high } => {
                let col = self.dialect.number_cast(&self.column(path));
                let low = params.bind(self.dialect, SqlValue::Number(*low));
                let high = params.bind(self.dialect, SqlValue::Number(*high));
                format!("{} BETWEEN {} AND {}", col, low, high)
            }
            Predicate::In { path, values } => {
                if values.is_empty() {
                    return "1=0".to_string();
                }
                let col = self.dialect.text_cast(&self.column(path));
                let fold = values.iter().all(|v| matches!(v, Literal::Text(_)));
                let col = if fold { format!("UPPER({})", col) } else { col };
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| {
                        let text = match v {
                            Literal::Text(s) => s.to_uppercase(),
                            other => other.to_string(),
                        };
                        params.bind(self.dialect, SqlValue::Text(text))
                    })
                    .collect();
                format!("{} IN ({})", col, placeholders.join(", "))
            }
        }
    }

    fn render_group(&self, parts: &[Predicate], joiner: &str, params: &mut SqlParams) -> String {
        let rendered: Vec<String> = parts.iter().map(|p| self.render(p, params)).collect();
        format!("({})", rendered.join(joiner))
    }

    fn column(&self, path: &FieldPath) -> String {
        let col = self.dialect.quote_identifier(path.column());
        if path.is_nested() {
            let relation = path
                .relations()
                .iter()
                .map(|r| self.dialect.quote_identifier(r))
                .collect::<Vec<_>>()
                .join(".");
            format!("{}.{}", relation, col)
        } else if self.alias.is_empty() {
            col
        } else {
            format!("{}.{}", self.dialect.quote_identifier(self.alias), col)
        }
    }
}

fn literal_value(literal: &Literal) -> SqlValue {
    match literal {
        Literal::Text(s) => SqlValue::Text(s.clone()),
        Literal::Number(n) => SqlValue::Number(*n),
        Literal::Uuid(u) => SqlValue::Uuid(*u),
    }
}
