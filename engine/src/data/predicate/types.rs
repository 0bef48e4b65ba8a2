//! Predicate algebra
//!
//! A small tree of boolean nodes that storage adapters translate into their
//! own query language. Leaves address a column through a [`FieldPath`]; a
//! path with more than one segment traverses related entities.

use std::fmt;

use uuid::Uuid;

use crate::data::error::FilterError;

/// Dotted path to a column, one relationship hop per dot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted column path (`"parent.value"`)
    pub fn parse(column: &str) -> Result<Self, FilterError> {
        let column = column.trim();
        if column.is_empty() {
            return Err(FilterError::invalid("Filter column must not be empty"));
        }
        let segments: Vec<String> = column.split('.').map(|s| s.trim().to_string()).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(FilterError::invalid(format!(
                "Filter column contains an empty path segment: {}",
                column
            )));
        }
        Ok(Self { segments })
    }

    /// Path to a column of the root entity
    pub fn root(column: impl Into<String>) -> Self {
        Self {
            segments: vec![column.into()],
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Relationship hops before the column
    pub fn relations(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Final column name
    pub fn column(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// True when the path traverses at least one relationship
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Literal operand bound into a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(f64),
    Uuid(Uuid),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => write!(f, "{}", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Uuid(u) => write!(f, "{}", u),
        }
    }
}

/// Case-insensitive text comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    Equals,
    Contains,
    StartsWith,
}

/// Numeric comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl NumberOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            NumberOp::Eq => "=",
            NumberOp::Ne => "<>",
            NumberOp::Lt => "<",
            NumberOp::Le => "<=",
            NumberOp::Gt => ">",
            NumberOp::Ge => ">=",
        }
    }

    pub fn apply(&self, stored: f64, operand: f64) -> bool {
        match self {
            NumberOp::Eq => stored == operand,
            NumberOp::Ne => stored != operand,
            NumberOp::Lt => stored < operand,
            NumberOp::Le => stored <= operand,
            NumberOp::Gt => stored > operand,
            NumberOp::Ge => stored >= operand,
        }
    }
}

/// Composable boolean predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Always true / always false
    Const(bool),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    /// Exact equality on the raw column (no cast, case-sensitive)
    Equals { path: FieldPath, value: Literal },
    /// Case-insensitive comparison of the column cast to text
    Text {
        path: FieldPath,
        op: TextOp,
        value: String,
    },
    /// Comparison of the column cast to a number
    Number {
        path: FieldPath,
        op: NumberOp,
        value: f64,
    },
    /// Inclusive numeric window
    Between { path: FieldPath, low: f64, high: f64 },
    /// Membership in a literal list
    In { path: FieldPath, values: Vec<Literal> },
}

impl Predicate {
    /// Conjunction; flattens nested ANDs and folds constants
    pub fn and(parts: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Predicate::Const(true) => {}
                Predicate::Const(false) => return Predicate::Const(false),
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::Const(true),
            1 => flat.remove(0),
            _ => Predicate::And(flat),
        }
    }

    /// Disjunction; flattens nested ORs and folds constants
    pub fn or(parts: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Predicate::Const(false) => {}
                Predicate::Const(true) => return Predicate::Const(true),
                Predicate::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::Const(false),
            1 => flat.remove(0),
            _ => Predicate::Or(flat),
        }
    }

    /// Negation; folds constants and double negation
    pub fn negate(predicate: Predicate) -> Predicate {
        match predicate {
            Predicate::Const(b) => Predicate::Const(!b),
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    pub fn equals(path: FieldPath, value: Literal) -> Predicate {
        Predicate::Equals { path, value }
    }

    pub fn text(path: FieldPath, op: TextOp, value: impl Into<String>) -> Predicate {
        Predicate::Text {
            path,
            op,
            value: value.into(),
        }
    }

    pub fn number(path: FieldPath, op: NumberOp, value: f64) -> Predicate {
        Predicate::Number { path, op, value }
    }

    pub fn between(path: FieldPath, low: f64, high: f64) -> Predicate {
        Predicate::Between { path, low, high }
    }

    /// Membership test; an empty list never matches
    pub fn is_in(path: FieldPath, values: Vec<Literal>) -> Predicate {
        if values.is_empty() {
            return Predicate::Const(false);
        }
        Predicate::In { path, values }
    }

    /// Number of leaf nodes
    pub fn leaf_count(&self) -> usize {
        match self {
            Predicate::And(parts) | Predicate::Or(parts) => {
                parts.iter().map(Predicate::leaf_count).sum()
            }
            Predicate::Not(inner) => inner.leaf_count(),
            _ => 1,
        }
    }
}
