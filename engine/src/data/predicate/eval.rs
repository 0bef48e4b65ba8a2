//! In-memory predicate evaluation
//!
//! Evaluates a [`Predicate`] against JSON records. Traversing an array along a
//! path behaves like a join: a leaf holds when any reached value satisfies it.
//! Leaves on missing or null values never hold, matching SQL NULL semantics
//! for comparisons.

use serde_json::Value;
use uuid::Uuid;

use super::types::{FieldPath, Literal, Predicate, TextOp};

impl Predicate {
    /// Check whether a record satisfies this predicate
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Predicate::Const(b) => *b,
            Predicate::And(parts) => parts.iter().all(|p| p.matches(record)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(record)),
            Predicate::Not(inner) => !inner.matches(record),
            Predicate::Equals { path, value } => resolve(record, path)
                .into_iter()
                .any(|v| literal_matches(v, value)),
            Predicate::Text { path, op, value } => {
                let expected = value.to_uppercase();
                resolve(record, path)
                    .into_iter()
                    .filter_map(as_text)
                    .any(|stored| {
                        let stored = stored.to_uppercase();
                        match op {
                            TextOp::Equals => stored == expected,
                            TextOp::Contains => stored.contains(&expected),
                            TextOp::StartsWith => stored.starts_with(&expected),
                        }
                    })
            }
            Predicate::Number { path, op, value } => resolve(record, path)
                .into_iter()
                .filter_map(as_number)
                .any(|stored| op.apply(stored, *value)),
            Predicate::Between { path, low, high } => resolve(record, path)
                .into_iter()
                .filter_map(as_number)
                .any(|stored| stored >= *low && stored <= *high),
            Predicate::In { path, values } => resolve(record, path)
                .into_iter()
                .any(|v| values.iter().any(|lit| member_matches(v, lit))),
        }
    }

    /// Keep the records satisfying this predicate
    pub fn filter_records<'a>(&self, records: &'a [Value]) -> Vec<&'a Value> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Collect every value reachable through `path`, flattening arrays
fn resolve<'a>(record: &'a Value, path: &FieldPath) -> Vec<&'a Value> {
    let mut current = vec![record];
    for segment in path.segments() {
        let mut next = Vec::new();
        for value in current {
            collect_field(value, segment, &mut next);
        }
        if next.is_empty() {
            return next;
        }
        current = next;
    }

    let mut leaves = Vec::with_capacity(current.len());
    for value in current {
        match value {
            Value::Array(items) => leaves.extend(items.iter()),
            Value::Null => {}
            other => leaves.push(other),
        }
    }
    leaves
}

fn collect_field<'a>(value: &'a Value, segment: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if let Some(v) = map.get(segment) {
                out.push(v);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_field(item, segment, out);
            }
        }
        _ => {}
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn literal_matches(stored: &Value, literal: &Literal) -> bool {
    match literal {
        Literal::Text(expected) => as_text(stored).is_some_and(|s| s == *expected),
        Literal::Number(expected) => as_number(stored).is_some_and(|n| n == *expected),
        Literal::Uuid(expected) => match stored {
            Value::String(s) => Uuid::parse_str(s).is_ok_and(|u| u == *expected),
            _ => false,
        },
    }
}

/// Membership folds case for text operands, like the text comparisons
fn member_matches(stored: &Value, literal: &Literal) -> bool {
    match literal {
        Literal::Text(expected) => {
            as_text(stored).is_some_and(|s| s.to_uppercase() == expected.to_uppercase())
        }
        other => literal_matches(stored, other),
    }
}
