//! Filter descriptor definitions
//!
//! A [`ResourceFilter`] is one column-level constraint as sent by callers:
//!
//! ```json
//! {"dataType": "number", "type": "equals", "value": 225, "column": "value", "tolerance": 0.5}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::error::FilterError;
use crate::data::predicate::FieldPath;

/// Kind of the filtered column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Number,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Text => write!(f, "text"),
            DataType::Number => write!(f, "number"),
        }
    }
}

/// Filter operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    Contains,
    StartsWith,
    Equals,
    NotEqual,
    LessThanOrEqual,
    GreaterThanOrEqual,
    In,
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterType::Contains => "contains",
            FilterType::StartsWith => "startsWith",
            FilterType::Equals => "equals",
            FilterType::NotEqual => "notEqual",
            FilterType::LessThanOrEqual => "lessThanOrEqual",
            FilterType::GreaterThanOrEqual => "greaterThanOrEqual",
            FilterType::In => "in",
        };
        write!(f, "{}", name)
    }
}

/// Single filter operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(f64),
    Text(String),
}

impl ScalarValue {
    /// Text form of the operand
    pub fn as_text(&self) -> String {
        match self {
            ScalarValue::Number(n) => n.to_string(),
            ScalarValue::Text(s) => s.clone(),
        }
    }

    /// Numeric form of the operand; text must parse as a finite number
    pub fn as_number(&self) -> Result<f64, FilterError> {
        let n = match self {
            ScalarValue::Number(n) => *n,
            ScalarValue::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                FilterError::invalid(format!("Value '{}' is not a number", s))
            })?,
        };
        if !n.is_finite() {
            return Err(FilterError::invalid(format!(
                "Value '{}' is not a finite number",
                n
            )));
        }
        Ok(n)
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Text(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::Text(s)
    }
}

impl From<f64> for ScalarValue {
    fn from(n: f64) -> Self {
        ScalarValue::Number(n)
    }
}

/// Filter operand: a scalar or a list of scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    List(Vec<ScalarValue>),
    Scalar(ScalarValue),
}

impl FilterValue {
    pub fn is_list(&self) -> bool {
        matches!(self, FilterValue::List(_))
    }
}

impl<T: Into<ScalarValue>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        FilterValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Scalar(s.into())
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        FilterValue::Scalar(n.into())
    }
}

/// Column-level filter descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFilter {
    pub data_type: DataType,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub value: FilterValue,
    /// Dotted path; each dot traverses one relationship
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

impl ResourceFilter {
    pub fn new(
        data_type: DataType,
        filter_type: FilterType,
        value: impl Into<FilterValue>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            data_type,
            filter_type,
            value: value.into(),
            column: column.into(),
            tolerance: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// TEXT / IN descriptor over `column`
    pub fn text_in(column: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(DataType::Text, FilterType::In, values, column)
    }

    /// True when the column traverses a relationship
    pub fn is_nested(&self) -> bool {
        self.column.contains('.')
    }

    /// Check the operator / data type / value combination
    pub fn validate(&self) -> Result<(), FilterError> {
        FieldPath::parse(&self.column)?;

        if let Some(tolerance) = self.tolerance
            && (!tolerance.is_finite() || tolerance < 0.0)
        {
            return Err(FilterError::invalid(format!(
                "Tolerance must be a non-negative number, got {}",
                tolerance
            )));
        }

        match (self.data_type, self.filter_type) {
            (DataType::Text, FilterType::Equals | FilterType::StartsWith) => {
                self.scalar().map(|_| ())
            }
            (DataType::Text, FilterType::Contains) => Ok(()),
            (DataType::Text, FilterType::In) => self.list().map(|_| ()),
            (
                DataType::Number,
                FilterType::Equals
                | FilterType::NotEqual
                | FilterType::LessThanOrEqual
                | FilterType::GreaterThanOrEqual,
            ) => self.scalar()?.as_number().map(|_| ()),
            (data_type, filter_type) => Err(FilterError::invalid(format!(
                "Operator '{}' is not supported for {} filters (column {})",
                filter_type, data_type, self.column
            ))),
        }
    }

    /// Scalar operand, or an invalid filter error for list values
    pub fn scalar(&self) -> Result<&ScalarValue, FilterError> {
        match &self.value {
            FilterValue::Scalar(v) => Ok(v),
            FilterValue::List(_) => Err(FilterError::invalid(format!(
                "Operator '{}' requires a single value (column {})",
                self.filter_type, self.column
            ))),
        }
    }

    /// List operand, or an invalid filter error for scalar values
    pub fn list(&self) -> Result<&[ScalarValue], FilterError> {
        match &self.value {
            FilterValue::List(v) => Ok(v),
            FilterValue::Scalar(_) => Err(FilterError::invalid(format!(
                "Operator '{}' requires a list value (column {})",
                self.filter_type, self.column
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_wire_names() {
        let json = r#"{"dataType":"number","type":"greaterThanOrEqual","value":225,"column":"value","tolerance":0.5}"#;
        let filter: ResourceFilter = serde_json::from_str(json).unwrap();
        assert_eq!(filter.data_type, DataType::Number);
        assert_eq!(filter.filter_type, FilterType::GreaterThanOrEqual);
        assert_eq!(filter.value, FilterValue::Scalar(ScalarValue::Number(225.0)));
        assert_eq!(filter.tolerance, Some(0.5));
    }

    #[test]
    fn deserialize_list_value() {
        let json = r#"{"dataType":"text","type":"in","value":["a","b"],"column":"subjectId"}"#;
        let filter: ResourceFilter = serde_json::from_str(json).unwrap();
        assert!(filter.value.is_list());
        assert_eq!(filter.tolerance, None);
        assert!(filter.validate().is_ok());
    }

    #[test]
    fn serialize_skips_missing_tolerance() {
        let filter = ResourceFilter::text_in("subjectId", vec!["l1".into()]);
        let json = serde_json::to_string(&filter).unwrap();
        assert_eq!(
            json,
            r#"{"dataType":"text","type":"in","value":["l1"],"column":"subjectId"}"#
        );
    }

    #[test]
    fn number_in_is_invalid() {
        let filter = ResourceFilter::new(DataType::Number, FilterType::In, vec![1.0], "value");
        assert!(matches!(
            filter.validate(),
            Err(FilterError::InvalidFilter(_))
        ));
    }

    #[test]
    fn text_ordering_is_invalid() {
        for op in [FilterType::LessThanOrEqual, FilterType::GreaterThanOrEqual] {
            let filter = ResourceFilter::new(DataType::Text, op, "a", "subjectId");
            assert!(filter.validate().is_err(), "{op} should be rejected for text");
        }
    }

    #[test]
    fn text_not_equal_and_number_contains_are_invalid() {
        assert!(
            ResourceFilter::new(DataType::Text, FilterType::NotEqual, "a", "c")
                .validate()
                .is_err()
        );
        assert!(
            ResourceFilter::new(DataType::Number, FilterType::Contains, 1.0, "c")
                .validate()
                .is_err()
        );
        assert!(
            ResourceFilter::new(DataType::Number, FilterType::StartsWith, 1.0, "c")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn in_requires_list() {
        let filter = ResourceFilter::new(DataType::Text, FilterType::In, "a", "subjectId");
        assert!(filter.validate().is_err());
    }

    #[test]
    fn numeric_text_operand_must_parse() {
        let ok = ResourceFilter::new(DataType::Number, FilterType::Equals, " 12.5 ", "value");
        assert!(ok.validate().is_ok());
        let bad = ResourceFilter::new(DataType::Number, FilterType::Equals, "twelve", "value");
        assert!(bad.validate().is_err());
    }

    #[test]
    fn tolerance_must_be_non_negative() {
        let filter =
            ResourceFilter::new(DataType::Number, FilterType::Equals, 1.0, "value").with_tolerance(-0.1);
        assert!(filter.validate().is_err());
    }

    #[test]
    fn nested_columns() {
        let filter = ResourceFilter::new(DataType::Text, FilterType::Equals, "x", "contingency.id");
        assert!(filter.is_nested());
        let bad = ResourceFilter::new(DataType::Text, FilterType::Equals, "x", "contingency.");
        assert!(bad.validate().is_err());
    }
}
