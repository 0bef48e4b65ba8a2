//! Global filter
//!
//! Network-level criteria attached to a result query: nominal voltages,
//! countries, named filters and substation properties. An absent or empty
//! facet constrains nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::error::FilterError;

/// Kind of limit violation, carried for callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitViolationType {
    ActivePower,
    ApparentPower,
    Current,
    LowVoltage,
    HighVoltage,
    LowVoltageAngle,
    HighVoltageAngle,
    LowShortCircuitCurrent,
    HighShortCircuitCurrent,
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_v: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_filter: Option<Vec<Uuid>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_violations_types: Option<Vec<LimitViolationType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substation_property: Option<BTreeMap<String, Vec<String>>>,
}

impl GlobalFilter {
    pub fn nominal_voltages(&self) -> &[String] {
        self.nominal_v.as_deref().unwrap_or_default()
    }

    pub fn country_codes(&self) -> &[String] {
        self.country_code.as_deref().unwrap_or_default()
    }

    pub fn generic_filters(&self) -> &[Uuid] {
        self.generic_filter.as_deref().unwrap_or_default()
    }

    pub fn limit_violation_types(&self) -> &[LimitViolationType] {
        self.limit_violations_types.as_deref().unwrap_or_default()
    }

    /// Property name to allowed values, skipping properties without values
    pub fn substation_properties(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.substation_property
            .iter()
            .flatten()
            .filter(|(_, values)| !values.is_empty())
    }

    /// True when no equipment facet constrains anything
    pub fn is_empty(&self) -> bool {
        self.nominal_voltages().is_empty()
            && self.country_codes().is_empty()
            && self.generic_filters().is_empty()
            && self.substation_properties().next().is_none()
    }
}

/// Parse a global filter; blank input or `null` means none
pub fn parse_global_filter(json_str: &str) -> Result<Option<GlobalFilter>, FilterError> {
    if json_str.trim().is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str(json_str)?)
}
