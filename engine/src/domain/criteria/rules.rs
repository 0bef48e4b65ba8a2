//! Expert rule tree
//!
//! Elementary equipment-matching rules: leaves compare one equipment field
//! with a value or value list, combinators join child rules with AND / OR.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Equipment attribute a rule reads; `_1` / `_2` select a side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Id,
    NominalVoltage,
    #[serde(rename = "NOMINAL_VOLTAGE_1")]
    NominalVoltage1,
    #[serde(rename = "NOMINAL_VOLTAGE_2")]
    NominalVoltage2,
    Country,
    #[serde(rename = "COUNTRY_1")]
    Country1,
    #[serde(rename = "COUNTRY_2")]
    Country2,
    SubstationProperties,
    #[serde(rename = "SUBSTATION_PROPERTIES_1")]
    SubstationProperties1,
    #[serde(rename = "SUBSTATION_PROPERTIES_2")]
    SubstationProperties2,
    VoltageLevelId,
    #[serde(rename = "VOLTAGE_LEVEL_ID_1")]
    VoltageLevelId1,
    #[serde(rename = "VOLTAGE_LEVEL_ID_2")]
    VoltageLevelId2,
    #[serde(rename = "VOLTAGE_LEVEL_ID_3")]
    VoltageLevelId3,
}

impl FieldType {
    /// Side index the field reads (0-based); unsided fields read the first side
    pub fn side(&self) -> usize {
        match self {
            FieldType::NominalVoltage2
            | FieldType::Country2
            | FieldType::SubstationProperties2
            | FieldType::VoltageLevelId2 => 1,
            FieldType::VoltageLevelId3 => 2,
            _ => 0,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Id => "ID",
            FieldType::NominalVoltage => "NOMINAL_VOLTAGE",
            FieldType::NominalVoltage1 => "NOMINAL_VOLTAGE_1",
            FieldType::NominalVoltage2 => "NOMINAL_VOLTAGE_2",
            FieldType::Country => "COUNTRY",
            FieldType::Country1 => "COUNTRY_1",
            FieldType::Country2 => "COUNTRY_2",
            FieldType::SubstationProperties => "SUBSTATION_PROPERTIES",
            FieldType::SubstationProperties1 => "SUBSTATION_PROPERTIES_1",
            FieldType::SubstationProperties2 => "SUBSTATION_PROPERTIES_2",
            FieldType::VoltageLevelId => "VOLTAGE_LEVEL_ID",
            FieldType::VoltageLevelId1 => "VOLTAGE_LEVEL_ID_1",
            FieldType::VoltageLevelId2 => "VOLTAGE_LEVEL_ID_2",
            FieldType::VoltageLevelId3 => "VOLTAGE_LEVEL_ID_3",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorType {
    Equals,
    NotEquals,
    LowerOrEquals,
    GreaterOrEquals,
    In,
    NotIn,
    IsPartOf,
    IsNotPartOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombinatorType {
    And,
    Or,
}

/// Node of an expert rule tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpertRule {
    Combinator {
        combinator: CombinatorType,
        rules: Vec<ExpertRule>,
    },
    Number {
        field: FieldType,
        operator: OperatorType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        values: Vec<f64>,
    },
    Enum {
        field: FieldType,
        operator: OperatorType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        values: Vec<String>,
    },
    String {
        field: FieldType,
        operator: OperatorType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        values: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Properties {
        field: FieldType,
        operator: OperatorType,
        property_name: String,
        property_values: Vec<String>,
    },
    /// Field value must (not) belong to the ids matched by other filters
    FilterUuid {
        field: FieldType,
        operator: OperatorType,
        values: Vec<Uuid>,
    },
}

impl ExpertRule {
    pub fn combinator(combinator: CombinatorType, rules: Vec<ExpertRule>) -> Self {
        ExpertRule::Combinator { combinator, rules }
    }

    /// Filter ids referenced anywhere in this tree
    pub fn referenced_filters(&self) -> Vec<Uuid> {
        let mut ids = Vec::new();
        self.collect_references(&mut ids);
        ids
    }

    fn collect_references(&self, ids: &mut Vec<Uuid>) {
        match self {
            ExpertRule::Combinator { rules, .. } => {
                for rule in rules {
                    rule.collect_references(ids);
                }
            }
            ExpertRule::FilterUuid { values, .. } => {
                for id in values {
                    if !ids.contains(id) {
                        ids.push(*id);
                    }
                }
            }
            _ => {}
        }
    }
}
