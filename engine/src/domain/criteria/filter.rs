//! Named filter metadata served by the filter store

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::network::EquipmentType;

use super::rules::ExpertRule;

/// Rule-tree filter over one equipment category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertFilter {
    pub id: Uuid,
    pub equipment_type: EquipmentType,
    /// Root rule; `None` matches every equipment of the category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<ExpertRule>,
}

/// Explicit list of equipment ids of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierListFilter {
    pub id: Uuid,
    pub equipment_type: EquipmentType,
    pub equipment_ids: Vec<String>,
}

/// Named ("generic") filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenericFilter {
    Expert(ExpertFilter),
    IdentifierList(IdentifierListFilter),
}

impl GenericFilter {
    pub fn id(&self) -> Uuid {
        match self {
            GenericFilter::Expert(f) => f.id,
            GenericFilter::IdentifierList(f) => f.id,
        }
    }

    pub fn equipment_type(&self) -> EquipmentType {
        match self {
            GenericFilter::Expert(f) => f.equipment_type,
            GenericFilter::IdentifierList(f) => f.equipment_type,
        }
    }

    /// Other filters this one refers to through FILTER_UUID rules
    pub fn referenced_filters(&self) -> Vec<Uuid> {
        match self {
            GenericFilter::Expert(ExpertFilter {
                rules: Some(rule), ..
            }) => rule.referenced_filters(),
            _ => Vec::new(),
        }
    }
}
