//! Network filter evaluator
//!
//! Runs expert rule trees and identifier lists against a [`NetworkSnapshot`]
//! and returns matching equipment ids in network order. Filters defined on
//! voltage levels can be re-expressed for connected categories.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::data::error::FilterError;
use crate::domain::criteria::{
    CombinatorType, ExpertFilter, ExpertRule, FieldType, GenericFilter, OperatorType,
    build_filter_with_voltage_level_ids, voltage_level_id_fields,
};
use crate::domain::network::{Candidate, EquipmentType, NetworkSnapshot, Substation};

/// Ids matched by already evaluated filters, keyed by filter id
///
/// Layers shadow their parent, so a scoped resolution never leaks into the
/// caller's view.
#[derive(Debug, Default)]
pub struct FilterRefs<'p> {
    resolved: FxHashMap<Uuid, FxHashSet<String>>,
    parent: Option<&'p FilterRefs<'p>>,
}

impl<'p> FilterRefs<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Child layer inheriting every resolution of `self`
    pub fn layer(&self) -> FilterRefs<'_> {
        FilterRefs {
            resolved: FxHashMap::default(),
            parent: Some(self),
        }
    }

    pub fn insert(&mut self, filter_id: Uuid, ids: impl IntoIterator<Item = String>) {
        self.resolved.insert(filter_id, ids.into_iter().collect());
    }

    pub fn get(&self, filter_id: &Uuid) -> Option<&FxHashSet<String>> {
        self.resolved
            .get(filter_id)
            .or_else(|| self.parent.and_then(|p| p.get(filter_id)))
    }

    pub fn contains(&self, filter_id: &Uuid) -> bool {
        self.get(filter_id).is_some()
    }
}

/// Whether a filter of category `native` can produce ids of `target`
pub fn applies_to(native: EquipmentType, target: EquipmentType) -> bool {
    native == target
        || (native == EquipmentType::VoltageLevel && !voltage_level_id_fields(target).is_empty())
}

enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
    Properties(&'a BTreeMap<String, String>),
}

pub struct NetworkFilterEvaluator<'a> {
    network: &'a NetworkSnapshot,
}

impl<'a> NetworkFilterEvaluator<'a> {
    pub fn new(network: &'a NetworkSnapshot) -> Self {
        Self { network }
    }

    /// Ids matched by `filter` at its own category
    pub fn evaluate(&self, filter: &GenericFilter, refs: &FilterRefs) -> Result<Vec<String>, FilterError> {
        match filter {
            GenericFilter::Expert(expert) => self.evaluate_expert(expert, refs),
            GenericFilter::IdentifierList(list) => {
                let present = self.network.ids_of(list.equipment_type);
                let mut seen = FxHashSet::default();
                Ok(list
                    .equipment_ids
                    .iter()
                    .filter(|id| present.contains(id.as_str()) && seen.insert(id.as_str()))
                    .cloned()
                    .collect())
            }
        }
    }

    pub fn evaluate_expert(&self, filter: &ExpertFilter, refs: &FilterRefs) -> Result<Vec<String>, FilterError> {
        let mut ids = Vec::new();
        for candidate in self.network.candidates(filter.equipment_type) {
            let matched = match &filter.rules {
                Some(rule) => self.matches(rule, &candidate, refs)?,
                None => true,
            };
            if matched {
                ids.push(candidate.id.to_string());
            }
        }
        trace!(
            filter_id = %filter.id,
            equipment_type = %filter.equipment_type,
            matched = ids.len(),
            "Evaluated expert filter"
        );
        Ok(ids)
    }

    /// Ids of `target` selected by a named filter
    ///
    /// Same category: evaluated directly. Voltage level filter: evaluated
    /// natively, then re-evaluated as a connectivity rule on `target`. Any
    /// other combination matches nothing.
    pub fn extract_equipment_ids_from_generic_filter(
        &self,
        filter: &GenericFilter,
        target: EquipmentType,
        refs: &FilterRefs,
    ) -> Result<Vec<String>, FilterError> {
        let native = filter.equipment_type();
        if native == target {
            return self.evaluate(filter, refs);
        }
        if native != EquipmentType::VoltageLevel {
            debug!(filter_id = %filter.id(), %native, %target, "Filter category unrelated to target");
            return Ok(Vec::new());
        }
        let Some(connectivity) = build_filter_with_voltage_level_ids(filter.id(), target) else {
            debug!(filter_id = %filter.id(), %target, "Target has no voltage level id field");
            return Ok(Vec::new());
        };

        let voltage_levels = self.evaluate(filter, refs)?;
        let mut scoped = refs.layer();
        scoped.insert(filter.id(), voltage_levels);
        self.evaluate_expert(&connectivity, &scoped)
    }

    /// Evaluate a referenced filter and record its ids in `refs`
    ///
    /// Referenced filters may not reference other filters themselves.
    pub fn resolve_reference(&self, filter: &GenericFilter, refs: &mut FilterRefs) -> Result<(), FilterError> {
        if let Some(nested) = filter
            .referenced_filters()
            .into_iter()
            .find(|id| !refs.contains(id))
        {
            return Err(FilterError::invalid(format!(
                "Filter {} references filter {}; only one level of filter references is supported",
                filter.id(),
                nested
            )));
        }
        let ids = self.evaluate(filter, refs)?;
        refs.insert(filter.id(), ids);
        Ok(())
    }

    fn matches(&self, rule: &ExpertRule, candidate: &Candidate<'_>, refs: &FilterRefs) -> Result<bool, FilterError> {
        match rule {
            ExpertRule::Combinator { combinator, rules } => match combinator {
                CombinatorType::And => {
                    for rule in rules {
                        if !self.matches(rule, candidate, refs)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                CombinatorType::Or => {
                    for rule in rules {
                        if self.matches(rule, candidate, refs)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
            },
            ExpertRule::Number {
                field,
                operator,
                value,
                values,
            } => {
                let Some(FieldValue::Number(stored)) = field_value(candidate, *field) else {
                    return Ok(false);
                };
                match operator {
                    OperatorType::In => Ok(values.contains(&stored)),
                    OperatorType::NotIn => Ok(!values.contains(&stored)),
                    OperatorType::Equals => Ok(stored == required(value, *field)?),
                    OperatorType::NotEquals => Ok(stored != required(value, *field)?),
                    OperatorType::LowerOrEquals => Ok(stored <= required(value, *field)?),
                    OperatorType::GreaterOrEquals => Ok(stored >= required(value, *field)?),
                    other => Err(unsupported(*other, *field)),
                }
            }
            ExpertRule::Enum {
                field,
                operator,
                value,
                values,
            }
            | ExpertRule::String {
                field,
                operator,
                value,
                values,
            } => {
                let Some(FieldValue::Text(stored)) = field_value(candidate, *field) else {
                    return Ok(false);
                };
                match operator {
                    OperatorType::In => Ok(values.iter().any(|v| v == stored)),
                    OperatorType::NotIn => Ok(!values.iter().any(|v| v == stored)),
                    OperatorType::Equals => Ok(required(value, *field)? == stored),
                    OperatorType::NotEquals => Ok(required(value, *field)? != stored),
                    other => Err(unsupported(*other, *field)),
                }
            }
            ExpertRule::Properties {
                field,
                operator,
                property_name,
                property_values,
            } => {
                let Some(FieldValue::Properties(properties)) = field_value(candidate, *field) else {
                    return Ok(false);
                };
                let Some(stored) = properties.get(property_name) else {
                    return Ok(false);
                };
                match operator {
                    OperatorType::In => Ok(property_values.contains(stored)),
                    OperatorType::NotIn => Ok(!property_values.contains(stored)),
                    other => Err(unsupported(*other, *field)),
                }
            }
            ExpertRule::FilterUuid {
                field,
                operator,
                values,
            } => {
                let Some(FieldValue::Text(stored)) = field_value(candidate, *field) else {
                    return Ok(false);
                };
                let mut member = false;
                for filter_id in values {
                    let ids = refs
                        .get(filter_id)
                        .ok_or_else(|| FilterError::filters_not_found(&[*filter_id]))?;
                    member |= ids.contains(stored);
                }
                match operator {
                    OperatorType::IsPartOf => Ok(member),
                    OperatorType::IsNotPartOf => Ok(!member),
                    other => Err(unsupported(*other, *field)),
                }
            }
        }
    }
}

fn field_value<'a>(candidate: &Candidate<'a>, field: FieldType) -> Option<FieldValue<'a>> {
    let side = candidate.sides.get(field.side());
    let substation = || -> Option<&'a Substation> {
        candidate.substation.or_else(|| side.and_then(|s| s.substation))
    };
    match field {
        FieldType::Id => Some(FieldValue::Text(candidate.id)),
        FieldType::NominalVoltage | FieldType::NominalVoltage1 | FieldType::NominalVoltage2 => {
            side.map(|s| FieldValue::Number(s.voltage_level.nominal_v))
        }
        FieldType::Country | FieldType::Country1 | FieldType::Country2 => substation()
            .and_then(|s| s.country.as_deref())
            .map(FieldValue::Text),
        FieldType::SubstationProperties
        | FieldType::SubstationProperties1
        | FieldType::SubstationProperties2 => {
            substation().map(|s| FieldValue::Properties(&s.properties))
        }
        FieldType::VoltageLevelId
        | FieldType::VoltageLevelId1
        | FieldType::VoltageLevelId2
        | FieldType::VoltageLevelId3 => {
            side.map(|s| FieldValue::Text(s.voltage_level.id.as_str()))
        }
    }
}

fn required<T: Clone>(value: &Option<T>, field: FieldType) -> Result<T, FilterError> {
    value
        .clone()
        .ok_or_else(|| FilterError::invalid(format!("Rule on {} requires a value", field)))
}

fn unsupported(operator: OperatorType, field: FieldType) -> FilterError {
    FilterError::invalid(format!(
        "Operator {:?} is not supported on field {}",
        operator, field
    ))
}
