//! Equipment criteria resolver
//!
//! Translates a [`GlobalFilter`] into expert rules scoped to one equipment
//! category: one leaf per requested value and applicable field, OR within a
//! facet, facets AND-ed in the resulting filter.

use tracing::debug;
use uuid::Uuid;

use crate::data::error::FilterError;
use crate::domain::network::EquipmentType;

use super::fields::{
    country_fields, nominal_voltage_fields, substation_property_fields, voltage_level_id_fields,
};
use super::filter::ExpertFilter;
use super::global::GlobalFilter;
use super::rules::{CombinatorType, ExpertRule, FieldType, OperatorType};

/// One EQUALS number leaf per value; values must parse as numbers
pub fn create_number_rules(field: FieldType, values: &[String]) -> Result<Vec<ExpertRule>, FilterError> {
    values
        .iter()
        .map(|raw| {
            let value = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| FilterError::invalid(format!("Invalid nominal voltage '{}'", raw)))?;
            Ok(ExpertRule::Number {
                field,
                operator: OperatorType::Equals,
                value: Some(value),
                values: Vec::new(),
            })
        })
        .collect()
}

/// One EQUALS enum leaf per value
pub fn create_enum_rules(field: FieldType, values: &[String]) -> Vec<ExpertRule> {
    values
        .iter()
        .map(|value| ExpertRule::Enum {
            field,
            operator: OperatorType::Equals,
            value: Some(value.clone()),
            values: Vec::new(),
        })
        .collect()
}

/// IN leaf on a substation property
pub fn create_properties_rule(property_name: &str, values: &[String], field: FieldType) -> ExpertRule {
    ExpertRule::Properties {
        field,
        operator: OperatorType::In,
        property_name: property_name.to_string(),
        property_values: values.to_vec(),
    }
}

pub fn create_combination(combinator: CombinatorType, rules: Vec<ExpertRule>) -> ExpertRule {
    ExpertRule::combinator(combinator, rules)
}

/// OR of `rules`; `None` when empty, the rule itself when single
pub fn create_or_combination(mut rules: Vec<ExpertRule>) -> Option<ExpertRule> {
    match rules.len() {
        0 => None,
        1 => rules.pop(),
        _ => Some(create_combination(CombinatorType::Or, rules)),
    }
}

pub fn build_nominal_voltage_rules(
    values: &[String],
    equipment_type: EquipmentType,
) -> Result<Option<ExpertRule>, FilterError> {
    let mut rules = Vec::new();
    for field in nominal_voltage_fields(equipment_type) {
        rules.extend(create_number_rules(*field, values)?);
    }
    Ok(create_or_combination(rules))
}

pub fn build_country_code_rules(values: &[String], equipment_type: EquipmentType) -> Option<ExpertRule> {
    let rules = country_fields(equipment_type)
        .iter()
        .flat_map(|field| create_enum_rules(*field, values))
        .collect();
    create_or_combination(rules)
}

pub fn build_substation_property_rules<'a>(
    properties: impl IntoIterator<Item = (&'a String, &'a Vec<String>)>,
    equipment_type: EquipmentType,
) -> Option<ExpertRule> {
    let fields = substation_property_fields(equipment_type);
    let rules = properties
        .into_iter()
        .flat_map(|(name, values)| {
            fields
                .iter()
                .map(move |field| create_properties_rule(name, values, *field))
        })
        .collect();
    create_or_combination(rules)
}

/// One rule per populated facet applicable to `equipment_type`
pub fn build_all_rules(
    global_filter: &GlobalFilter,
    equipment_type: EquipmentType,
) -> Result<Vec<ExpertRule>, FilterError> {
    let mut rules = Vec::new();
    rules.extend(build_nominal_voltage_rules(
        global_filter.nominal_voltages(),
        equipment_type,
    )?);
    rules.extend(build_country_code_rules(
        global_filter.country_codes(),
        equipment_type,
    ));
    rules.extend(build_substation_property_rules(
        global_filter.substation_properties(),
        equipment_type,
    ));
    Ok(rules)
}

/// AND of every facet rule, or `None` when nothing applies
pub fn build_expert_filter(
    global_filter: &GlobalFilter,
    equipment_type: EquipmentType,
) -> Result<Option<ExpertFilter>, FilterError> {
    let rules = build_all_rules(global_filter, equipment_type)?;
    if rules.is_empty() {
        return Ok(None);
    }
    debug!(%equipment_type, facets = rules.len(), "Built expert filter from global filter");
    Ok(Some(ExpertFilter {
        id: Uuid::new_v4(),
        equipment_type,
        rules: Some(create_combination(CombinatorType::And, rules)),
    }))
}

/// IS_PART_OF leaf binding a voltage level id field to the ids matched by `filter_id`
pub fn create_voltage_level_id_rule(filter_id: Uuid, field: FieldType) -> ExpertRule {
    ExpertRule::FilterUuid {
        field,
        operator: OperatorType::IsPartOf,
        values: vec![filter_id],
    }
}

/// Equipment of `equipment_type` connected to a voltage level matched by `filter_id`
///
/// Sides are OR-ed. `None` when the category has no voltage level id field.
pub fn build_filter_with_voltage_level_ids(
    filter_id: Uuid,
    equipment_type: EquipmentType,
) -> Option<ExpertFilter> {
    let rules = voltage_level_id_fields(equipment_type)
        .iter()
        .map(|field| create_voltage_level_id_rule(filter_id, *field))
        .collect();
    create_or_combination(rules).map(|root| ExpertFilter {
        id: Uuid::new_v4(),
        equipment_type,
        rules: Some(root),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn leaf_count(rule: &ExpertRule) -> usize {
        match rule {
            ExpertRule::Combinator { rules, .. } => rules.iter().map(leaf_count).sum(),
            _ => 1,
        }
    }

    #[test]
    fn or_combination_collapses() {
        assert_eq!(create_or_combination(vec![]), None);

        let single = create_enum_rules(FieldType::Country, &strings(&["FR"]));
        assert_eq!(create_or_combination(single.clone()), Some(single[0].clone()));

        let many = create_enum_rules(FieldType::Country, &strings(&["FR", "BE"]));
        let Some(ExpertRule::Combinator { combinator, rules }) = create_or_combination(many) else {
            panic!("expected combinator");
        };
        assert_eq!(combinator, CombinatorType::Or);
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn properties_rule_shape() {
        let rule = create_properties_rule(
            "region",
            &strings(&["north", "east"]),
            FieldType::SubstationProperties1,
        );
        assert_eq!(
            rule,
            ExpertRule::Properties {
                field: FieldType::SubstationProperties1,
                operator: OperatorType::In,
                property_name: "region".into(),
                property_values: strings(&["north", "east"]),
            }
        );
    }

    #[test]
    fn nominal_voltage_rules_cover_both_sides() {
        let rule = build_nominal_voltage_rules(&strings(&["400", "225"]), EquipmentType::Line)
            .unwrap()
            .unwrap();
        assert_eq!(leaf_count(&rule), 4);

        let none = build_nominal_voltage_rules(&strings(&["400"]), EquipmentType::Generator).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn nominal_voltage_must_be_numeric() {
        let err = build_nominal_voltage_rules(&strings(&["HV"]), EquipmentType::VoltageLevel).unwrap_err();
        assert!(matches!(err, FilterError::InvalidFilter(_)));
    }

    #[test]
    fn country_rules_single_value_single_field() {
        let rule = build_country_code_rules(&strings(&["FR"]), EquipmentType::VoltageLevel).unwrap();
        assert_eq!(
            rule,
            ExpertRule::Enum {
                field: FieldType::Country,
                operator: OperatorType::Equals,
                value: Some("FR".into()),
                values: vec![],
            }
        );
        assert_eq!(build_country_code_rules(&strings(&["FR"]), EquipmentType::Load), None);
    }

    #[test]
    fn substation_property_rules_per_field() {
        let mut properties = BTreeMap::new();
        properties.insert("region".to_string(), strings(&["north"]));
        properties.insert("owner".to_string(), strings(&["rte"]));
        let rule = build_substation_property_rules(&properties, EquipmentType::Line).unwrap();
        assert_eq!(leaf_count(&rule), 4);

        let rule = build_substation_property_rules(&properties, EquipmentType::Generator).unwrap();
        assert_eq!(leaf_count(&rule), 2);
    }

    #[test]
    fn empty_global_filter_yields_no_rules() {
        let global = GlobalFilter {
            nominal_v: Some(vec![]),
            country_code: None,
            substation_property: Some(BTreeMap::from([("region".to_string(), vec![])])),
            ..Default::default()
        };
        for equipment_type in EquipmentType::ALL {
            assert!(build_all_rules(&global, equipment_type).unwrap().is_empty());
            assert_eq!(build_expert_filter(&global, equipment_type).unwrap(), None);
        }
    }

    #[test]
    fn unrelated_facets_contribute_nothing() {
        let global = GlobalFilter {
            nominal_v: Some(strings(&["400"])),
            country_code: Some(strings(&["FR"])),
            ..Default::default()
        };
        assert!(build_all_rules(&global, EquipmentType::Generator).unwrap().is_empty());
    }

    #[test]
    fn expert_filter_is_and_of_facets() {
        let global = GlobalFilter {
            nominal_v: Some(strings(&["400"])),
            country_code: Some(strings(&["FR", "BE"])),
            ..Default::default()
        };
        let filter = build_expert_filter(&global, EquipmentType::VoltageLevel)
            .unwrap()
            .unwrap();
        assert_eq!(filter.equipment_type, EquipmentType::VoltageLevel);
        let Some(ExpertRule::Combinator { combinator, rules }) = filter.rules else {
            panic!("expected AND combinator");
        };
        assert_eq!(combinator, CombinatorType::And);
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn voltage_level_id_rule_targets_side() {
        let id = Uuid::new_v4();
        assert_eq!(
            create_voltage_level_id_rule(id, FieldType::VoltageLevelId2),
            ExpertRule::FilterUuid {
                field: FieldType::VoltageLevelId2,
                operator: OperatorType::IsPartOf,
                values: vec![id],
            }
        );
    }

    #[test]
    fn connectivity_filter_by_category() {
        let id = Uuid::new_v4();
        let line = build_filter_with_voltage_level_ids(id, EquipmentType::Line).unwrap();
        let Some(ExpertRule::Combinator { combinator, rules }) = &line.rules else {
            panic!("expected OR over both sides");
        };
        assert_eq!(*combinator, CombinatorType::Or);
        assert_eq!(rules.len(), 2);

        let generator = build_filter_with_voltage_level_ids(id, EquipmentType::Generator).unwrap();
        assert_eq!(
            generator.rules,
            Some(create_voltage_level_id_rule(id, FieldType::VoltageLevelId))
        );

        assert!(build_filter_with_voltage_level_ids(id, EquipmentType::Substation).is_none());
        assert!(build_filter_with_voltage_level_ids(id, EquipmentType::VoltageLevel).is_none());
    }
}
