//! Global filter criteria and expert rule construction

mod fields;
mod filter;
mod global;
mod resolver;
mod rules;

pub use fields::{
    CategoryFields, country_fields, fields_for, nominal_voltage_fields, substation_property_fields,
    voltage_level_id_fields,
};
pub use filter::{ExpertFilter, GenericFilter, IdentifierListFilter};
pub use global::{GlobalFilter, LimitViolationType, parse_global_filter};
pub use resolver::{
    build_all_rules, build_country_code_rules, build_expert_filter,
    build_filter_with_voltage_level_ids, build_nominal_voltage_rules,
    build_substation_property_rules, create_combination, create_enum_rules, create_number_rules,
    create_or_combination, create_properties_rule, create_voltage_level_id_rule,
};
pub use rules::{CombinatorType, ExpertRule, FieldType, OperatorType};
