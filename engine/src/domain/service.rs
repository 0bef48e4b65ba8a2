//! Filter service
//!
//! Resolves a global filter against one network variant into the ids of the
//! matching equipment, then into a TEXT / IN descriptor over a result column.
//! Remote lookups happen up front; evaluation itself is synchronous.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::data::error::FilterError;
use crate::data::filters::ResourceFilter;
use crate::data::stores::{FilterStore, NetworkStore};
use crate::domain::combine::combine_filter_results;
use crate::domain::criteria::{GenericFilter, GlobalFilter, build_expert_filter};
use crate::domain::evaluator::{FilterRefs, NetworkFilterEvaluator, applies_to};
use crate::domain::network::EquipmentType;

#[derive(Debug, Clone)]
pub struct FilterService {
    filters: Arc<dyn FilterStore>,
    networks: Arc<dyn NetworkStore>,
}

impl FilterService {
    pub fn new(filters: Arc<dyn FilterStore>, networks: Arc<dyn NetworkStore>) -> Self {
        Self { filters, networks }
    }

    /// TEXT / IN descriptor over `column` holding every matching id
    ///
    /// `None` when no id matches, meaning the result query can be skipped.
    pub async fn resource_filter(
        &self,
        network_id: Uuid,
        variant_id: &str,
        global_filter: &GlobalFilter,
        equipment_types: &[EquipmentType],
        column: &str,
    ) -> Result<Option<ResourceFilter>, FilterError> {
        let ids = self
            .ids_filter(network_id, variant_id, global_filter, equipment_types)
            .await?;
        if ids.is_empty() {
            debug!(network_id = %network_id, variant_id, "Global filter matches no equipment");
            return Ok(None);
        }
        debug!(network_id = %network_id, variant_id, column, count = ids.len(), "Resolved global filter");
        Ok(Some(ResourceFilter::text_in(column, ids)))
    }

    /// Ids matching `global_filter` across `equipment_types`, without duplicates
    pub async fn ids_filter(
        &self,
        network_id: Uuid,
        variant_id: &str,
        global_filter: &GlobalFilter,
        equipment_types: &[EquipmentType],
    ) -> Result<Vec<String>, FilterError> {
        let (network, (filters, references)) = tokio::try_join!(
            self.networks.fetch_network(network_id, variant_id),
            self.named_filters(global_filter.generic_filters()),
        )?;

        let evaluator = NetworkFilterEvaluator::new(&network);
        let mut refs = FilterRefs::new();
        let referenced: FxHashSet<Uuid> = filters
            .iter()
            .flat_map(GenericFilter::referenced_filters)
            .collect();
        for filter in references
            .iter()
            .chain(filters.iter().filter(|f| referenced.contains(&f.id())))
        {
            evaluator.resolve_reference(filter, &mut refs)?;
        }

        let by_type =
            filter_equipments_by_type(&evaluator, global_filter, &filters, &refs, equipment_types)?;
        let mut seen = FxHashSet::default();
        Ok(equipment_types
            .iter()
            .filter_map(|t| by_type.get(t))
            .flatten()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect())
    }

    /// Named filters of the global filter, plus the filters they reference
    async fn named_filters(
        &self,
        ids: &[Uuid],
    ) -> Result<(Vec<GenericFilter>, Vec<GenericFilter>), FilterError> {
        let filters = self.fetch_all(ids).await?;
        let known: FxHashSet<Uuid> = filters.iter().map(GenericFilter::id).collect();
        let mut referenced = Vec::new();
        for id in filters.iter().flat_map(GenericFilter::referenced_filters) {
            if !known.contains(&id) && !referenced.contains(&id) {
                referenced.push(id);
            }
        }
        let references = self.fetch_all(&referenced).await?;
        Ok((filters, references))
    }

    /// Fetch filters, failing when any id is unknown
    async fn fetch_all(&self, ids: &[Uuid]) -> Result<Vec<GenericFilter>, FilterError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filters = self.filters.fetch_filters(ids).await?;
        let found: FxHashSet<Uuid> = filters.iter().map(GenericFilter::id).collect();
        let missing: Vec<Uuid> = ids.iter().filter(|id| !found.contains(id)).copied().collect();
        if !missing.is_empty() {
            return Err(FilterError::filters_not_found(&missing));
        }
        Ok(filters)
    }
}

/// Matching ids per category; unconstrained categories are left out
pub fn filter_equipments_by_type(
    evaluator: &NetworkFilterEvaluator<'_>,
    global_filter: &GlobalFilter,
    generic_filters: &[GenericFilter],
    refs: &FilterRefs,
    equipment_types: &[EquipmentType],
) -> Result<BTreeMap<EquipmentType, Vec<String>>, FilterError> {
    let mut by_type = BTreeMap::new();
    for &equipment_type in equipment_types {
        if let Some(ids) = extract_filtered_equipment_ids(
            evaluator,
            global_filter,
            generic_filters,
            refs,
            equipment_type,
        )? {
            by_type.insert(equipment_type, ids);
        }
    }
    Ok(by_type)
}

/// Ids of `equipment_type` matching the global facets AND any applicable named filter
///
/// Applicable named filters are OR-ed together. `None` when nothing applies to
/// the category.
pub fn extract_filtered_equipment_ids(
    evaluator: &NetworkFilterEvaluator<'_>,
    global_filter: &GlobalFilter,
    generic_filters: &[GenericFilter],
    refs: &FilterRefs,
    equipment_type: EquipmentType,
) -> Result<Option<Vec<String>>, FilterError> {
    let mut results = Vec::new();

    if let Some(expert) = build_expert_filter(global_filter, equipment_type)? {
        results.push(evaluator.evaluate_expert(&expert, refs)?);
    }

    let applicable: Vec<&GenericFilter> = generic_filters
        .iter()
        .filter(|f| applies_to(f.equipment_type(), equipment_type))
        .collect();
    if !applicable.is_empty() {
        let mut lists = Vec::with_capacity(applicable.len());
        for filter in applicable {
            lists.push(evaluator.extract_equipment_ids_from_generic_filter(filter, equipment_type, refs)?);
        }
        results.push(combine_filter_results(lists, false));
    }

    if results.is_empty() {
        trace!(%equipment_type, "No criteria apply to category");
        return Ok(None);
    }
    let ids = combine_filter_results(results, true);
    trace!(%equipment_type, count = ids.len(), "Filtered category");
    Ok(Some(ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filters::{DataType, FilterType, FilterValue};
    use crate::data::stores::{MemoryFilterStore, MemoryNetworkStore};
    use crate::domain::criteria::{
        ExpertFilter, ExpertRule, FieldType, IdentifierListFilter, OperatorType,
    };
    use crate::domain::network::NetworkSnapshot;

    const VARIANT: &str = "InitialState";

    fn network(id: Uuid) -> NetworkSnapshot {
        NetworkSnapshot::builder(id, VARIANT)
            .substation("S1", Some("FR"), &[("region", "north")])
            .substation("S2", Some("BE"), &[("region", "south")])
            .substation("S3", Some("FR"), &[])
            .voltage_level("VL1", "S1", 400.0)
            .voltage_level("VL2", "S2", 225.0)
            .voltage_level("VL3", "S3", 63.0)
            .equipment("L1", EquipmentType::Line, &["VL1", "VL2"])
            .equipment("L2", EquipmentType::Line, &["VL2", "VL3"])
            .equipment("G1", EquipmentType::Generator, &["VL1"])
            .equipment("G2", EquipmentType::Generator, &["VL3"])
            .equipment("LD1", EquipmentType::Load, &["VL2"])
            .build()
            .unwrap()
    }

    fn service(network_id: Uuid, filters: Vec<GenericFilter>) -> FilterService {
        FilterService::new(
            Arc::new(MemoryFilterStore::new(filters)),
            Arc::new(MemoryNetworkStore::new([network(network_id)])),
        )
    }

    fn nominal_v(values: &[&str]) -> GlobalFilter {
        GlobalFilter {
            nominal_v: Some(values.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    fn with_filters(mut global: GlobalFilter, filters: &[&GenericFilter]) -> GlobalFilter {
        global.generic_filter = Some(filters.iter().map(|f| f.id()).collect());
        global
    }

    fn voltage_level_filter(operator: OperatorType, value: f64) -> GenericFilter {
        GenericFilter::Expert(ExpertFilter {
            id: Uuid::new_v4(),
            equipment_type: EquipmentType::VoltageLevel,
            rules: Some(ExpertRule::Number {
                field: FieldType::NominalVoltage,
                operator,
                value: Some(value),
                values: vec![],
            }),
        })
    }

    fn id_list(equipment_type: EquipmentType, ids: &[&str]) -> GenericFilter {
        GenericFilter::IdentifierList(IdentifierListFilter {
            id: Uuid::new_v4(),
            equipment_type,
            equipment_ids: ids.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[tokio::test]
    async fn test_resource_filter_from_nominal_voltage() {
        let network_id = Uuid::new_v4();
        let service = service(network_id, vec![]);
        let filter = service
            .resource_filter(
                network_id,
                VARIANT,
                &nominal_v(&["400"]),
                &[EquipmentType::Line, EquipmentType::Generator, EquipmentType::VoltageLevel],
                "subjectId",
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(filter.data_type, DataType::Text);
        assert_eq!(filter.filter_type, FilterType::In);
        assert_eq!(filter.column, "subjectId");
        assert_eq!(
            filter.value,
            FilterValue::from(vec!["L1".to_string(), "VL1".to_string()])
        );
        assert!(filter.validate().is_ok());
    }

    #[tokio::test]
    async fn test_empty_global_filter_resolves_to_none() {
        let network_id = Uuid::new_v4();
        let service = service(network_id, vec![]);
        let result = service
            .resource_filter(
                network_id,
                VARIANT,
                &GlobalFilter::default(),
                &EquipmentType::ALL,
                "subjectId",
            )
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_voltage_level_filter_applies_to_lines() {
        let network_id = Uuid::new_v4();
        let vl = voltage_level_filter(OperatorType::Equals, 400.0);
        let service = service(network_id, vec![vl.clone()]);
        let global = with_filters(GlobalFilter::default(), &[&vl]);

        let ids = service
            .ids_filter(network_id, VARIANT, &global, &[EquipmentType::Line, EquipmentType::Load])
            .await
            .unwrap();
        assert_eq!(ids, vec!["L1"]);
    }

    #[tokio::test]
    async fn test_unrelated_filter_leaves_category_unconstrained() {
        let network_id = Uuid::new_v4();
        let loads = id_list(EquipmentType::Load, &["LD1"]);
        let service = service(network_id, vec![loads.clone()]);
        let global = with_filters(GlobalFilter::default(), &[&loads]);

        let result = service
            .resource_filter(network_id, VARIANT, &global, &[EquipmentType::Line], "subjectId")
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_facets_and_named_filters_intersect() {
        let network_id = Uuid::new_v4();
        let lines = id_list(EquipmentType::Line, &["L2", "L9"]);
        let service = service(network_id, vec![lines.clone()]);
        let global = with_filters(nominal_v(&["225"]), &[&lines]);

        let ids = service
            .ids_filter(network_id, VARIANT, &global, &[EquipmentType::Line])
            .await
            .unwrap();
        assert_eq!(ids, vec!["L2"]);
    }

    #[tokio::test]
    async fn test_named_filters_of_same_category_union() {
        let network_id = Uuid::new_v4();
        let first = id_list(EquipmentType::Generator, &["G1"]);
        let second = id_list(EquipmentType::Generator, &["G2"]);
        let service = service(network_id, vec![first.clone(), second.clone()]);
        let global = with_filters(GlobalFilter::default(), &[&first, &second]);

        let ids = service
            .ids_filter(network_id, VARIANT, &global, &[EquipmentType::Generator])
            .await
            .unwrap();
        assert_eq!(ids, vec!["G1", "G2"]);
    }

    #[tokio::test]
    async fn test_referenced_filters_are_prefetched() {
        let network_id = Uuid::new_v4();
        let low_voltage = voltage_level_filter(OperatorType::LowerOrEquals, 100.0);
        let generators = GenericFilter::Expert(ExpertFilter {
            id: Uuid::new_v4(),
            equipment_type: EquipmentType::Generator,
            rules: Some(ExpertRule::FilterUuid {
                field: FieldType::VoltageLevelId,
                operator: OperatorType::IsPartOf,
                values: vec![low_voltage.id()],
            }),
        });
        let service = service(network_id, vec![low_voltage, generators.clone()]);
        let global = with_filters(GlobalFilter::default(), &[&generators]);

        let ids = service
            .ids_filter(network_id, VARIANT, &global, &[EquipmentType::Generator])
            .await
            .unwrap();
        assert_eq!(ids, vec!["G2"]);
    }

    #[tokio::test]
    async fn test_missing_named_filter_is_not_found() {
        let network_id = Uuid::new_v4();
        let service = service(network_id, vec![]);
        let missing = Uuid::new_v4();
        let global = GlobalFilter {
            generic_filter: Some(vec![missing]),
            ..Default::default()
        };
        let err = service
            .ids_filter(network_id, VARIANT, &global, &[EquipmentType::Line])
            .await
            .unwrap_err();
        assert!(matches!(err, FilterError::FiltersNotFound { ref ids } if ids == &vec![missing]));
    }

    #[tokio::test]
    async fn test_missing_network_is_not_found() {
        let service = service(Uuid::new_v4(), vec![]);
        let err = service
            .ids_filter(Uuid::new_v4(), VARIANT, &nominal_v(&["400"]), &[EquipmentType::Line])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "filter.networkNotFound");
    }

    #[tokio::test]
    async fn test_invalid_nominal_voltage_fails() {
        let network_id = Uuid::new_v4();
        let service = service(network_id, vec![]);
        let err = service
            .ids_filter(network_id, VARIANT, &nominal_v(&["HV"]), &[EquipmentType::VoltageLevel])
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_extract_without_criteria_is_none() {
        let network = network(Uuid::nil());
        let evaluator = NetworkFilterEvaluator::new(&network);
        let result = extract_filtered_equipment_ids(
            &evaluator,
            &nominal_v(&["400"]),
            &[],
            &FilterRefs::new(),
            EquipmentType::Generator,
        )
        .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_relevant_empty_filter_empties_category() {
        let network = network(Uuid::nil());
        let evaluator = NetworkFilterEvaluator::new(&network);
        let nothing = id_list(EquipmentType::Line, &["L9"]);
        let by_type = filter_equipments_by_type(
            &evaluator,
            &nominal_v(&["225"]),
            &[nothing],
            &FilterRefs::new(),
            &[EquipmentType::Line, EquipmentType::Generator],
        )
        .unwrap();
        assert_eq!(by_type.get(&EquipmentType::Line), Some(&Vec::new()));
        assert!(!by_type.contains_key(&EquipmentType::Generator));
    }
}
