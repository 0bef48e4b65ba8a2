//! Predicate compiler
//!
//! Translates filter descriptors into a [`Predicate`] bound to one owning
//! result. Storage layouts plug in through [`ResultScope`].

use tracing::{debug, trace};
use uuid::Uuid;

use crate::core::constants::DEFAULT_MAX_IN_CLAUSE_SIZE;
use crate::data::error::FilterError;
use crate::data::predicate::{FieldPath, Literal, NumberOp, Predicate, TextOp};

use super::types::{DataType, FilterType, FilterValue, ResourceFilter};

/// Describes the persisted entity a compiled predicate runs against
pub trait ResultScope: Send + Sync {
    /// Root column holding the owning result id
    fn result_id_column(&self) -> &str;

    /// Identifier column of the root entity, used when fetching child rows
    fn id_column(&self) -> &str;

    /// Whether a descriptor targets child entities
    fn is_child_filter(&self, filter: &ResourceFilter) -> bool {
        filter.is_nested()
    }

    /// Extra constraint when no child filter is active
    fn when_no_child_filters(&self) -> Option<Predicate> {
        None
    }

    /// Extra constraint when at least one child filter is active
    fn when_child_filters(&self) -> Option<Predicate> {
        None
    }
}

/// Compiles descriptors into predicates, chunking large IN lists
#[derive(Debug, Clone)]
pub struct PredicateCompiler {
    max_in_clause_size: usize,
}

impl Default for PredicateCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IN_CLAUSE_SIZE)
    }
}

impl PredicateCompiler {
    pub fn new(max_in_clause_size: usize) -> Self {
        Self {
            max_in_clause_size: max_in_clause_size.max(1),
        }
    }

    pub fn max_in_clause_size(&self) -> usize {
        self.max_in_clause_size
    }

    /// Compile the predicate selecting rows of result `owner_id`
    ///
    /// The result is the AND of the owner equality on the root entity, the
    /// scope's child/no-child hook selected by `has_child_filters`, and one
    /// predicate per descriptor. Any invalid descriptor fails the whole call.
    pub fn compile(
        &self,
        scope: &dyn ResultScope,
        owner_id: Uuid,
        filters: &[ResourceFilter],
        has_child_filters: bool,
    ) -> Result<Predicate, FilterError> {
        let mut parts = Vec::with_capacity(filters.len() + 2);
        parts.push(Predicate::equals(
            FieldPath::root(scope.result_id_column()),
            Literal::Uuid(owner_id),
        ));

        let hook = if has_child_filters {
            scope.when_child_filters()
        } else {
            scope.when_no_child_filters()
        };
        parts.extend(hook);

        for filter in filters {
            parts.push(self.filter_predicate(filter)?);
        }

        let predicate = Predicate::and(parts);
        debug!(
            %owner_id,
            filters = filters.len(),
            has_child_filters,
            leaves = predicate.leaf_count(),
            "Compiled result predicate"
        );
        Ok(predicate)
    }

    /// Like [`compile`](Self::compile), deriving the child flag from the descriptors
    pub fn compile_for_result(
        &self,
        scope: &dyn ResultScope,
        owner_id: Uuid,
        filters: &[ResourceFilter],
    ) -> Result<Predicate, FilterError> {
        let has_child_filters = filters.iter().any(|f| scope.is_child_filter(f));
        self.compile(scope, owner_id, filters, has_child_filters)
    }

    /// Compile the predicate fetching child rows of an already-filtered page
    ///
    /// Selects rows whose id is in `parent_ids` and applies only the
    /// child-scoped descriptors.
    pub fn compile_children(
        &self,
        scope: &dyn ResultScope,
        parent_ids: &[Uuid],
        filters: &[ResourceFilter],
    ) -> Result<Predicate, FilterError> {
        let ids = parent_ids.iter().copied().map(Literal::Uuid).collect();
        let mut parts = vec![self.in_predicate(FieldPath::root(scope.id_column()), ids)];
        for filter in filters.iter().filter(|f| scope.is_child_filter(f)) {
            parts.push(self.filter_predicate(filter)?);
        }
        Ok(Predicate::and(parts))
    }

    /// Translate a single descriptor
    pub fn filter_predicate(&self, filter: &ResourceFilter) -> Result<Predicate, FilterError> {
        filter.validate()?;
        let path = FieldPath::parse(&filter.column)?;
        let tolerance = filter.tolerance.filter(|t| *t > 0.0);

        trace!(
            column = %path,
            data_type = %filter.data_type,
            filter_type = %filter.filter_type,
            ?tolerance,
            "Translating filter"
        );

        let predicate = match (filter.data_type, filter.filter_type) {
            (DataType::Text, FilterType::Equals) => {
                Predicate::text(path, TextOp::Equals, filter.scalar()?.as_text())
            }
            (DataType::Text, FilterType::StartsWith) => {
                Predicate::text(path, TextOp::StartsWith, filter.scalar()?.as_text())
            }
            (DataType::Text, FilterType::Contains) => match &filter.value {
                FilterValue::Scalar(v) => Predicate::text(path, TextOp::Contains, v.as_text()),
                FilterValue::List(values) => Predicate::or(
                    values
                        .iter()
                        .map(|v| Predicate::text(path.clone(), TextOp::Contains, v.as_text())),
                ),
            },
            (DataType::Text, FilterType::In) => {
                let values = filter
                    .list()?
                    .iter()
                    .map(|v| Literal::Text(v.as_text()))
                    .collect();
                self.in_predicate(path, values)
            }
            (DataType::Number, FilterType::Equals) => {
                let v = filter.scalar()?.as_number()?;
                match tolerance {
                    Some(t) => Predicate::between(path, v - t, v + t),
                    None => Predicate::number(path, NumberOp::Eq, v),
                }
            }
            (DataType::Number, FilterType::NotEqual) => {
                let v = filter.scalar()?.as_number()?;
                match tolerance {
                    Some(t) => Predicate::or([
                        Predicate::number(path.clone(), NumberOp::Gt, v + t),
                        Predicate::number(path, NumberOp::Lt, v - t),
                    ]),
                    None => Predicate::number(path, NumberOp::Ne, v),
                }
            }
            (DataType::Number, FilterType::LessThanOrEqual) => {
                let v = filter.scalar()?.as_number()?;
                Predicate::number(path, NumberOp::Le, v + tolerance.unwrap_or(0.0))
            }
            (DataType::Number, FilterType::GreaterThanOrEqual) => {
                let v = filter.scalar()?.as_number()?;
                Predicate::number(path, NumberOp::Ge, v - tolerance.unwrap_or(0.0))
            }
            (data_type, filter_type) => {
                return Err(FilterError::invalid(format!(
                    "Operator '{}' is not supported for {} filters",
                    filter_type, data_type
                )));
            }
        };
        Ok(predicate)
    }

    /// Membership split into OR-ed chunks of at most `max_in_clause_size`
    pub fn in_predicate(&self, path: FieldPath, values: Vec<Literal>) -> Predicate {
        if values.len() <= self.max_in_clause_size {
            return Predicate::is_in(path, values);
        }
        Predicate::or(
            values
                .chunks(self.max_in_clause_size)
                .map(|chunk| Predicate::is_in(path.clone(), chunk.to_vec())),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::filters::types::ScalarValue;
    use crate::data::sql::{DuckDb, SqlParams, SqlRenderer};

    struct ViolationScope;

    impl ResultScope for ViolationScope {
        fn result_id_column(&self) -> &str {
            "resultUuid"
        }

        fn id_column(&self) -> &str {
            "id"
        }
    }

    struct HookedScope;

    impl ResultScope for HookedScope {
        fn result_id_column(&self) -> &str {
            "resultUuid"
        }

        fn id_column(&self) -> &str {
            "id"
        }

        fn when_no_child_filters(&self) -> Option<Predicate> {
            Some(Predicate::text(FieldPath::root("kind"), TextOp::Equals, "flat"))
        }

        fn when_child_filters(&self) -> Option<Predicate> {
            Some(Predicate::text(FieldPath::root("kind"), TextOp::Equals, "joined"))
        }
    }

    fn number(filter_type: FilterType, value: f64) -> ResourceFilter {
        ResourceFilter::new(DataType::Number, filter_type, value, "value")
    }

    fn text(filter_type: FilterType, value: impl Into<FilterValue>) -> ResourceFilter {
        ResourceFilter::new(DataType::Text, filter_type, value, "subjectId")
    }

    #[test]
    fn compile_binds_owner_on_root_entity() {
        let owner = Uuid::new_v4();
        let filters = vec![text(FilterType::Equals, "line1")];
        let predicate = PredicateCompiler::default()
            .compile(&ViolationScope, owner, &filters, false)
            .unwrap();
        match predicate {
            Predicate::And(parts) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(
                    parts[0],
                    Predicate::equals(FieldPath::root("resultUuid"), Literal::Uuid(owner))
                );
            }
            other => panic!("expected AND, got {other:?}"),
        }
    }

    #[test]
    fn compile_without_filters_is_owner_equality() {
        let owner = Uuid::new_v4();
        let predicate = PredicateCompiler::default()
            .compile(&ViolationScope, owner, &[], false)
            .unwrap();
        assert_eq!(
            predicate,
            Predicate::equals(FieldPath::root("resultUuid"), Literal::Uuid(owner))
        );
    }

    #[test]
    fn compile_selects_child_hook() {
        let owner = Uuid::nil();
        let compiler = PredicateCompiler::default();
        let flat = compiler.compile(&HookedScope, owner, &[], false).unwrap();
        let joined = compiler.compile(&HookedScope, owner, &[], true).unwrap();
        let row = json!({"resultUuid": owner.to_string(), "kind": "FLAT"});
        assert!(flat.matches(&row));
        assert!(!joined.matches(&row));
    }

    #[test]
    fn compile_for_result_detects_nested_filters() {
        let owner = Uuid::nil();
        let filters = vec![ResourceFilter::new(
            DataType::Text,
            FilterType::Equals,
            "c1",
            "contingency.id",
        )];
        let predicate = PredicateCompiler::default()
            .compile_for_result(&HookedScope, owner, &filters)
            .unwrap();
        let row = json!({
            "resultUuid": owner.to_string(),
            "kind": "joined",
            "contingency": {"id": "C1"}
        });
        assert!(predicate.matches(&row));
    }

    #[test]
    fn compile_fails_atomically_on_invalid_filter() {
        let filters = vec![
            text(FilterType::Equals, "ok"),
            ResourceFilter::new(DataType::Number, FilterType::In, vec![1.0], "value"),
        ];
        let result = PredicateCompiler::default().compile(&ViolationScope, Uuid::nil(), &filters, false);
        assert!(matches!(result, Err(FilterError::InvalidFilter(_))));
    }

    #[test]
    fn number_in_and_text_ordering_always_fail() {
        let compiler = PredicateCompiler::default();
        for value in [vec![1.0], vec![], vec![1.0, 2.0]] {
            let filter = ResourceFilter::new(DataType::Number, FilterType::In, value, "value");
            assert!(compiler.filter_predicate(&filter).is_err());
        }
        for op in [FilterType::LessThanOrEqual, FilterType::GreaterThanOrEqual] {
            for value in ["a", "10"] {
                assert!(compiler.filter_predicate(&text(op, value)).is_err());
            }
        }
    }

    #[test]
    fn equals_with_tolerance_is_a_closed_window() {
        let compiler = PredicateCompiler::default();
        let predicate = compiler
            .filter_predicate(&number(FilterType::Equals, 100.0).with_tolerance(0.5))
            .unwrap();
        assert_eq!(predicate, Predicate::between(FieldPath::root("value"), 99.5, 100.5));

        for (stored, expected) in [(99.5, true), (100.0, true), (100.5, true), (100.51, false), (99.4, false)] {
            assert_eq!(predicate.matches(&json!({ "value": stored })), expected, "{stored}");
        }
    }

    #[test]
    fn equals_without_tolerance_is_exact() {
        let predicate = PredicateCompiler::default()
            .filter_predicate(&number(FilterType::Equals, 10.0))
            .unwrap();
        assert!(predicate.matches(&json!({"value": 10})));
        assert!(!predicate.matches(&json!({"value": 10.0001})));
    }

    #[test]
    fn not_equal_negates_the_window() {
        let compiler = PredicateCompiler::default();
        let with_tolerance = compiler
            .filter_predicate(&number(FilterType::NotEqual, 10.0).with_tolerance(1.0))
            .unwrap();
        assert!(!with_tolerance.matches(&json!({"value": 10.8})));
        assert!(!with_tolerance.matches(&json!({"value": 9.0})));
        assert!(with_tolerance.matches(&json!({"value": 11.2})));
        assert!(with_tolerance.matches(&json!({"value": 8.5})));

        let exact = compiler
            .filter_predicate(&number(FilterType::NotEqual, 10.0))
            .unwrap();
        assert_eq!(exact, Predicate::number(FieldPath::root("value"), NumberOp::Ne, 10.0));
    }

    #[test]
    fn ordering_widens_bound_by_tolerance() {
        let compiler = PredicateCompiler::default();
        let le = compiler
            .filter_predicate(&number(FilterType::LessThanOrEqual, 10.0).with_tolerance(0.1))
            .unwrap();
        assert!(le.matches(&json!({"value": 10.05})));
        assert!(!le.matches(&json!({"value": 10.2})));

        let ge = compiler
            .filter_predicate(&number(FilterType::GreaterThanOrEqual, 10.0).with_tolerance(0.1))
            .unwrap();
        assert!(ge.matches(&json!({"value": 9.95})));
        assert!(!ge.matches(&json!({"value": 9.8})));
    }

    #[test]
    fn contains_list_is_or_of_keywords() {
        let predicate = PredicateCompiler::default()
            .filter_predicate(&text(FilterType::Contains, vec!["gen", "load"]))
            .unwrap();
        assert_eq!(predicate.leaf_count(), 2);
        assert!(predicate.matches(&json!({"subjectId": "LOAD_12"})));
        assert!(predicate.matches(&json!({"subjectId": "my_gen"})));
        assert!(!predicate.matches(&json!({"subjectId": "LINE"})));
    }

    #[test]
    fn starts_with_is_case_insensitive() {
        let predicate = PredicateCompiler::default()
            .filter_predicate(&text(FilterType::StartsWith, "li"))
            .unwrap();
        assert!(predicate.matches(&json!({"subjectId": "LINE_1"})));
        assert!(!predicate.matches(&json!({"subjectId": "ALINE"})));
    }

    #[test]
    fn empty_in_is_constant_false() {
        let predicate = PredicateCompiler::default()
            .filter_predicate(&text(FilterType::In, Vec::<String>::new()))
            .unwrap();
        assert_eq!(predicate, Predicate::Const(false));
    }

    #[test]
    fn large_in_is_chunked_covering_each_value_once() {
        let compiler = PredicateCompiler::new(500);
        let ids: Vec<String> = (0..1201).map(|i| format!("id{i}")).collect();
        let predicate = compiler
            .filter_predicate(&ResourceFilter::text_in("subjectId", ids.clone()))
            .unwrap();

        let Predicate::Or(chunks) = &predicate else {
            panic!("expected OR of chunks, got {predicate:?}");
        };
        assert_eq!(chunks.len(), 3);

        let mut seen = Vec::new();
        for chunk in chunks {
            let Predicate::In { values, .. } = chunk else {
                panic!("expected IN chunk");
            };
            assert!(values.len() <= 500);
            seen.extend(values.iter().map(|v| v.to_string()));
        }
        assert_eq!(seen, ids);
    }

    #[test]
    fn in_at_limit_is_not_chunked() {
        let compiler = PredicateCompiler::new(3);
        let predicate = compiler.in_predicate(
            FieldPath::root("id"),
            vec![Literal::Text("a".into()), Literal::Text("b".into()), Literal::Text("c".into())],
        );
        assert!(matches!(predicate, Predicate::In { .. }));
    }

    #[test]
    fn compile_children_keeps_child_filters_only() {
        let parents = vec![Uuid::new_v4(), Uuid::new_v4()];
        let filters = vec![
            text(FilterType::Equals, "root-only"),
            ResourceFilter::new(DataType::Text, FilterType::Contains, "gen", "violations.subjectId"),
        ];
        let predicate = PredicateCompiler::new(1)
            .compile_children(&ViolationScope, &parents, &filters)
            .unwrap();

        let row = json!({
            "id": parents[1].to_string(),
            "subjectId": "something else",
            "violations": [{"subjectId": "GEN1"}]
        });
        assert!(predicate.matches(&row));

        let Predicate::And(parts) = predicate else {
            panic!("expected AND");
        };
        assert!(matches!(&parts[0], Predicate::Or(chunks) if chunks.len() == 2));
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn numeric_text_operand_is_parsed() {
        let filter = ResourceFilter {
            value: FilterValue::Scalar(ScalarValue::Text("225".into())),
            ..number(FilterType::GreaterThanOrEqual, 0.0)
        };
        let predicate = PredicateCompiler::default().filter_predicate(&filter).unwrap();
        assert_eq!(
            predicate,
            Predicate::number(FieldPath::root("value"), NumberOp::Ge, 225.0)
        );
    }

    #[test]
    fn compiled_predicate_runs_on_duckdb() {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"CREATE TABLE violations ("resultUuid" VARCHAR, "subjectId" VARCHAR, "value" DOUBLE);"#,
        )
        .unwrap();

        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        for (result, subject, value) in [
            (owner, "LINE_1", 99.6),
            (owner, "line_2", 101.0),
            (owner, "GEN_1", 100.2),
            (other, "LINE_3", 100.0),
        ] {
            conn.execute(
                "INSERT INTO violations VALUES (?, ?, ?)",
                duckdb::params![result.to_string(), subject, value],
            )
            .unwrap();
        }

        let filters = vec![
            text(FilterType::StartsWith, "line"),
            number(FilterType::Equals, 100.0).with_tolerance(0.5),
        ];
        let predicate = PredicateCompiler::default()
            .compile(&ViolationScope, owner, &filters, false)
            .unwrap();

        let mut params = SqlParams::default();
        let clause = SqlRenderer::new(&DuckDb).render(&predicate, &mut params);
        let sql = format!(
            r#"SELECT "subjectId" FROM violations WHERE {} ORDER BY "subjectId""#,
            clause
        );

        let values: Vec<duckdb::types::Value> = params
            .values
            .iter()
            .map(|v| match v {
                crate::data::sql::SqlValue::Text(s) => duckdb::types::Value::Text(s.clone()),
                crate::data::sql::SqlValue::Number(n) => duckdb::types::Value::Double(*n),
                crate::data::sql::SqlValue::Uuid(u) => duckdb::types::Value::Text(u.to_string()),
            })
            .collect();

        let mut stmt = conn.prepare(&sql).unwrap();
        let rows: Vec<String> = stmt
            .query_map(duckdb::params_from_iter(values), |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows, vec!["LINE_1".to_string()]);
    }
}
