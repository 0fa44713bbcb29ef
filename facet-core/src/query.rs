//! Composable query model.
//!
//! [`QueryDefinition`] is an immutable-by-replacement value object: every edit
//! operation takes `&self` and returns a new definition. Callers never mutate
//! in place, so reference equality of snapshots is a reliable change signal.
//!
//! The model does not eagerly enforce referential validity against the schema;
//! the backend's validate call is authoritative. The one exception is
//! [`QueryDefinition::remove_table`], which garbage-collects columns, filters,
//! joins and sorts that reference the removed table so stale references are
//! never submitted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;
use crate::schema::{DataType, DatabaseSchema, TableSchema};

/// A table participating in a query.
///
/// `id` is caller-generated, unique within the query, and stable across
/// edits; `name` references a schema table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTable {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Aggregation applied to a selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    None,
    Sum,
    Avg,
    Count,
    CountDistinct,
    Min,
    Max,
}

impl Aggregation {
    /// Whether this aggregation is valid for a column of the given type.
    pub fn allowed_for(self, data_type: DataType) -> bool {
        match self {
            Aggregation::None | Aggregation::Count | Aggregation::CountDistinct => true,
            Aggregation::Sum | Aggregation::Avg => data_type.is_numeric(),
            Aggregation::Min | Aggregation::Max => data_type.is_orderable(),
        }
    }
}

/// A column selected for output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSelection {
    pub table_id: String,
    pub column: String,
    pub aggregation: Aggregation,
}

/// Comparison operator for a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    NotLike,
    NotIlike,
    In,
    NotIn,
    InOrNull,
    Between,
    IsNull,
    IsNotNull,
}

/// The value shape an operator requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    Scalar,
    Range,
    List,
    None,
}

impl FilterOperator {
    /// The value shape this operator expects.
    pub fn expected_shape(self) -> ValueShape {
        match self {
            FilterOperator::Eq
            | FilterOperator::Neq
            | FilterOperator::Gt
            | FilterOperator::Gte
            | FilterOperator::Lt
            | FilterOperator::Lte
            | FilterOperator::Like
            | FilterOperator::Ilike
            | FilterOperator::NotLike
            | FilterOperator::NotIlike => ValueShape::Scalar,
            FilterOperator::In | FilterOperator::NotIn | FilterOperator::InOrNull => {
                ValueShape::List
            }
            FilterOperator::Between => ValueShape::Range,
            FilterOperator::IsNull | FilterOperator::IsNotNull => ValueShape::None,
        }
    }
}

/// Filter comparison value. The shape is dictated by the operator; the two
/// null-checking operators carry no value at all.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    None,
    Range {
        min: Value,
        max: Value,
    },
    List(Vec<Value>),
    Scalar(Value),
}

impl FilterValue {
    /// The shape of this value.
    pub fn shape(&self) -> ValueShape {
        match self {
            FilterValue::None => ValueShape::None,
            FilterValue::Range { .. } => ValueShape::Range,
            FilterValue::List(_) => ValueShape::List,
            FilterValue::Scalar(_) => ValueShape::Scalar,
        }
    }
}

/// A row filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub table_id: String,
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: FilterValue,
}

impl FilterDefinition {
    /// Check that the value shape matches what the operator requires.
    pub fn check_value_shape(&self) -> Result<(), ModelError> {
        let expected = self.operator.expected_shape();
        if self.value.shape() == expected {
            Ok(())
        } else {
            Err(ModelError::InvalidFilterValue {
                column: self.column.clone(),
                operator: self.operator,
                expected,
            })
        }
    }
}

/// Join kind, matching the SQL join produced by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

/// A join between two query tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinDefinition {
    pub from_table_id: String,
    pub from_column: String,
    pub to_table_id: String,
    pub to_column: String,
    pub join_type: JoinType,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// An ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortDefinition {
    pub table_id: String,
    pub column: String,
    pub direction: SortDirection,
}

/// The composable, backend-agnostic description of an analytical query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryDefinition {
    pub tables: Vec<QueryTable>,
    pub columns: Vec<ColumnSelection>,
    pub filters: Vec<FilterDefinition>,
    pub joins: Vec<JoinDefinition>,
    pub order_by: Vec<SortDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl QueryDefinition {
    /// An empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// A query is executable once it selects at least one column from at
    /// least one table.
    pub fn can_execute(&self) -> bool {
        !self.tables.is_empty() && !self.columns.is_empty()
    }

    /// Add a table.
    pub fn add_table(&self, table: QueryTable) -> Self {
        let mut next = self.clone();
        next.tables.push(table);
        next
    }

    /// Replace the table with a matching id. Unknown ids leave the query
    /// unchanged.
    pub fn update_table(&self, table: QueryTable) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.tables.iter_mut().find(|t| t.id == table.id) {
            *slot = table;
        }
        next
    }

    /// Remove a table and garbage-collect every column, filter, join and
    /// sort that referenced it.
    pub fn remove_table(&self, table_id: &str) -> Self {
        let mut next = self.clone();
        next.tables.retain(|t| t.id != table_id);
        next.columns.retain(|c| c.table_id != table_id);
        next.filters.retain(|f| f.table_id != table_id);
        next.joins
            .retain(|j| j.from_table_id != table_id && j.to_table_id != table_id);
        next.order_by.retain(|s| s.table_id != table_id);
        next
    }

    /// Add a column selection.
    pub fn add_column(&self, column: ColumnSelection) -> Self {
        let mut next = self.clone();
        next.columns.push(column);
        next
    }

    /// Replace the column selection at `index`. Out-of-range indexes leave
    /// the query unchanged.
    pub fn update_column(&self, index: usize, column: ColumnSelection) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.columns.get_mut(index) {
            *slot = column;
        }
        next
    }

    /// Remove the column selection at `index`.
    pub fn remove_column(&self, index: usize) -> Self {
        let mut next = self.clone();
        if index < next.columns.len() {
            next.columns.remove(index);
        }
        next
    }

    /// Add a filter.
    pub fn add_filter(&self, filter: FilterDefinition) -> Self {
        let mut next = self.clone();
        next.filters.push(filter);
        next
    }

    /// Replace the filter at `index`.
    pub fn update_filter(&self, index: usize, filter: FilterDefinition) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.filters.get_mut(index) {
            *slot = filter;
        }
        next
    }

    /// Remove the filter at `index`.
    pub fn remove_filter(&self, index: usize) -> Self {
        let mut next = self.clone();
        if index < next.filters.len() {
            next.filters.remove(index);
        }
        next
    }

    /// Add a join.
    pub fn add_join(&self, join: JoinDefinition) -> Self {
        let mut next = self.clone();
        next.joins.push(join);
        next
    }

    /// Replace the join at `index`.
    pub fn update_join(&self, index: usize, join: JoinDefinition) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.joins.get_mut(index) {
            *slot = join;
        }
        next
    }

    /// Remove the join at `index`.
    pub fn remove_join(&self, index: usize) -> Self {
        let mut next = self.clone();
        if index < next.joins.len() {
            next.joins.remove(index);
        }
        next
    }

    /// Add a sort entry.
    pub fn add_sort(&self, sort: SortDefinition) -> Self {
        let mut next = self.clone();
        next.order_by.push(sort);
        next
    }

    /// Replace the sort entry at `index`.
    pub fn update_sort(&self, index: usize, sort: SortDefinition) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.order_by.get_mut(index) {
            *slot = sort;
        }
        next
    }

    /// Remove the sort entry at `index`.
    pub fn remove_sort(&self, index: usize) -> Self {
        let mut next = self.clone();
        if index < next.order_by.len() {
            next.order_by.remove(index);
        }
        next
    }

    /// Set or clear the row limit.
    pub fn set_limit(&self, limit: Option<u64>) -> Self {
        let mut next = self.clone();
        next.limit = limit;
        next
    }

    /// Look up a query table by id.
    pub fn find_table(&self, table_id: &str) -> Option<&QueryTable> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    /// Check that every table referenced by columns, filters, joins and
    /// sorts exists in `tables`.
    pub fn check_references(&self) -> Result<(), ModelError> {
        let exists = |id: &str| self.tables.iter().any(|t| t.id == id);
        let unknown = |id: &str| ModelError::UnknownTable {
            table_id: id.to_string(),
        };

        for c in &self.columns {
            if !exists(&c.table_id) {
                return Err(unknown(&c.table_id));
            }
        }
        for f in &self.filters {
            if !exists(&f.table_id) {
                return Err(unknown(&f.table_id));
            }
        }
        for j in &self.joins {
            if !exists(&j.from_table_id) {
                return Err(unknown(&j.from_table_id));
            }
            if !exists(&j.to_table_id) {
                return Err(unknown(&j.to_table_id));
            }
        }
        for s in &self.order_by {
            if !exists(&s.table_id) {
                return Err(unknown(&s.table_id));
            }
        }
        Ok(())
    }
}

// ============================================================================
// DEFAULT SEEDS
// ============================================================================

/// Seed a sensible filter for a newly added table: equality on the table's
/// first schema column, no value yet.
pub fn default_filter_seed(schema: &DatabaseSchema, table: &QueryTable) -> FilterDefinition {
    let column = schema
        .find_table(&table.name)
        .and_then(|t| t.columns.first())
        .map(|c| c.name.clone())
        .unwrap_or_default();
    FilterDefinition {
        table_id: table.id.clone(),
        column,
        operator: FilterOperator::Eq,
        value: FilterValue::Scalar(Value::Null),
    }
}

/// Seed a join between two query tables.
///
/// Preference order: a declared schema relationship, then the foreign-key
/// naming pattern `<singularized-table>_id`, then each table's first column.
/// This is a UX heuristic, not a correctness contract.
pub fn default_join_seed(
    schema: &DatabaseSchema,
    from: &QueryTable,
    to: &QueryTable,
) -> JoinDefinition {
    let from_schema = schema.find_table(&from.name);
    let to_schema = schema.find_table(&to.name);

    let (from_column, to_column) = if let Some(rel) = schema.relationship_between(&from.name, &to.name)
    {
        if rel.from_table == from.name {
            (rel.from_column.clone(), rel.to_column.clone())
        } else {
            (rel.to_column.clone(), rel.from_column.clone())
        }
    } else if let Some(fk) = from_schema.and_then(|t| guess_foreign_key(t, &to.name)) {
        (fk, "id".to_string())
    } else if let Some(fk) = to_schema.and_then(|t| guess_foreign_key(t, &from.name)) {
        ("id".to_string(), fk)
    } else {
        (
            first_column_name(from_schema),
            first_column_name(to_schema),
        )
    };

    JoinDefinition {
        from_table_id: from.id.clone(),
        from_column,
        to_table_id: to.id.clone(),
        to_column,
        join_type: JoinType::Inner,
    }
}

fn first_column_name(table: Option<&TableSchema>) -> String {
    table
        .and_then(|t| t.columns.first())
        .map(|c| c.name.clone())
        .unwrap_or_default()
}

/// Look for a `<singularized-counterpart>_id` column in `table`.
fn guess_foreign_key(table: &TableSchema, counterpart: &str) -> Option<String> {
    let candidate = format!("{}_id", singularize(counterpart));
    table.find_column(&candidate).map(|c| c.name.clone())
}

fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{}y", stem)
    } else if let Some(stem) = name.strip_suffix('s') {
        stem.to_string()
    } else {
        name.to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSchema, Relationship, TableSchema};
    use proptest::prelude::*;
    use serde_json::json;

    fn table(id: &str, name: &str) -> QueryTable {
        QueryTable {
            id: id.to_string(),
            name: name.to_string(),
            alias: None,
        }
    }

    fn column(table_id: &str, name: &str) -> ColumnSelection {
        ColumnSelection {
            table_id: table_id.to_string(),
            column: name.to_string(),
            aggregation: Aggregation::None,
        }
    }

    fn sample_query() -> QueryDefinition {
        QueryDefinition::new()
            .add_table(table("t1", "orders"))
            .add_table(table("t2", "customers"))
            .add_column(column("t1", "total"))
            .add_column(column("t2", "name"))
            .add_filter(FilterDefinition {
                table_id: "t1".to_string(),
                column: "status".to_string(),
                operator: FilterOperator::Eq,
                value: FilterValue::Scalar(json!("open")),
            })
            .add_join(JoinDefinition {
                from_table_id: "t1".to_string(),
                from_column: "customer_id".to_string(),
                to_table_id: "t2".to_string(),
                to_column: "id".to_string(),
                join_type: JoinType::Left,
            })
            .add_sort(SortDefinition {
                table_id: "t1".to_string(),
                column: "total".to_string(),
                direction: SortDirection::Desc,
            })
    }

    fn sample_schema() -> DatabaseSchema {
        DatabaseSchema {
            tables: vec![
                TableSchema {
                    name: "orders".to_string(),
                    columns: vec![
                        ColumnSchema {
                            name: "id".to_string(),
                            data_type: DataType::Integer,
                            nullable: false,
                        },
                        ColumnSchema {
                            name: "customer_id".to_string(),
                            data_type: DataType::Integer,
                            nullable: false,
                        },
                        ColumnSchema {
                            name: "total".to_string(),
                            data_type: DataType::Numeric,
                            nullable: false,
                        },
                    ],
                },
                TableSchema {
                    name: "customers".to_string(),
                    columns: vec![
                        ColumnSchema {
                            name: "id".to_string(),
                            data_type: DataType::Integer,
                            nullable: false,
                        },
                        ColumnSchema {
                            name: "name".to_string(),
                            data_type: DataType::Text,
                            nullable: false,
                        },
                    ],
                },
            ],
            relationships: Vec::new(),
        }
    }

    #[test]
    fn test_can_execute_requires_tables_and_columns() {
        let empty = QueryDefinition::new();
        assert!(!empty.can_execute());

        let only_table = empty.add_table(table("t1", "orders"));
        assert!(!only_table.can_execute());

        let executable = only_table.add_column(column("t1", "total"));
        assert!(executable.can_execute());
    }

    #[test]
    fn test_edits_never_mutate_the_input() {
        let query = sample_query();
        let snapshot = query.clone();

        let _ = query.add_table(table("t3", "items"));
        let _ = query.remove_table("t1");
        let _ = query.update_column(0, column("t1", "id"));
        let _ = query.remove_filter(0);
        let _ = query.set_limit(Some(10));

        assert_eq!(query, snapshot);
    }

    #[test]
    fn test_remove_table_garbage_collects_references() {
        let query = sample_query();
        let next = query.remove_table("t1");

        assert_eq!(next.tables.len(), 1);
        assert!(next.columns.iter().all(|c| c.table_id != "t1"));
        assert!(next.filters.is_empty());
        assert!(next.joins.is_empty());
        assert!(next.order_by.is_empty());
        assert!(next.check_references().is_ok());
    }

    #[test]
    fn test_update_out_of_range_is_a_noop() {
        let query = sample_query();
        assert_eq!(query.update_column(99, column("t1", "id")), query);
        assert_eq!(query.remove_join(99), query);
        assert_eq!(query.update_table(table("missing", "x")), query);
    }

    #[test]
    fn test_check_references_flags_orphans() {
        let mut query = sample_query();
        query.tables.retain(|t| t.id != "t2");
        let err = query.check_references().unwrap_err();
        assert!(matches!(err, ModelError::UnknownTable { table_id } if table_id == "t2"));
    }

    #[test]
    fn test_operator_value_shapes() {
        assert_eq!(FilterOperator::Eq.expected_shape(), ValueShape::Scalar);
        assert_eq!(FilterOperator::In.expected_shape(), ValueShape::List);
        assert_eq!(FilterOperator::InOrNull.expected_shape(), ValueShape::List);
        assert_eq!(FilterOperator::Between.expected_shape(), ValueShape::Range);
        assert_eq!(FilterOperator::IsNull.expected_shape(), ValueShape::None);
    }

    #[test]
    fn test_filter_value_shape_check() {
        let ok = FilterDefinition {
            table_id: "t1".to_string(),
            column: "total".to_string(),
            operator: FilterOperator::Between,
            value: FilterValue::Range {
                min: json!(1),
                max: json!(10),
            },
        };
        assert!(ok.check_value_shape().is_ok());

        let bad = FilterDefinition {
            operator: FilterOperator::IsNull,
            value: FilterValue::Scalar(json!(1)),
            ..ok
        };
        assert!(bad.check_value_shape().is_err());
    }

    #[test]
    fn test_filter_value_untagged_serde() {
        let list = FilterValue::List(vec![json!("a"), json!("b")]);
        let json_text = serde_json::to_string(&list).unwrap();
        assert_eq!(json_text, "[\"a\",\"b\"]");
        assert_eq!(serde_json::from_str::<FilterValue>(&json_text).unwrap(), list);

        let range = FilterValue::Range {
            min: json!(1),
            max: json!(5),
        };
        let json_text = serde_json::to_string(&range).unwrap();
        assert_eq!(serde_json::from_str::<FilterValue>(&json_text).unwrap(), range);

        assert_eq!(
            serde_json::from_str::<FilterValue>("null").unwrap(),
            FilterValue::None
        );
        assert_eq!(
            serde_json::from_str::<FilterValue>("\"eu\"").unwrap(),
            FilterValue::Scalar(json!("eu"))
        );
    }

    #[test]
    fn test_aggregation_constraints() {
        assert!(Aggregation::Sum.allowed_for(DataType::Numeric));
        assert!(!Aggregation::Sum.allowed_for(DataType::Text));
        assert!(Aggregation::Min.allowed_for(DataType::Date));
        assert!(!Aggregation::Max.allowed_for(DataType::Json));
        assert!(Aggregation::Count.allowed_for(DataType::Json));
    }

    #[test]
    fn test_default_join_seed_prefers_declared_relationship() {
        let mut schema = sample_schema();
        // A declared relationship wins over the naming heuristic, even when
        // its columns differ from what the heuristic would pick.
        schema.relationships.push(Relationship {
            from_table: "customers".to_string(),
            from_column: "id".to_string(),
            to_table: "orders".to_string(),
            to_column: "buyer_ref".to_string(),
        });

        let join = default_join_seed(&schema, &table("t1", "orders"), &table("t2", "customers"));
        assert_eq!(join.from_column, "buyer_ref");
        assert_eq!(join.to_column, "id");
        assert_eq!(join.join_type, JoinType::Inner);
    }

    #[test]
    fn test_default_join_seed_guesses_foreign_key() {
        let schema = sample_schema();
        let join = default_join_seed(&schema, &table("t1", "orders"), &table("t2", "customers"));
        // `customers` singularizes to `customer`, and orders has customer_id.
        assert_eq!(join.from_column, "customer_id");
        assert_eq!(join.to_column, "id");
    }

    #[test]
    fn test_default_join_seed_falls_back_to_first_columns() {
        let schema = DatabaseSchema {
            tables: vec![
                TableSchema {
                    name: "alpha".to_string(),
                    columns: vec![ColumnSchema {
                        name: "a0".to_string(),
                        data_type: DataType::Integer,
                        nullable: false,
                    }],
                },
                TableSchema {
                    name: "beta".to_string(),
                    columns: vec![ColumnSchema {
                        name: "b0".to_string(),
                        data_type: DataType::Integer,
                        nullable: false,
                    }],
                },
            ],
            relationships: Vec::new(),
        };
        let join = default_join_seed(&schema, &table("t1", "alpha"), &table("t2", "beta"));
        assert_eq!(join.from_column, "a0");
        assert_eq!(join.to_column, "b0");
    }

    #[test]
    fn test_default_filter_seed_uses_first_column() {
        let schema = sample_schema();
        let filter = default_filter_seed(&schema, &table("t1", "orders"));
        assert_eq!(filter.column, "id");
        assert_eq!(filter.operator, FilterOperator::Eq);
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("customers"), "customer");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("status"), "statu");
        assert_eq!(singularize("order"), "order");
    }

    proptest! {
        /// Edit operations are referentially pure for arbitrary small queries.
        #[test]
        fn prop_edits_are_pure(
            table_count in 0usize..4,
            column_count in 0usize..4,
            limit in proptest::option::of(0u64..1000),
            index in 0usize..6,
        ) {
            let mut query = QueryDefinition::new();
            for i in 0..table_count {
                query = query.add_table(table(&format!("t{}", i), "orders"));
            }
            for i in 0..column_count {
                query = query.add_column(column(&format!("t{}", i % table_count.max(1)), "total"));
            }

            let snapshot = query.clone();
            let _ = query.set_limit(limit);
            let _ = query.remove_column(index);
            let _ = query.remove_table("t0");
            prop_assert_eq!(&query, &snapshot);

            prop_assert_eq!(
                query.can_execute(),
                !query.tables.is_empty() && !query.columns.is_empty()
            );
        }
    }
}
