//! Database schema types returned by the gateway's schema endpoint.

use serde::{Deserialize, Serialize};

/// Column data type as reported by the analytical backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Integer,
    Float,
    Numeric,
    Text,
    Boolean,
    Date,
    Timestamp,
    Json,
}

impl DataType {
    /// Whether the type supports arithmetic aggregation (sum, avg).
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Integer | DataType::Float | DataType::Numeric)
    }

    /// Whether the type has a total order usable by min/max.
    pub fn is_orderable(self) -> bool {
        !matches!(self, DataType::Json)
    }
}

/// A column within a schema table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub nullable: bool,
}

/// A table exposed by the backend schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Look up a column by name.
    pub fn find_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A declared foreign-key relationship between two schema tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

/// The full schema of the analytical backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub tables: Vec<TableSchema>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl DatabaseSchema {
    /// Look up a table by name.
    pub fn find_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Find a declared relationship connecting two tables, in either direction.
    pub fn relationship_between(&self, a: &str, b: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| {
            (r.from_table == a && r.to_table == b) || (r.from_table == b && r.to_table == a)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
                    ],
                },
                TableSchema {
                    name: "customers".to_string(),
                    columns: vec![ColumnSchema {
                        name: "id".to_string(),
                        data_type: DataType::Integer,
                        nullable: false,
                    }],
                },
            ],
            relationships: vec![Relationship {
                from_table: "orders".to_string(),
                from_column: "customer_id".to_string(),
                to_table: "customers".to_string(),
                to_column: "id".to_string(),
            }],
        }
    }

    #[test]
    fn test_find_table_and_column() {
        let schema = sample_schema();
        let orders = schema.find_table("orders").unwrap();
        assert!(orders.find_column("customer_id").is_some());
        assert!(orders.find_column("missing").is_none());
        assert!(schema.find_table("missing").is_none());
    }

    #[test]
    fn test_relationship_between_is_direction_agnostic() {
        let schema = sample_schema();
        assert!(schema.relationship_between("orders", "customers").is_some());
        assert!(schema.relationship_between("customers", "orders").is_some());
        assert!(schema.relationship_between("orders", "orders").is_none());
    }

    #[test]
    fn test_data_type_predicates() {
        assert!(DataType::Integer.is_numeric());
        assert!(DataType::Numeric.is_numeric());
        assert!(!DataType::Text.is_numeric());
        assert!(DataType::Date.is_orderable());
        assert!(!DataType::Json.is_orderable());
    }
}
