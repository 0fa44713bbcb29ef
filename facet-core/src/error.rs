//! Error types for query model validation helpers.

use thiserror::Error;

use crate::query::{Aggregation, FilterOperator, ValueShape};
use crate::schema::DataType;

/// Errors surfaced by the model's own consistency checks. These are advisory:
/// the backend's validate call remains authoritative for query validity.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("Unknown table reference: {table_id}")]
    UnknownTable { table_id: String },

    #[error("Filter on {column} expects a {expected:?} value for operator {operator:?}")]
    InvalidFilterValue {
        column: String,
        operator: FilterOperator,
        expected: ValueShape,
    },

    #[error("Aggregation {aggregation:?} is not valid for column type {data_type:?}")]
    InvalidAggregation {
        aggregation: Aggregation,
        data_type: DataType,
    },
}
