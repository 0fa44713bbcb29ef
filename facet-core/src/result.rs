//! Tabular query results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tabular result set returned by the backend.
///
/// Rows are positional: each row has the same length and column order as
/// `columns`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: u64,
}

impl QueryResult {
    /// Positional index of a named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Whether the result carries no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
