//! Facet Charts - Result-to-Series Transformation
//!
//! Converts a tabular [`QueryResult`] into category/series form for chart
//! rendering. The transform is a pure function: malformed input produces an
//! empty [`ChartData`], never an error.
//!
//! Consumers can assume rectangular alignment: every series has exactly
//! `categories.len()` entries, with `None` filling missing group/category
//! combinations.

use facet_core::{QueryResult, SortDirection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Which axis drives category ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Lexicographic on the category label.
    X,
    /// Numeric on the first Y series, `None` ordered as 0.
    Y,
}

/// Transformation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub x_column: String,
    pub y_columns: Vec<String>,
    /// When set, rows are bucketed per group value and only the first Y
    /// column is used.
    pub group_column: Option<String>,
    pub sort_by: Option<SortBy>,
    pub sort_direction: SortDirection,
    pub limit: Option<usize>,
}

impl ChartOptions {
    /// Options with no grouping, sorting or limit.
    pub fn new(x_column: impl Into<String>, y_columns: Vec<String>) -> Self {
        Self {
            x_column: x_column.into(),
            y_columns,
            group_column: None,
            sort_by: None,
            sort_direction: SortDirection::Asc,
            limit: None,
        }
    }
}

/// One named series, aligned to the category axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub data: Vec<Option<f64>>,
}

/// Chart-ready data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
    pub is_empty: bool,
    /// Row count of the untransformed result.
    pub total_rows: usize,
}

impl ChartData {
    fn empty(total_rows: usize) -> Self {
        Self {
            categories: Vec::new(),
            series: Vec::new(),
            is_empty: true,
            total_rows,
        }
    }
}

/// Transform a result set into category/series form.
///
/// Returns an empty `ChartData` when the result is missing or empty, when
/// `x_column` does not resolve, or when none of `y_columns` resolve.
pub fn transform(result: Option<&QueryResult>, options: &ChartOptions) -> ChartData {
    let result = match result {
        Some(r) if !r.rows.is_empty() => r,
        Some(r) => return ChartData::empty(r.rows.len()),
        None => return ChartData::empty(0),
    };

    let x_index = match result.column_index(&options.x_column) {
        Some(i) => i,
        None => return ChartData::empty(result.rows.len()),
    };

    let y_columns: Vec<(String, usize)> = options
        .y_columns
        .iter()
        .filter_map(|name| result.column_index(name).map(|i| (name.clone(), i)))
        .collect();
    if y_columns.is_empty() {
        return ChartData::empty(result.rows.len());
    }

    let group_index = options
        .group_column
        .as_deref()
        .and_then(|name| result.column_index(name));

    match group_index {
        Some(group_index) => {
            transform_grouped(result, options, x_index, y_columns[0].1, group_index)
        }
        // An unresolvable group column degrades to the ungrouped transform.
        None => transform_ungrouped(result, options, x_index, &y_columns),
    }
}

fn transform_ungrouped(
    result: &QueryResult,
    options: &ChartOptions,
    x_index: usize,
    y_columns: &[(String, usize)],
) -> ChartData {
    let total_rows = result.rows.len();

    let mut points: Vec<(String, Vec<Option<f64>>)> = result
        .rows
        .iter()
        .map(|row| {
            let category = row.get(x_index).map(category_label).unwrap_or_default();
            let values = y_columns
                .iter()
                .map(|(_, i)| row.get(*i).and_then(coerce_number))
                .collect();
            (category, values)
        })
        .collect();

    if let Some(sort_by) = options.sort_by {
        sort_points(&mut points, sort_by, options.sort_direction);
    }
    if let Some(limit) = options.limit {
        points.truncate(limit);
    }

    let categories = points.iter().map(|(c, _)| c.clone()).collect();
    let series = y_columns
        .iter()
        .enumerate()
        .map(|(series_index, (name, _))| ChartSeries {
            name: name.clone(),
            data: points.iter().map(|(_, values)| values[series_index]).collect(),
        })
        .collect();

    ChartData {
        categories,
        series,
        is_empty: false,
        total_rows,
    }
}

fn transform_grouped(
    result: &QueryResult,
    options: &ChartOptions,
    x_index: usize,
    y_index: usize,
    group_index: usize,
) -> ChartData {
    let total_rows = result.rows.len();

    // Sparse group -> category -> value map, with first-observed ordering on
    // both axes. Later duplicates overwrite earlier observations.
    let mut categories: Vec<String> = Vec::new();
    let mut category_slots: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<String> = Vec::new();
    let mut group_slots: HashMap<String, usize> = HashMap::new();
    let mut matrix: Vec<Vec<Option<f64>>> = Vec::new();

    for row in &result.rows {
        let category = row.get(x_index).map(category_label).unwrap_or_default();
        let group = row.get(group_index).map(category_label).unwrap_or_default();
        let value = row.get(y_index).and_then(coerce_number);

        let column = *category_slots.entry(category.clone()).or_insert_with(|| {
            categories.push(category.clone());
            for series in matrix.iter_mut() {
                series.push(None);
            }
            categories.len() - 1
        });
        let row_slot = *group_slots.entry(group.clone()).or_insert_with(|| {
            groups.push(group.clone());
            matrix.push(vec![None; categories.len()]);
            matrix.len() - 1
        });
        matrix[row_slot][column] = value;
    }

    // Joint permutation of the category axis: every series is reordered
    // identically, keyed by the first group's values when sorting on Y.
    if let Some(sort_by) = options.sort_by {
        let mut order: Vec<usize> = (0..categories.len()).collect();
        match sort_by {
            SortBy::X => order.sort_by(|&a, &b| categories[a].cmp(&categories[b])),
            SortBy::Y => order.sort_by(|&a, &b| {
                let ka = matrix[0][a].unwrap_or(0.0);
                let kb = matrix[0][b].unwrap_or(0.0);
                ka.total_cmp(&kb)
            }),
        }
        if options.sort_direction == SortDirection::Desc {
            order.reverse();
        }
        categories = order.iter().map(|&i| categories[i].clone()).collect();
        matrix = matrix
            .iter()
            .map(|series| order.iter().map(|&i| series[i]).collect())
            .collect();
    }

    // Limit truncates categories, not groups.
    if let Some(limit) = options.limit {
        categories.truncate(limit);
        for series in matrix.iter_mut() {
            series.truncate(limit);
        }
    }

    let series = groups
        .into_iter()
        .zip(matrix)
        .map(|(name, data)| ChartSeries { name, data })
        .collect();

    ChartData {
        categories,
        series,
        is_empty: false,
        total_rows,
    }
}

fn sort_points(
    points: &mut [(String, Vec<Option<f64>>)],
    sort_by: SortBy,
    direction: SortDirection,
) {
    match sort_by {
        SortBy::X => points.sort_by(|a, b| a.0.cmp(&b.0)),
        SortBy::Y => points.sort_by(|a, b| {
            let ka = a.1.first().copied().flatten().unwrap_or(0.0);
            let kb = b.1.first().copied().flatten().unwrap_or(0.0);
            ka.total_cmp(&kb)
        }),
    }
    if direction == SortDirection::Desc {
        points.reverse();
    }
}

/// Coerce a cell to a number, or `None` when it cannot be parsed. Unparsable
/// values never become NaN.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Render a cell as a category label.
fn category_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
