//! Value counts and per-column summaries.

use crate::error::AnalysisError;
use crate::models::{Table, Value};
use serde::Serialize;
use std::collections::HashMap;

/// Count of a single distinct value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: Value,
    pub count: usize,
    /// Share of all table rows (missing values included), in percent.
    pub percentage: f64,
}

/// Frequency summary of one column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    /// Total rows of the table.
    pub total_rows: usize,
    /// Number of distinct non-missing values.
    pub distinct: usize,
    /// Number of missing values.
    pub missing: usize,
    /// Non-missing values, most frequent first.
    pub counts: Vec<ValueCount>,
}

impl ColumnSummary {
    /// Share of missing values in percent.
    pub fn missing_percentage(&self) -> f64 {
        percentage(self.missing, self.total_rows)
    }

    /// The `n` most frequent values.
    pub fn top(&self, n: usize) -> &[ValueCount] {
        &self.counts[..n.min(self.counts.len())]
    }
}

/// Count distinct non-missing values, most frequent first.
///
/// Values with equal counts keep the order of their first appearance.
pub fn value_counts(values: &[Value]) -> Vec<(Value, usize)> {
    let mut index: HashMap<&Value, usize> = HashMap::new();
    let mut counts: Vec<(Value, usize)> = Vec::new();

    for value in values.iter().filter(|v| !v.is_missing()) {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value.clone(), 1));
            }
        }
    }

    // Stable sort keeps first-appearance order among ties
    counts.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    counts
}

/// Number of distinct non-missing values.
pub fn distinct_count(values: &[Value]) -> usize {
    values
        .iter()
        .filter(|v| !v.is_missing())
        .collect::<std::collections::HashSet<_>>()
        .len()
}

/// Summarize a single column.
pub fn summarize_column(table: &Table, column: &str) -> Result<ColumnSummary, AnalysisError> {
    let values = table.column(column)?;
    let total_rows = table.len();
    let missing = values.iter().filter(|v| v.is_missing()).count();

    let counts: Vec<ValueCount> = value_counts(values)
        .into_iter()
        .map(|(value, count)| ValueCount {
            value,
            count,
            percentage: percentage(count, total_rows),
        })
        .collect();

    Ok(ColumnSummary {
        column: column.to_string(),
        total_rows,
        distinct: counts.len(),
        missing,
        counts,
    })
}

/// Summarize several columns, failing on the first unknown one.
pub fn summarize_columns<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
) -> Result<Vec<ColumnSummary>, AnalysisError> {
    columns
        .iter()
        .map(|c| summarize_column(table, c.as_ref()))
        .collect()
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
