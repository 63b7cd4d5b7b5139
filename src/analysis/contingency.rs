//! Cross-tabulation of two categorical columns and the matrices derived
//! from it.

use crate::error::AnalysisError;
use crate::models::{Table, Value};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Co-occurrence counts of two categorical variables.
///
/// Rows are the distinct values of the first variable and columns the
/// distinct values of the second, both in sorted [`Value`] order. Rows of
/// the source table where either value is missing are not counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContingencyTable {
    pub row_labels: Vec<Value>,
    pub col_labels: Vec<Value>,
    pub counts: Vec<Vec<u64>>,
}

impl ContingencyTable {
    /// Cross-tabulate two columns of a table.
    pub fn from_table(table: &Table, var1: &str, var2: &str) -> Result<Self, AnalysisError> {
        let first = table.column(var1)?;
        let second = table.column(var2)?;
        Ok(Self::from_pairs(first.iter().zip(second.iter())))
    }

    /// Cross-tabulate an iterator of value pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a Value, &'a Value)>,
    {
        let mut cells: BTreeMap<(&Value, &Value), u64> = BTreeMap::new();
        let mut rows: BTreeSet<&Value> = BTreeSet::new();
        let mut cols: BTreeSet<&Value> = BTreeSet::new();

        for (a, b) in pairs {
            if a.is_missing() || b.is_missing() {
                continue;
            }
            rows.insert(a);
            cols.insert(b);
            *cells.entry((a, b)).or_insert(0) += 1;
        }

        let row_index: BTreeMap<&Value, usize> =
            rows.iter().enumerate().map(|(i, v)| (*v, i)).collect();
        let col_index: BTreeMap<&Value, usize> =
            cols.iter().enumerate().map(|(i, v)| (*v, i)).collect();

        let mut counts = vec![vec![0u64; cols.len()]; rows.len()];
        for ((a, b), count) in cells {
            counts[row_index[a]][col_index[b]] = count;
        }

        Self {
            row_labels: rows.into_iter().cloned().collect(),
            col_labels: cols.into_iter().cloned().collect(),
            counts,
        }
    }

    /// Number of rows (distinct values of the first variable).
    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    /// Number of columns (distinct values of the second variable).
    pub fn n_cols(&self) -> usize {
        self.col_labels.len()
    }

    /// Sum of each row.
    pub fn row_totals(&self) -> Vec<u64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    /// Sum of each column.
    pub fn col_totals(&self) -> Vec<u64> {
        let mut totals = vec![0u64; self.n_cols()];
        for row in &self.counts {
            for (total, count) in totals.iter_mut().zip(row) {
                *total += count;
            }
        }
        totals
    }

    /// Total number of paired observations.
    pub fn grand_total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Each row divided by its row total (conditional distribution of the
    /// second variable given the first). Rows with a zero total stay zero.
    pub fn normalized(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .zip(self.row_totals())
            .map(|(row, total)| {
                row.iter()
                    .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
                    .collect()
            })
            .collect()
    }

    /// Share of each column in the grand total.
    pub fn global_shares(&self) -> Vec<f64> {
        let grand = self.grand_total();
        self.col_totals()
            .into_iter()
            .map(|t| if grand == 0 { 0.0 } else { t as f64 / grand as f64 })
            .collect()
    }

    /// Lift of each cell over the column's global share.
    ///
    /// Cells whose raw count is below `min_sample` are `None`.
    pub fn lift(&self, min_sample: u64) -> Vec<Vec<Option<f64>>> {
        let shares = self.global_shares();

        self.normalized()
            .into_iter()
            .zip(&self.counts)
            .map(|(row, counts)| {
                row.into_iter()
                    .zip(counts)
                    .zip(&shares)
                    .map(|((value, &count), &share)| {
                        if count < min_sample || share == 0.0 {
                            None
                        } else {
                            Some(value / share)
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// Column holding the largest share of a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrongestAssociation {
    pub row: Value,
    pub column: Value,
    /// Share of the row, between 0 and 1.
    pub share: f64,
}

/// For every row, the column with the maximum normalized share.
///
/// Ties resolve to the first column in label order.
pub fn strongest_associations(
    table: &ContingencyTable,
    normalized: &[Vec<f64>],
) -> Vec<StrongestAssociation> {
    table
        .row_labels
        .iter()
        .zip(normalized)
        .filter_map(|(label, row)| {
            let (col, share) = row.iter().enumerate().fold(
                None,
                |best: Option<(usize, f64)>, (i, &v)| match best {
                    Some((_, b)) if b >= v => best,
                    _ => Some((i, v)),
                },
            )?;
            Some(StrongestAssociation {
                row: label.clone(),
                column: table.col_labels[col].clone(),
                share,
            })
        })
        .collect()
}
