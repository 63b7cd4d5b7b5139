//! Categorical correlation analysis between two columns.
//!
//! [`analyze`] validates the inputs, cross-tabulates the two variables,
//! runs the chi-squared test and derives the normalized and lift matrices.
//! Rendering (text, JSON, heatmaps) lives in `report` and `plot`.

use super::chi_square::{chi_square_test, ChiSquareTest, Significance};
use super::contingency::{strongest_associations, ContingencyTable, StrongestAssociation};
use super::summary::distinct_count;
use crate::error::AnalysisError;
use crate::models::Table;
use serde::Serialize;
use tracing::debug;

/// Default minimum raw count for a lift cell to be reported.
pub const DEFAULT_MIN_SAMPLE: u64 = 25;

/// Parameters of a correlation analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationOptions {
    /// Lift cells with a raw count below this are suppressed.
    pub min_sample: u64,
    /// Apply Yates' continuity correction to 2x2 tables.
    pub yates_correction: bool,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self {
            min_sample: DEFAULT_MIN_SAMPLE,
            yates_correction: true,
        }
    }
}

/// Full result of a correlation analysis.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationReport {
    pub var1: String,
    pub var2: String,
    /// Distinct non-missing values of `var1`.
    pub var1_distinct: usize,
    /// Distinct non-missing values of `var2`.
    pub var2_distinct: usize,
    /// Rows in the input table.
    pub observations: usize,
    pub contingency: ContingencyTable,
    pub chi_square: ChiSquareTest,
    pub significance: Significance,
    /// Row-normalized contingency table.
    pub normalized: Vec<Vec<f64>>,
    /// Lift over the global share; `None` where the count is below `min_sample`.
    pub lift: Vec<Vec<Option<f64>>>,
    pub min_sample: u64,
    pub strongest: Vec<StrongestAssociation>,
}

/// Analyze the association between two categorical columns.
pub fn analyze(
    table: &Table,
    var1: &str,
    var2: &str,
    options: CorrelationOptions,
) -> Result<CorrelationReport, AnalysisError> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyTable);
    }

    let first = table.column(var1)?;
    let second = table.column(var2)?;

    let var1_distinct = distinct_count(first);
    let var2_distinct = distinct_count(second);

    let contingency = ContingencyTable::from_table(table, var1, var2)?;
    debug!(
        "Contingency table {} x {} over {} paired observations",
        contingency.n_rows(),
        contingency.n_cols(),
        contingency.grand_total()
    );

    if contingency.n_rows() < 2 {
        return Err(AnalysisError::DegenerateVariable {
            column: var1.to_string(),
            distinct: contingency.n_rows(),
        });
    }
    if contingency.n_cols() < 2 {
        return Err(AnalysisError::DegenerateVariable {
            column: var2.to_string(),
            distinct: contingency.n_cols(),
        });
    }

    let chi_square = chi_square_test(&contingency, options.yates_correction)?;
    debug!(
        "chi2 = {:.4}, p = {:.6}, dof = {}, yates = {}",
        chi_square.statistic,
        chi_square.p_value,
        chi_square.degrees_of_freedom,
        chi_square.yates_corrected
    );

    let significance = Significance::from_p_value(chi_square.p_value);
    let normalized = contingency.normalized();
    let lift = contingency.lift(options.min_sample);
    let strongest = strongest_associations(&contingency, &normalized);

    Ok(CorrelationReport {
        var1: var1.to_string(),
        var2: var2.to_string(),
        var1_distinct,
        var2_distinct,
        observations: table.len(),
        contingency,
        chi_square,
        significance,
        normalized,
        lift,
        min_sample: options.min_sample,
        strongest,
    })
}
