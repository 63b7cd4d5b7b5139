//! Pearson's chi-squared test of independence.

use super::contingency::ContingencyTable;
use crate::error::AnalysisError;
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::fmt;

/// p-value below which an association counts as very highly significant.
pub const VERY_HIGH_SIGNIFICANCE: f64 = 0.01;

/// p-value below which an association counts as highly significant.
pub const HIGH_SIGNIFICANCE: f64 = 0.05;

/// Outcome of a chi-squared test of independence.
#[derive(Debug, Clone, Serialize)]
pub struct ChiSquareTest {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
    /// Expected frequencies under independence.
    #[serde(skip)]
    pub expected: Vec<Vec<f64>>,
    /// Whether Yates' continuity correction was applied.
    pub yates_corrected: bool,
}

/// Three-tier significance label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    /// p < 0.01
    VeryHigh,
    /// 0.01 <= p < 0.05
    High,
    /// p >= 0.05
    None,
}

impl Significance {
    /// Classify a p-value.
    pub fn from_p_value(p: f64) -> Self {
        if p < VERY_HIGH_SIGNIFICANCE {
            Significance::VeryHigh
        } else if p < HIGH_SIGNIFICANCE {
            Significance::High
        } else {
            Significance::None
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Significance::VeryHigh => write!(f, "Very high significance detected (p < 0.01)"),
            Significance::High => write!(f, "High significance detected (p < 0.05)"),
            Significance::None => write!(f, "No significance detected (p ≥ 0.05)"),
        }
    }
}

/// Run the test on a contingency table.
///
/// With one degree of freedom and `correction` set, every observed count is
/// moved towards its expectation by at most 0.5 before the statistic is
/// summed (Yates' continuity correction).
pub fn chi_square_test(
    table: &ContingencyTable,
    correction: bool,
) -> Result<ChiSquareTest, AnalysisError> {
    let rows = table.n_rows();
    let cols = table.n_cols();
    let grand = table.grand_total();

    if grand == 0 || rows == 0 || cols == 0 {
        return Err(AnalysisError::EmptyTable);
    }

    let dof = (rows - 1) * (cols - 1);
    if dof == 0 {
        return Err(AnalysisError::Statistics(format!(
            "degrees of freedom must be positive ({} x {} table)",
            rows, cols
        )));
    }

    let row_totals = table.row_totals();
    let col_totals = table.col_totals();

    let expected: Vec<Vec<f64>> = row_totals
        .iter()
        .map(|&r| {
            col_totals
                .iter()
                .map(|&c| r as f64 * c as f64 / grand as f64)
                .collect()
        })
        .collect();

    let yates_corrected = correction && dof == 1;

    let mut statistic = 0.0;
    for (observed_row, expected_row) in table.counts.iter().zip(&expected) {
        for (&observed, &e) in observed_row.iter().zip(expected_row) {
            if e <= 0.0 {
                return Err(AnalysisError::Statistics(
                    "expected frequency of zero in contingency table".to_string(),
                ));
            }
            let mut o = observed as f64;
            if yates_corrected {
                let diff = e - o;
                o += diff.signum() * diff.abs().min(0.5);
            }
            let d = o - e;
            statistic += d * d / e;
        }
    }

    if !statistic.is_finite() {
        return Err(AnalysisError::Statistics(
            "chi-squared statistic is not finite".to_string(),
        ));
    }

    let dist = ChiSquared::new(dof as f64)
        .map_err(|e| AnalysisError::Statistics(format!("invalid distribution: {}", e)))?;
    let p_value = dist.sf(statistic).clamp(0.0, 1.0);
    if !p_value.is_finite() {
        return Err(AnalysisError::Statistics(
            "p-value is not finite".to_string(),
        ));
    }

    Ok(ChiSquareTest {
        statistic,
        p_value,
        degrees_of_freedom: dof,
        expected,
        yates_corrected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    fn table_from_counts(counts: Vec<Vec<u64>>) -> ContingencyTable {
        ContingencyTable {
            row_labels: (0..counts.len() as i64).map(Value::Integer).collect(),
            col_labels: (0..counts[0].len() as i64).map(Value::Integer).collect(),
            counts,
        }
    }

    #[test]
    fn test_significance_boundaries() {
        assert_eq!(Significance::from_p_value(0.0), Significance::VeryHigh);
        assert_eq!(Significance::from_p_value(0.0099), Significance::VeryHigh);
        assert_eq!(Significance::from_p_value(0.01), Significance::High);
        assert_eq!(Significance::from_p_value(0.0499), Significance::High);
        assert_eq!(Significance::from_p_value(0.05), Significance::None);
        assert_eq!(Significance::from_p_value(0.9), Significance::None);
    }

    #[test]
    fn test_uncorrected_statistic() {
        // Expected counts are all 25; statistic = 4 * 100 / 25
        let ct = table_from_counts(vec![vec![35, 15], vec![15, 35]]);
        let test = chi_square_test(&ct, false).unwrap();

        assert_eq!(test.degrees_of_freedom, 1);
        assert!(!test.yates_corrected);
        assert!((test.statistic - 16.0).abs() < 1e-9);
        assert!(test.p_value < 0.001);
        assert!((test.expected[0][0] - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_yates_correction_on_2x2() {
        // |O - E| = 10 for every cell, corrected to 9.5
        let ct = table_from_counts(vec![vec![35, 15], vec![15, 35]]);
        let test = chi_square_test(&ct, true).unwrap();

        assert!(test.yates_corrected);
        assert!((test.statistic - 4.0 * 9.5 * 9.5 / 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_correction_for_larger_tables() {
        let ct = table_from_counts(vec![vec![10, 20, 30], vec![30, 20, 10]]);
        let test = chi_square_test(&ct, true).unwrap();

        assert_eq!(test.degrees_of_freedom, 2);
        assert!(!test.yates_corrected);
        // Expected 20 everywhere: (100 + 0 + 100) * 2 / 20
        assert!((test.statistic - 20.0).abs() < 1e-9);
        // Survival function of chi2(2) is exp(-x/2)
        assert!((test.p_value - (-10.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_independent_table_has_p_of_one() {
        let ct = table_from_counts(vec![vec![25, 25], vec![25, 25]]);
        let test = chi_square_test(&ct, true).unwrap();
        assert!(test.statistic.abs() < 1e-12);
        assert!((test.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_row_is_rejected() {
        let ct = table_from_counts(vec![vec![3, 4]]);
        assert!(matches!(
            chi_square_test(&ct, true),
            Err(AnalysisError::Statistics(_))
        ));
    }
}
