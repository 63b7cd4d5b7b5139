//! Domain errors for the analyses.
//!
//! Application plumbing (config, file IO, CLI) uses `anyhow`; the analysis
//! routines return these typed errors so callers can tell an input problem
//! from a statistically meaningless request.

use thiserror::Error;

/// Errors raised by the table accessors and the analysis routines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The requested column is not part of the table.
    #[error("column not found: '{column}' (available: {})", available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    /// The table has no rows.
    #[error("table is empty: no observations to analyze")]
    EmptyTable,

    /// A variable has fewer than two distinct (paired) values.
    #[error("column '{column}' has {distinct} distinct value(s); at least 2 are required")]
    DegenerateVariable { column: String, distinct: usize },

    /// The statistical routine could not produce a finite result.
    #[error("statistics error: {0}")]
    Statistics(String),
}
