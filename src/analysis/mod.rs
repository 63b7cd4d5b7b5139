//! Analysis modules.
//!
//! Everything here is a pure function of a borrowed [`crate::models::Table`];
//! printing and chart rendering are left to `report` and `plot`.

pub mod chi_square;
pub mod contingency;
pub mod conversion;
pub mod correlation;
pub mod summary;

pub use conversion::{conversion_summary, ConversionColumns, ConversionSummary, SortKey};
pub use correlation::{analyze, CorrelationOptions, CorrelationReport};
pub use summary::{summarize_column, summarize_columns, ColumnSummary};
