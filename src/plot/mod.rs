//! Chart rendering with [`plotters`].
//!
//! All charts are drawn on the bitmap backend and saved as PNG files, so
//! rendering works the same on a desktop and in CI.

pub mod bars;
pub mod colors;
pub mod heatmap;

use thiserror::Error;

pub use bars::{render_share_vs_conversion, BarChartStyle};
pub use heatmap::render_correlation_heatmaps;

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to create output directory: {0}")]
    OutputDir(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

/// Make sure the parent directory of `path` exists.
fn ensure_parent_dir(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Characters kept when a value is used in a file name.
pub fn file_stem_component(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
