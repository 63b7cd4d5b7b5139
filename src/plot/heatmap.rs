//! Stacked heatmaps for the correlation analysis.

use super::colors::{text_color_for, ColorMapping, ColorScale, BLUES, RD_BU_R, YL_OR_RD};
use super::{ensure_parent_dir, PlotError, Result};
use crate::analysis::CorrelationReport;
use plotters::coord::ranged1d::{SegmentValue, SegmentedCoord};
use plotters::coord::types::RangedCoordu32;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::info;

/// Centre of the affinity colour scale.
pub const AFFINITY_CENTER: f64 = 1.0;
/// Lower end of the displayed affinity range.
pub const AFFINITY_MIN: f64 = 0.5;
/// Upper end of the displayed affinity range.
pub const AFFINITY_MAX: f64 = 2.0;

/// How cell annotations are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    /// Whole number.
    Count,
    /// Fraction rendered as a percentage with two decimals.
    Percent,
    /// Two decimals.
    Ratio,
}

impl CellFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            CellFormat::Count => format!("{:.0}", value),
            CellFormat::Percent => format!("{:.2}%", value * 100.0),
            CellFormat::Ratio => format!("{:.2}", value),
        }
    }
}

/// One heatmap panel. `None` cells are left blank.
#[derive(Debug, Clone)]
pub struct HeatmapPanel {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
    pub scale: ColorScale,
    pub mapping: ColorMapping,
    pub format: CellFormat,
}

impl HeatmapPanel {
    fn color_for(&self, value: f64) -> RGBColor {
        self.scale.at(self.mapping.position(value))
    }
}

/// Build the counts, row-percentage and affinity panels of a report.
pub fn correlation_panels(report: &CorrelationReport) -> Vec<HeatmapPanel> {
    let rows: Vec<String> = report
        .contingency
        .row_labels
        .iter()
        .map(|v| v.to_string())
        .collect();
    let cols: Vec<String> = report
        .contingency
        .col_labels
        .iter()
        .map(|v| v.to_string())
        .collect();
    let pair = format!("{} vs {}", report.var1, report.var2);

    let counts: Vec<Vec<Option<f64>>> = report
        .contingency
        .counts
        .iter()
        .map(|row| row.iter().map(|&c| Some(c as f64)).collect())
        .collect();
    let normalized: Vec<Vec<Option<f64>>> = report
        .normalized
        .iter()
        .map(|row| row.iter().map(|&v| Some(v)).collect())
        .collect();

    let panel = |title: String,
                 cells: Vec<Vec<Option<f64>>>,
                 scale: ColorScale,
                 mapping: ColorMapping,
                 format: CellFormat| HeatmapPanel {
        title,
        x_desc: report.var2.clone(),
        y_desc: report.var1.clone(),
        row_labels: rows.clone(),
        col_labels: cols.clone(),
        cells,
        scale,
        mapping,
        format,
    };

    let count_mapping = ColorMapping::sequential_for(&counts);
    let share_mapping = ColorMapping::sequential_for(&normalized);

    vec![
        panel(
            format!("Absolute frequencies - {}", pair),
            counts,
            BLUES,
            count_mapping,
            CellFormat::Count,
        ),
        panel(
            format!("Normalized per row (%) - {}", pair),
            normalized,
            YL_OR_RD,
            share_mapping,
            CellFormat::Percent,
        ),
        panel(
            format!("Affinity (min. {} observations) - {}", report.min_sample, pair),
            report.lift.clone(),
            RD_BU_R,
            ColorMapping::Diverging {
                center: AFFINITY_CENTER,
                vmin: AFFINITY_MIN,
                vmax: AFFINITY_MAX,
            },
            CellFormat::Ratio,
        ),
    ]
}

/// Title line of the heatmap figure.
pub fn figure_title(report: &CorrelationReport) -> String {
    format!(
        "Association analysis: {} and {} | χ²={:.1}, p={:.3}",
        report.var1, report.var2, report.chi_square.statistic, report.chi_square.p_value
    )
}

/// Render the three correlation heatmaps into one PNG.
pub fn render_correlation_heatmaps(
    report: &CorrelationReport,
    size: (u32, u32),
    output_path: &Path,
) -> Result<()> {
    let panels = correlation_panels(report);
    render_heatmaps(&panels, &figure_title(report), size, output_path)?;
    info!("Saved heatmaps to: {}", output_path.display());
    Ok(())
}

/// Render stacked heatmap panels into a PNG file.
pub fn render_heatmaps(
    panels: &[HeatmapPanel],
    title: &str,
    size: (u32, u32),
    output_path: &Path,
) -> Result<()> {
    if panels.is_empty() {
        return Err(PlotError::InvalidData("No panels to draw".to_string()));
    }
    for panel in panels {
        validate_panel(panel)?;
    }

    ensure_parent_dir(output_path)?;

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let body = root
        .titled(title, ("sans-serif", 32))
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let areas = body.split_evenly((panels.len(), 1));
    for (panel, area) in panels.iter().zip(areas.iter()) {
        draw_panel(panel, area)?;
    }

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

fn validate_panel(panel: &HeatmapPanel) -> Result<()> {
    if panel.row_labels.is_empty() || panel.col_labels.is_empty() {
        return Err(PlotError::InvalidData(format!(
            "Panel '{}' has no rows or columns",
            panel.title
        )));
    }
    if panel.cells.len() != panel.row_labels.len()
        || panel
            .cells
            .iter()
            .any(|row| row.len() != panel.col_labels.len())
    {
        return Err(PlotError::InvalidData(format!(
            "Panel '{}' cells do not match its labels",
            panel.title
        )));
    }
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(panel: &HeatmapPanel, area: &DrawingArea<DB, Shift>) -> Result<()> {
    let n_rows = panel.row_labels.len();
    let n_cols = panel.col_labels.len();

    let y_label_width = panel
        .row_labels
        .iter()
        .map(|l| l.chars().count() as u32)
        .max()
        .unwrap_or(0)
        .clamp(4, 30)
        * 10
        + 40;

    // Index axes; the y axis counts bottom-up so the first row is drawn on top
    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(y_label_width)
        .build_cartesian_2d(index_axis(n_cols), index_axis(n_rows))
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let x_label = |v: &SegmentValue<u32>| segment_label(&panel.col_labels, v, false);
    let y_label = |v: &SegmentValue<u32>| segment_label(&panel.row_labels, v, true);

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(panel.x_desc.as_str())
        .y_desc(panel.y_desc.as_str())
        .x_labels(n_cols)
        .y_labels(n_rows)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let mut cells = Vec::new();
    for (r, row) in panel.cells.iter().enumerate() {
        let y = (n_rows - 1 - r) as u32;
        for (x, cell) in row.iter().enumerate() {
            if let Some(value) = cell.filter(|v| v.is_finite()) {
                cells.push((x as u32, y, value));
            }
        }
    }

    chart
        .draw_series(cells.iter().map(|&(x, y, value)| {
            Rectangle::new(
                [
                    (edge(x, n_cols), edge(y, n_rows)),
                    (edge(x + 1, n_cols), edge(y + 1, n_rows)),
                ],
                panel.color_for(value).filled(),
            )
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .draw_series(cells.iter().map(|&(x, y, value)| {
            let color = text_color_for(panel.color_for(value));
            Text::new(
                panel.format.format(value),
                (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                ("sans-serif", 16)
                    .into_font()
                    .color(&color)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            )
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

/// Segmented axis with one segment per category.
///
/// Integer ranges are inclusive in plotters, so `n` segments span `0..n-1`.
pub(super) fn index_axis(n: usize) -> SegmentedCoord<RangedCoordu32> {
    (0u32..n.saturating_sub(1) as u32).into_segmented()
}

/// Left/bottom edge of segment `index`; one past the last segment is the axis end.
pub(super) fn edge(index: u32, n: usize) -> SegmentValue<u32> {
    if (index as usize) < n {
        SegmentValue::Exact(index)
    } else {
        SegmentValue::Last
    }
}

/// Category label at the centre of a segment; `bottom_up` axes count from the last label.
fn segment_label(labels: &[String], value: &SegmentValue<u32>, bottom_up: bool) -> String {
    match value {
        SegmentValue::CenterOf(i) => {
            let i = *i as usize;
            let index = if bottom_up {
                labels.len().checked_sub(i + 1)
            } else {
                Some(i)
            };
            index
                .and_then(|idx| labels.get(idx))
                .cloned()
                .unwrap_or_default()
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::correlation::{analyze, CorrelationOptions};
    use crate::models::{Table, Value};

    fn report() -> CorrelationReport {
        let mut a = Vec::new();
        let mut b = Vec::new();
        for (x, y, n) in [("x", "p", 40), ("x", "q", 5), ("y", "p", 10), ("y", "q", 45)] {
            for _ in 0..n {
                a.push(Value::from(x));
                b.push(Value::from(y));
            }
        }
        let table =
            Table::from_columns(vec![("A".to_string(), a), ("B".to_string(), b)]).unwrap();
        analyze(&table, "A", "B", CorrelationOptions::default()).unwrap()
    }

    #[test]
    fn test_cell_format() {
        assert_eq!(CellFormat::Count.format(42.0), "42");
        assert_eq!(CellFormat::Percent.format(0.12345), "12.35%");
        assert_eq!(CellFormat::Ratio.format(1.5), "1.50");
    }

    #[test]
    fn test_correlation_panels() {
        let report = report();
        let panels = correlation_panels(&report);

        assert_eq!(panels.len(), 3);
        assert!(panels[0].title.starts_with("Absolute frequencies"));
        assert_eq!(panels[0].cells[0][0], Some(40.0));
        assert_eq!(panels[1].format, CellFormat::Percent);
        assert_eq!(panels[0].row_labels, vec!["x", "y"]);
        assert_eq!(panels[0].col_labels, vec!["p", "q"]);
        assert_eq!(panels[0].x_desc, "B");
        assert_eq!(panels[0].y_desc, "A");

        // (x, q) has 5 observations, below the default minimum of 25
        assert_eq!(panels[2].cells[0][1], None);
        assert_eq!(
            panels[2].mapping,
            ColorMapping::Diverging {
                center: 1.0,
                vmin: 0.5,
                vmax: 2.0
            }
        );
    }

    #[test]
    fn test_figure_title() {
        let title = figure_title(&report());
        assert!(title.starts_with("Association analysis: A and B | χ²="));
        assert!(title.contains(", p=0.000"));
    }

    #[test]
    fn test_render_rejects_mismatched_panel() {
        let mut panels = correlation_panels(&report());
        panels[1].cells.pop();

        let dir = tempfile::tempdir().unwrap();
        let result = render_heatmaps(&panels, "t", (800, 600), &dir.path().join("h.png"));
        assert!(matches!(result, Err(PlotError::InvalidData(_))));
    }

    #[test]
    fn test_render_correlation_heatmaps_writes_png() {
        let report = report();
        // (x, q) falls below the minimum sample and must render as a blank cell
        assert!(report.lift.iter().flatten().any(|cell| cell.is_none()));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts").join("A_vs_B_heatmaps.png");
        render_correlation_heatmaps(&report, (700, 900), &path).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_index_axis_edges() {
        assert!(matches!(edge(0, 3), SegmentValue::Exact(0)));
        assert!(matches!(edge(2, 3), SegmentValue::Exact(2)));
        assert!(matches!(edge(3, 3), SegmentValue::Last));
    }

    #[test]
    fn test_segment_labels() {
        let labels = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(0), false), "x");
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(0), true), "z");
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(2), true), "x");
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(7), false), "");
        assert_eq!(segment_label(&labels, &SegmentValue::Exact(1), false), "");
    }
}
