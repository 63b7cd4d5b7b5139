//! Overlaid bar chart of user share and conversion rate per group.

use super::colors::parse_hex_color;
use super::heatmap::index_axis;
use super::{ensure_parent_dir, PlotError, Result};
use crate::analysis::ConversionSummary;
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::info;

/// Colours and size of the share/conversion chart.
#[derive(Debug, Clone)]
pub struct BarChartStyle {
    pub size: (u32, u32),
    pub share_color: RGBColor,
    pub conversion_color: RGBColor,
    pub average_color: RGBColor,
}

impl Default for BarChartStyle {
    fn default() -> Self {
        Self {
            size: (1600, 800),
            share_color: RGBColor(211, 211, 211),
            conversion_color: RGBColor(255, 215, 0),
            average_color: RGBColor(255, 99, 71),
        }
    }
}

impl BarChartStyle {
    /// Build a style from `#rrggbb` strings.
    pub fn from_hex(size: (u32, u32), share: &str, conversion: &str, average: &str) -> Result<Self> {
        Ok(Self {
            size,
            share_color: parse_hex_color(share)?,
            conversion_color: parse_hex_color(conversion)?,
            average_color: parse_hex_color(average)?,
        })
    }
}

/// Fraction of a group's slot covered by the share bar.
const SHARE_BAR_WIDTH: f64 = 0.8;
/// Fraction of a group's slot covered by the conversion bar.
const CONVERSION_BAR_WIDTH: f64 = 0.3;

/// Pixel margin on each side of a bar covering `width` of a `slot` wide segment.
fn bar_margin(slot: u32, width: f64) -> u32 {
    ((slot as f64 * (1.0 - width)) / 2.0).round() as u32
}

/// Render the share vs. conversion chart of a summary into a PNG.
pub fn render_share_vs_conversion(
    summary: &ConversionSummary,
    style: &BarChartStyle,
    output_path: &Path,
) -> Result<()> {
    if summary.rows.is_empty() {
        return Err(PlotError::InvalidData(format!(
            "No groups to plot for column '{}'",
            summary.column
        )));
    }

    ensure_parent_dir(output_path)?;

    let labels: Vec<String> = summary.rows.iter().map(|r| r.group.to_string()).collect();
    let n = labels.len();

    let root = BitMapBackend::new(output_path, style.size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let title = format!("User share and conversion rate by {}", summary.column);
    let mut chart = ChartBuilder::on(&root)
        .caption(&title, ("sans-serif", 36))
        .margin(20)
        .x_label_area_size(90)
        .y_label_area_size(70)
        .build_cartesian_2d(index_axis(n), 0f64..100f64)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let x_label = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(BLACK.mix(0.1))
        .x_desc(summary.column.as_str())
        .y_desc("Share (%)")
        .x_labels(n)
        .x_label_formatter(&x_label)
        .y_label_formatter(&|y| format!("{:.0}", y))
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 20))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let (plot_width, _) = chart.plotting_area().dim_in_pixel();
    let slot = plot_width / n as u32;
    let share_margin = bar_margin(slot, SHARE_BAR_WIDTH);

    let share_color = style.share_color;
    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(share_color.mix(0.6).filled())
                .margin(share_margin)
                .data(summary.rows.iter().enumerate().map(|(i, r)| (i as u32, r.user_share))),
        )
        .map_err(|e| PlotError::Drawing(e.to_string()))?
        .label("User share")
        .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], share_color.filled()));

    let conversion_color = style.conversion_color;
    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(conversion_color.mix(0.6).filled())
                .margin(bar_margin(slot, CONVERSION_BAR_WIDTH))
                .data(
                    summary
                        .rows
                        .iter()
                        .enumerate()
                        .map(|(i, r)| (i as u32, r.conversion_rate)),
                ),
        )
        .map_err(|e| PlotError::Drawing(e.to_string()))?
        .label("Conversion rate")
        .legend(move |(x, y)| {
            Rectangle::new([(x, y - 6), (x + 14, y + 6)], conversion_color.filled())
        });

    let average_color = style.average_color;
    let average = summary.global_conversion;
    chart
        .draw_series(DashedLineSeries::new(
            vec![(SegmentValue::Exact(0), average), (SegmentValue::Last, average)],
            12,
            8,
            average_color.stroke_width(2),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?
        .label(format!("Average conversion rate ({:.2}%)", average))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], average_color.stroke_width(2)));

    // Share labels start at the left edge of the wide bar, conversion labels
    // are centred over the narrow one
    let share_label_style = ("sans-serif", 14)
        .into_font()
        .color(&RGBColor(128, 128, 128))
        .pos(Pos::new(HPos::Left, VPos::Bottom));
    let conversion_label_style = ("sans-serif", 15)
        .into_font()
        .style(FontStyle::Bold)
        .color(&RGBColor(105, 105, 105))
        .pos(Pos::new(HPos::Center, VPos::Bottom));

    chart
        .draw_series(summary.rows.iter().enumerate().map(|(i, row)| {
            EmptyElement::at((SegmentValue::Exact(i as u32), (row.user_share + 2.0).min(99.0)))
                + Text::new(
                    format!("{:.1}%", row.user_share),
                    (share_margin as i32, 0),
                    share_label_style.clone(),
                )
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .draw_series(summary.rows.iter().enumerate().map(|(i, row)| {
            Text::new(
                format!("{:.2}%", row.conversion_rate),
                (
                    SegmentValue::CenterOf(i as u32),
                    (row.conversion_rate + 1.0).min(99.0),
                ),
                conversion_label_style.clone(),
            )
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 16))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    info!("Saved share vs. conversion chart to: {}", output_path.display());
    Ok(())
}
