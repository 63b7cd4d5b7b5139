//! Colour scales for heatmaps and colour parsing for configured bar colours.

use super::PlotError;
use plotters::style::RGBColor;

/// Piecewise-linear colour scale over `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct ColorScale {
    stops: &'static [(f64, (u8, u8, u8))],
}

/// Light to dark blue, for raw counts.
pub const BLUES: ColorScale = ColorScale {
    stops: &[
        (0.0, (247, 251, 255)),
        (0.5, (107, 174, 214)),
        (1.0, (8, 48, 107)),
    ],
};

/// Yellow through orange to dark red, for row percentages.
pub const YL_OR_RD: ColorScale = ColorScale {
    stops: &[
        (0.0, (255, 255, 204)),
        (0.5, (253, 141, 60)),
        (1.0, (128, 0, 38)),
    ],
};

/// Blue, white, red; the neutral colour sits at 0.5.
pub const RD_BU_R: ColorScale = ColorScale {
    stops: &[
        (0.0, (5, 48, 97)),
        (0.25, (67, 147, 195)),
        (0.5, (247, 247, 247)),
        (0.75, (214, 96, 77)),
        (1.0, (103, 0, 31)),
    ],
};

impl ColorScale {
    /// Colour at position `t`, clamped to `[0, 1]`.
    pub fn at(&self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        for pair in self.stops.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t <= t1 {
                let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
                return RGBColor(lerp(c0.0, c1.0, f), lerp(c0.1, c1.1, f), lerp(c0.2, c1.2, f));
            }
        }

        let (_, last) = self.stops[self.stops.len() - 1];
        RGBColor(last.0, last.1, last.2)
    }
}

fn lerp(a: u8, b: u8, f: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * f).round() as u8
}

/// How cell values map onto a colour scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorMapping {
    /// Linear from `min` (0.0) to `max` (1.0).
    Sequential { min: f64, max: f64 },
    /// `center` maps to 0.5; values are clamped to `[vmin, vmax]` and the
    /// larger distance from the centre spans half the scale.
    Diverging { center: f64, vmin: f64, vmax: f64 },
}

impl ColorMapping {
    /// Sequential mapping over the finite values of a matrix.
    pub fn sequential_for(cells: &[Vec<Option<f64>>]) -> Self {
        let (min, max) = cells
            .iter()
            .flatten()
            .flatten()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        if min.is_finite() {
            ColorMapping::Sequential { min, max }
        } else {
            ColorMapping::Sequential { min: 0.0, max: 1.0 }
        }
    }

    /// Position of `value` on the colour scale.
    pub fn position(&self, value: f64) -> f64 {
        match *self {
            ColorMapping::Sequential { min, max } => {
                if max > min {
                    (value - min) / (max - min)
                } else {
                    0.5
                }
            }
            ColorMapping::Diverging { center, vmin, vmax } => {
                let half = (vmax - center).max(center - vmin);
                if half <= 0.0 {
                    return 0.5;
                }
                let clamped = value.clamp(vmin, vmax);
                0.5 + (clamped - center) / (2.0 * half)
            }
        }
    }
}

/// Black or white, whichever reads better on `background`.
pub fn text_color_for(background: RGBColor) -> RGBColor {
    let luminance = 0.299 * background.0 as f64
        + 0.587 * background.1 as f64
        + 0.114 * background.2 as f64;
    if luminance < 128.0 {
        RGBColor(255, 255, 255)
    } else {
        RGBColor(0, 0, 0)
    }
}

/// Parse `#rrggbb` (the leading `#` is optional).
pub fn parse_hex_color(text: &str) -> Result<RGBColor, PlotError> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(PlotError::InvalidData(format!(
            "Invalid colour '{}': expected #rrggbb",
            text
        )));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| {
            PlotError::InvalidData(format!("Invalid colour '{}': expected #rrggbb", text))
        })
    };

    Ok(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
