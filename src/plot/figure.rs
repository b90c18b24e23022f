//! Diagnostic figure description.
//!
//! A figure is plain data: title, axis labels, the y-axis scale and a list of
//! scatter/line series. Renderers ([`crate::plot::svg`],
//! [`crate::plot::ascii`]) turn it into output; nothing here displays or
//! writes anything.

use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    Linear,
    /// Base-10 logarithmic; non-positive values are not drawn.
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Scatter,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub kind: SeriesKind,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticFigure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub y_scale: AxisScale,
    pub series: Vec<Series>,
}

impl DiagnosticFigure {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>, y_scale: AxisScale) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            y_scale,
            series: Vec::new(),
        }
    }

    pub fn scatter(self, label: impl Into<String>, x: &[f64], y: &[f64]) -> Self {
        self.with_series(label.into(), SeriesKind::Scatter, x, y)
    }

    pub fn line(self, label: impl Into<String>, x: &[f64], y: &[f64]) -> Self {
        self.with_series(label.into(), SeriesKind::Line, x, y)
    }

    fn with_series(mut self, label: String, kind: SeriesKind, x: &[f64], y: &[f64]) -> Self {
        let points = x.iter().copied().zip(y.iter().copied()).collect();
        self.series.push(Series { label, kind, points });
        self
    }

    /// Points of `series` in plotting coordinates: finite only, and with
    /// `log10(y)` on a log axis.
    pub fn plot_points(&self, series: &Series) -> Vec<(f64, f64)> {
        series
            .points
            .iter()
            .filter_map(|&(x, y)| {
                let y = match self.y_scale {
                    AxisScale::Linear => y,
                    AxisScale::Log if y > 0.0 => y.log10(),
                    AxisScale::Log => return None,
                };
                (x.is_finite() && y.is_finite()).then_some((x, y))
            })
            .collect()
    }

    /// `([x_min, x_max], [y_min, y_max])` over every drawable point, in
    /// plotting coordinates. `None` when nothing can be drawn.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut x = [f64::INFINITY, f64::NEG_INFINITY];
        let mut y = [f64::INFINITY, f64::NEG_INFINITY];
        for s in &self.series {
            for (px, py) in self.plot_points(s) {
                x = [x[0].min(px), x[1].max(px)];
                y = [y[0].min(py), y[1].max(py)];
            }
        }
        if x[0].is_finite() && y[0].is_finite() {
            Some((widen(x), widen(y)))
        } else {
            None
        }
    }

    pub fn to_svg(&self, width: u32, height: u32) -> Result<String, AppError> {
        crate::plot::svg::render_svg(self, width, height)
    }

    pub fn to_ascii(&self, width: usize, height: usize) -> String {
        crate::plot::ascii::render_ascii(self, width, height)
    }
}

/// Give a degenerate range some extent so it can be mapped.
fn widen(r: [f64; 2]) -> [f64; 2] {
    if r[1] > r[0] {
        r
    } else {
        let pad = (r[0].abs() * 0.05).max(0.5);
        [r[0] - pad, r[1] + pad]
    }
}
