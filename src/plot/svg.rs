//! SVG rendering of a [`DiagnosticFigure`] with plotters.
//!
//! Log-scaled figures are drawn in `log10(y)` coordinates with tick labels
//! mapped back to data values.

use std::error::Error;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::AppError;
use crate::plot::figure::{AxisScale, DiagnosticFigure, SeriesKind};

const PALETTE: [RGBColor; 5] = [
    RGBColor(31, 119, 180),
    RGBColor(214, 39, 40),
    RGBColor(44, 160, 44),
    RGBColor(255, 127, 14),
    RGBColor(148, 103, 189),
];

/// Render `figure` to an SVG document.
pub fn render_svg(figure: &DiagnosticFigure, width: u32, height: u32) -> Result<String, AppError> {
    if width < 100 || height < 80 {
        return Err(AppError::config(format!("Figure size {width}x{height} is too small.")));
    }
    let Some((xb, yb)) = figure.bounds() else {
        return Err(AppError::data(format!("Figure '{}' has no drawable points.", figure.title)));
    };

    let mut out = String::new();
    {
        let root = SVGBackend::with_string(&mut out, (width, height)).into_drawing_area();
        draw(figure, &root, xb, yb)
            .and_then(|_| root.present().map_err(Into::into))
            .map_err(|e| AppError::io(format!("Failed to render figure '{}': {e}", figure.title)))?;
    }
    Ok(out)
}

fn draw(
    figure: &DiagnosticFigure,
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    xb: [f64; 2],
    yb: [f64; 2],
) -> Result<(), Box<dyn Error>> {
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .caption(&figure.title, ("sans-serif", 18))
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(xb[0]..xb[1], yb[0]..yb[1])?;

    let log = figure.y_scale == AxisScale::Log;
    let fmt_y = move |v: &f64| {
        if log {
            format!("{:.3}", 10f64.powf(*v))
        } else {
            format!("{v:.3}")
        }
    };

    chart
        .configure_mesh()
        .x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .x_labels(8)
        .y_labels(6)
        .y_label_formatter(&fmt_y)
        .draw()?;

    for (i, series) in figure.series.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let points = figure.plot_points(series);
        match series.kind {
            SeriesKind::Scatter => {
                chart
                    .draw_series(points.iter().map(|&p| Circle::new(p, 2, color.filled())))?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| Circle::new((x + 8, y), 3, color.filled()));
            }
            SeriesKind::Line => {
                chart
                    .draw_series(LineSeries::new(points, color.stroke_width(2)))?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2)));
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_an_svg_document() {
        let t: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = t.iter().map(|v| (-v / 5.0).exp()).collect();
        let fig = DiagnosticFigure::new("Recovery", "Time (s)", "H/H0", AxisScale::Log)
            .scatter("Observed", &t, &y)
            .line("Fit", &t, &y);
        let svg = render_svg(&fig, 640, 480).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Recovery"));
    }

    #[test]
    fn empty_figure_is_reported() {
        let fig = DiagnosticFigure::new("Empty", "x", "y", AxisScale::Linear);
        assert!(render_svg(&fig, 640, 480).is_err());
    }
}
