//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - line series: `-`
//! - scatter series: `o`, then `x`, `+`, `*` for further series

use crate::plot::figure::{AxisScale, DiagnosticFigure, SeriesKind};

const MARKERS: [char; 4] = ['o', 'x', '+', '*'];

/// Render `figure` on a `width x height` character grid with a one-line header.
pub fn render_ascii(figure: &DiagnosticFigure, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let ([x_min, x_max], [y_min, y_max]) = figure.bounds().unwrap_or(([0.0, 1.0], [0.0, 1.0]));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Lines first so points overlay them.
    for s in figure.series.iter().filter(|s| s.kind == SeriesKind::Line) {
        draw_curve(&mut grid, &figure.plot_points(s), x_min, x_max, y_min, y_max);
    }

    let scatter = figure.series.iter().filter(|s| s.kind == SeriesKind::Scatter);
    for (k, s) in scatter.enumerate() {
        let ch = MARKERS[k % MARKERS.len()];
        for (x, y) in figure.plot_points(s) {
            let col = map_x(x, x_min, x_max, width);
            let row = map_y(y, y_min, y_max, height);
            grid[row][col] = ch;
        }
    }

    let y_note = match figure.y_scale {
        AxisScale::Linear => "",
        AxisScale::Log => " (log10)",
    };
    let mut out = String::new();
    out.push_str(&format!(
        "{}: x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.2}, {y_max:.2}]{y_note}\n",
        figure.title
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
