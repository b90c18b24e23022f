//! Least squares solvers.
//!
//! Every fitting path in the engine ends up solving a small, tall system:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2
//! ```
//!
//! - Weighted problems are reduced to ordinary ones by scaling rows with
//!   `sqrt(w_i)`.
//! - We solve with SVD so near-collinear designs (e.g. a log-linear window
//!   with almost constant time stamps) degrade gracefully instead of
//!   panicking. Nalgebra's `QR::solve` is meant for square systems.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve `minimize Σ w_i (y_i - x_i^T β)^2`.
///
/// Zero weights are allowed (the row drops out); negative or non-finite
/// weights make the problem invalid.
pub fn solve_weighted_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    w: &[f64],
) -> Option<DVector<f64>> {
    if w.len() != x.nrows() || y.len() != x.nrows() {
        return None;
    }
    if w.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return None;
    }

    let mut xw = x.clone();
    let mut yw = y.clone();
    for (i, &wi) in w.iter().enumerate() {
        let sw = wi.sqrt();
        for j in 0..x.ncols() {
            xw[(i, j)] *= sw;
        }
        yw[i] *= sw;
    }
    solve_least_squares(&xw, &yw)
}

/// Invert a small symmetric matrix, `None` when it is singular.
pub fn invert_symmetric(a: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    if a.nrows() != a.ncols() || a.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let inv = a.clone().try_inverse()?;
    if inv.iter().all(|v| v.is_finite()) {
        Some(inv)
    } else {
        None
    }
}

/// Design matrix `[1, x]` for a straight line.
pub fn line_design(x: &[f64]) -> DMatrix<f64> {
    DMatrix::from_fn(x.len(), 2, |i, j| if j == 0 { 1.0 } else { x[i] })
}
