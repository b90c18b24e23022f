//! Robust straight-line regression via iteratively reweighted least squares.
//!
//! The loop follows the classic M-estimation recipe:
//!
//! - start from the OLS fit (unit weights)
//! - compute residuals and a robust scale (normalized MAD)
//! - derive weights from the chosen norm and refit by weighted least squares
//! - stop when the coefficients no longer move
//!
//! This keeps a handful of spiky samples in a log-linear recovery window from
//! dragging the slope around.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::math::{line_design, mad_scale, solve_weighted_least_squares};

/// M-estimator norm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobustNorm {
    /// Huber's T, quadratic near zero and linear in the tails.
    Huber,
    /// Tukey's biweight; far outliers get zero weight.
    Tukey,
}

impl RobustNorm {
    /// Default tuning constant (95% efficiency under normal errors).
    pub fn tuning_constant(self) -> f64 {
        match self {
            RobustNorm::Huber => 1.345,
            RobustNorm::Tukey => 4.685,
        }
    }

    /// IRLS weight for a standardized residual `u`.
    pub fn weight(self, u: f64) -> f64 {
        let c = self.tuning_constant();
        let au = u.abs();
        if !au.is_finite() {
            return 0.0;
        }
        match self {
            RobustNorm::Huber => {
                if au <= c {
                    1.0
                } else {
                    c / au
                }
            }
            RobustNorm::Tukey => {
                if au <= c {
                    let q = 1.0 - (u / c) * (u / c);
                    q * q
                } else {
                    0.0
                }
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RobustNorm::Huber => "huber",
            RobustNorm::Tukey => "tukey",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobustLinearFit {
    pub norm: RobustNorm,
    pub intercept: f64,
    pub slope: f64,
    /// Final robust residual scale.
    pub scale: f64,
    /// Final observation weights.
    pub weights: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

const MAX_ITER: usize = 50;
const TOL: f64 = 1e-8;
/// Below this residual scale the fit is treated as exact.
const SCALE_FLOOR: f64 = 1e-12;

/// Fit `y = intercept + slope * x` with the given M-estimator.
///
/// Callers guarantee `x.len() == y.len() >= 2`.
pub fn fit_line_robust(x: &[f64], y: &[f64], norm: RobustNorm) -> Result<RobustLinearFit, String> {
    let design = line_design(x);
    let yv = DVector::from_column_slice(y);
    let mut weights = vec![1.0; x.len()];

    let mut beta = solve_weighted_least_squares(&design, &yv, &weights)
        .ok_or_else(|| "Initial least squares solve failed (singular design).".to_string())?;

    let mut scale = 0.0;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < MAX_ITER {
        let residuals: Vec<f64> = (0..x.len())
            .map(|i| y[i] - (beta[0] + beta[1] * x[i]))
            .collect();
        scale = mad_scale(&residuals).unwrap_or(0.0);
        if !(scale.is_finite() && scale > SCALE_FLOOR) {
            // Residuals are (almost) all zero: the current line is exact.
            converged = true;
            break;
        }

        weights = residuals.iter().map(|r| norm.weight(r / scale)).collect();
        if weights.iter().filter(|w| **w > 0.0).count() < 2 {
            return Err(format!(
                "{} weights left fewer than two informative samples.",
                norm.label()
            ));
        }

        let next = solve_weighted_least_squares(&design, &yv, &weights)
            .ok_or_else(|| "Weighted least squares solve failed (singular design).".to_string())?;
        iterations += 1;

        let shift = (0..2)
            .map(|j| (next[j] - beta[j]).abs() / (1.0 + beta[j].abs()))
            .fold(0.0, f64::max);
        beta = next;
        if shift < TOL {
            converged = true;
            break;
        }
    }

    Ok(RobustLinearFit {
        norm,
        intercept: beta[0],
        slope: beta[1],
        scale,
        weights,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_with_outliers() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.5).collect();
        let mut y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, v)| -0.4 * v + 1.0 + if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        y[5] += 3.0;
        y[20] -= 4.0;
        (x, y)
    }

    #[test]
    fn huber_resists_outliers() {
        let (x, y) = line_with_outliers();
        let fit = fit_line_robust(&x, &y, RobustNorm::Huber).unwrap();
        assert!((fit.slope + 0.4).abs() < 0.02, "slope={}", fit.slope);
        assert!(fit.weights[5] < 0.1);
        assert!(fit.converged);
    }

    #[test]
    fn tukey_rejects_outliers_entirely() {
        let (x, y) = line_with_outliers();
        let fit = fit_line_robust(&x, &y, RobustNorm::Tukey).unwrap();
        assert!((fit.slope + 0.4).abs() < 1e-3, "slope={}", fit.slope);
        assert!((fit.intercept - 1.0).abs() < 0.01);
        assert_eq!(fit.weights[20], 0.0);
    }

    #[test]
    fn exact_data_stops_immediately() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let fit = fit_line_robust(&x, &y, RobustNorm::Huber).unwrap();
        assert_eq!(fit.iterations, 0);
        assert!((fit.slope - 2.0).abs() < 1e-10);
    }

    #[test]
    fn weight_functions_have_expected_shape() {
        assert_eq!(RobustNorm::Huber.weight(0.5), 1.0);
        assert!((RobustNorm::Huber.weight(2.69) - 0.5).abs() < 1e-12);
        assert_eq!(RobustNorm::Tukey.weight(0.0), 1.0);
        assert_eq!(RobustNorm::Tukey.weight(5.0), 0.0);
    }
}
