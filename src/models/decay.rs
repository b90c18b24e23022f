//! First-order (Hvorslev-type) recovery: `H/H0 = exp(-t / t0)`.

use crate::models::ModelFn;

pub fn exponential_recovery(t: f64, t0: f64) -> f64 {
    (-t / t0).exp()
}

/// `exp(intercept + slope * t)`, the line fitted to `ln(H/H0)` mapped back.
pub fn log_linear_recovery(t: f64, intercept: f64, slope: f64) -> f64 {
    (intercept + slope * t).exp()
}

pub fn exponential_model() -> ModelFn {
    ModelFn::new("exponential_recovery", &["t0"], |t, p| exponential_recovery(t, p[0]))
}
