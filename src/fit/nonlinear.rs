//! Nonlinear least squares (damped Gauss–Newton / Levenberg–Marquardt).
//!
//! Minimizes
//!
//! ```text
//! cost(p) = 0.5 * f_scale^2 * Σ rho((r_i(p) / f_scale)^2),   r_i = y_i - f(x_i; p)
//! ```
//!
//! Robust losses are handled by reweighting each Gauss–Newton step with
//! `rho'(z_i)`. Box bounds are enforced by projecting every trial point.
//! The Jacobian is built by forward differences.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::math::invert_symmetric;
use crate::models::ModelFn;

/// Loss applied to squared, scaled residuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    #[default]
    Linear,
    SoftL1,
    Huber,
    Cauchy,
    Arctan,
}

impl Loss {
    /// `(rho(z), rho'(z))` for `z = (r / f_scale)^2`.
    pub fn rho(self, z: f64) -> (f64, f64) {
        match self {
            Loss::Linear => (z, 1.0),
            Loss::SoftL1 => {
                let t = (1.0 + z).sqrt();
                (2.0 * (t - 1.0), 1.0 / t)
            }
            Loss::Huber => {
                if z <= 1.0 {
                    (z, 1.0)
                } else {
                    let s = z.sqrt();
                    (2.0 * s - 1.0, 1.0 / s)
                }
            }
            Loss::Cauchy => ((1.0 + z).ln(), 1.0 / (1.0 + z)),
            Loss::Arctan => (z.atan(), 1.0 / (1.0 + z * z)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Loss::Linear => "linear",
            Loss::SoftL1 => "soft_l1",
            Loss::Huber => "huber",
            Loss::Cauchy => "cauchy",
            Loss::Arctan => "arctan",
        }
    }
}

/// Box constraints `lower[j] <= p[j] <= upper[j]`. Infinite ends are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self { lower, upper }
    }

    fn check(&self, m: usize) -> Result<(), String> {
        if self.lower.len() != m || self.upper.len() != m {
            return Err(format!(
                "Bounds must have one entry per parameter ({m}); got {} lower and {} upper.",
                self.lower.len(),
                self.upper.len()
            ));
        }
        for (j, (lo, hi)) in self.lower.iter().zip(&self.upper).enumerate() {
            if lo.is_nan() || hi.is_nan() || lo >= hi {
                return Err(format!("Each lower bound must be strictly less than its upper bound (parameter {j})."));
            }
        }
        Ok(())
    }

    fn contains(&self, p: &[f64]) -> bool {
        p.iter()
            .enumerate()
            .all(|(j, v)| *v >= self.lower[j] && *v <= self.upper[j])
    }

    fn project(&self, p: &mut [f64]) {
        for (j, v) in p.iter_mut().enumerate() {
            *v = v.clamp(self.lower[j], self.upper[j]);
        }
    }
}

/// Why the iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Gtol,
    Ftol,
    Xtol,
    MaxNfev,
}

impl Termination {
    pub fn converged(self) -> bool {
        !matches!(self, Termination::MaxNfev)
    }

    pub fn message(self) -> &'static str {
        match self {
            Termination::Gtol => "`gtol` termination condition is satisfied.",
            Termination::Ftol => "`ftol` termination condition is satisfied.",
            Termination::Xtol => "`xtol` termination condition is satisfied.",
            Termination::MaxNfev => "The maximum number of function evaluations is exceeded.",
        }
    }
}

/// How the parameter covariance is scaled from `(JᵀJ)⁻¹`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CovarianceScale {
    /// `2 * cost / (n - m)`, for robust-loss fits.
    Cost,
    /// `SSR / (n - m)` on the raw residuals.
    ResidualVariance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NonlinearFit {
    pub params: Vec<f64>,
    pub param_names: Vec<String>,
    /// Row-major `m x m`; all `NaN` when the Jacobian is singular.
    pub covariance: Vec<Vec<f64>>,
    pub param_stderr: Vec<f64>,
    pub loss: Loss,
    pub f_scale: f64,
    pub cost: f64,
    pub nfev: usize,
    pub njev: usize,
    pub termination: Termination,
}

impl NonlinearFit {
    pub fn converged(&self) -> bool {
        self.termination.converged()
    }

    pub fn covariance_is_finite(&self) -> bool {
        self.covariance.iter().flatten().all(|v| v.is_finite())
    }
}

const FTOL: f64 = 1e-8;
const XTOL: f64 = 1e-8;
const GTOL: f64 = 1e-8;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e16;

/// Solver configuration for one fit.
#[derive(Debug, Clone)]
pub struct LevenbergMarquardt<'a> {
    pub loss: Loss,
    pub f_scale: f64,
    pub bounds: Option<&'a Bounds>,
    /// Residual evaluations allowed; `200 * (m + 1)` when unset.
    pub max_nfev: Option<usize>,
    pub covariance: CovarianceScale,
}

impl Default for LevenbergMarquardt<'_> {
    fn default() -> Self {
        Self {
            loss: Loss::Linear,
            f_scale: 1.0,
            bounds: None,
            max_nfev: None,
            covariance: CovarianceScale::ResidualVariance,
        }
    }
}

struct Evaluated {
    residuals: Vec<f64>,
    weights: Vec<f64>,
    cost: f64,
}

impl LevenbergMarquardt<'_> {
    /// Fit `model` to `(x, y)` starting from `p0`.
    ///
    /// `Err` means the problem could not be set up (bad bounds, infeasible
    /// start, non-finite residuals at the start). Running out of evaluations
    /// is reported through [`NonlinearFit::termination`].
    pub fn minimize(&self, x: &[f64], y: &[f64], model: &ModelFn, p0: &[f64]) -> Result<NonlinearFit, String> {
        let n = x.len();
        let m = p0.len();
        if m == 0 {
            return Err("The model has no free parameters.".to_string());
        }
        if !(self.f_scale.is_finite() && self.f_scale > 0.0) {
            return Err(format!("f_scale must be positive (got {}).", self.f_scale));
        }
        if let Some(b) = self.bounds {
            b.check(m)?;
            if !b.contains(p0) {
                return Err("Initial guess p0 is infeasible (outside bounds).".to_string());
            }
        }
        if p0.iter().any(|v| !v.is_finite()) {
            return Err("Initial guess p0 must be finite.".to_string());
        }

        let max_nfev = self.max_nfev.unwrap_or(200 * (m + 1)).max(1);
        let mut p = p0.to_vec();
        let mut nfev = 1;
        let mut njev = 0;
        let mut current = self
            .evaluate(x, y, model, &p)
            .ok_or_else(|| "Residuals are not finite at the initial guess.".to_string())?;
        let mut lambda = LAMBDA_INIT;

        let termination = 'outer: loop {
            let jac = self.jacobian(x, model, &p);
            njev += 1;
            let (jtwj, jtwr) = normal_equations(&jac, &current.weights, &current.residuals);

            if jtwr.amax() < GTOL {
                break Termination::Gtol;
            }

            loop {
                if nfev >= max_nfev {
                    break 'outer Termination::MaxNfev;
                }

                let mut damped = jtwj.clone();
                for k in 0..m {
                    damped[(k, k)] += lambda * jtwj[(k, k)].max(1e-12);
                }
                let Some(delta) = damped.lu().solve(&jtwr) else {
                    lambda *= 10.0;
                    if lambda > LAMBDA_MAX {
                        break 'outer Termination::Xtol;
                    }
                    continue;
                };

                let mut trial: Vec<f64> = p.iter().zip(delta.iter()).map(|(a, d)| a + d).collect();
                if let Some(b) = self.bounds {
                    b.project(&mut trial);
                }
                let step_norm = norm(trial.iter().zip(&p).map(|(a, b)| a - b));
                let p_norm = norm(p.iter().copied());

                nfev += 1;
                match self.evaluate(x, y, model, &trial) {
                    Some(next) if next.cost < current.cost => {
                        let decrease = current.cost - next.cost;
                        let previous = current.cost;
                        p = trial;
                        current = next;
                        lambda = (lambda / 10.0).max(1e-12);

                        if decrease <= FTOL * previous {
                            break 'outer Termination::Ftol;
                        }
                        if step_norm <= XTOL * (XTOL + p_norm) {
                            break 'outer Termination::Xtol;
                        }
                        break;
                    }
                    _ => {
                        lambda *= 10.0;
                        if step_norm <= XTOL * (XTOL + p_norm) || lambda > LAMBDA_MAX {
                            break 'outer Termination::Xtol;
                        }
                    }
                }
            }
        };

        let jac = self.jacobian(x, model, &p);
        njev += 1;
        let covariance = self.covariance_matrix(&jac, &current, n, m);
        let param_stderr = (0..m).map(|j| covariance[j][j].sqrt()).collect();

        Ok(NonlinearFit {
            params: p,
            param_names: model.param_names().iter().map(|s| s.to_string()).collect(),
            covariance,
            param_stderr,
            loss: self.loss,
            f_scale: self.f_scale,
            cost: current.cost,
            nfev,
            njev,
            termination,
        })
    }

    fn evaluate(&self, x: &[f64], y: &[f64], model: &ModelFn, p: &[f64]) -> Option<Evaluated> {
        let residuals: Vec<f64> = x.iter().zip(y).map(|(&xi, &yi)| yi - model.eval(xi, p)).collect();
        if residuals.iter().any(|r| !r.is_finite()) {
            return None;
        }

        let fs2 = self.f_scale * self.f_scale;
        let mut weights = Vec::with_capacity(residuals.len());
        let mut total = 0.0;
        for r in &residuals {
            let (rho, rho1) = self.loss.rho(r * r / fs2);
            total += rho;
            weights.push(rho1);
        }
        Some(Evaluated {
            residuals,
            weights,
            cost: 0.5 * fs2 * total,
        })
    }

    /// Forward-difference Jacobian of the model (`∂f/∂p`), `n x m`.
    fn jacobian(&self, x: &[f64], model: &ModelFn, p: &[f64]) -> DMatrix<f64> {
        let eps = f64::EPSILON.sqrt();
        let base = model.eval_many(x, p);
        let mut jac = DMatrix::zeros(x.len(), p.len());
        let mut shifted = p.to_vec();

        for j in 0..p.len() {
            let mut h = eps * p[j].abs().max(1.0);
            if let Some(b) = self.bounds {
                if p[j] + h > b.upper[j] {
                    h = -h;
                }
            }
            shifted[j] = p[j] + h;
            for (i, &xi) in x.iter().enumerate() {
                let d = (model.eval(xi, &shifted) - base[i]) / h;
                jac[(i, j)] = if d.is_finite() { d } else { 0.0 };
            }
            shifted[j] = p[j];
        }
        jac
    }

    fn covariance_matrix(&self, jac: &DMatrix<f64>, at: &Evaluated, n: usize, m: usize) -> Vec<Vec<f64>> {
        let nan = vec![vec![f64::NAN; m]; m];
        if n <= m {
            return nan;
        }
        let dof = (n - m) as f64;
        let s2 = match self.covariance {
            CovarianceScale::Cost => 2.0 * at.cost / dof,
            CovarianceScale::ResidualVariance => at.residuals.iter().map(|r| r * r).sum::<f64>() / dof,
        };

        let weights = match self.covariance {
            CovarianceScale::Cost => at.weights.clone(),
            CovarianceScale::ResidualVariance => vec![1.0; n],
        };
        let (jtwj, _) = normal_equations(jac, &weights, &at.residuals);
        match invert_symmetric(&jtwj) {
            Some(inv) => (0..m).map(|r| (0..m).map(|c| inv[(r, c)] * s2).collect()).collect(),
            None => nan,
        }
    }
}

/// `(JᵀWJ, JᵀWr)`.
fn normal_equations(jac: &DMatrix<f64>, w: &[f64], r: &[f64]) -> (DMatrix<f64>, DVector<f64>) {
    let m = jac.ncols();
    let mut a = DMatrix::zeros(m, m);
    let mut g = DVector::zeros(m);
    for i in 0..jac.nrows() {
        let wi = w[i];
        for j in 0..m {
            let jij = jac[(i, j)];
            g[j] += wi * jij * r[i];
            for k in 0..m {
                a[(j, k)] += wi * jij * jac[(i, k)];
            }
        }
    }
    (a, g)
}

fn norm(values: impl Iterator<Item = f64>) -> f64 {
    values.map(|v| v * v).sum::<f64>().sqrt()
}
