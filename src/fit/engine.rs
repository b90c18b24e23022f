//! Regression engine: one entry point over every fitting mode.
//!
//! [`fit_regression`] never returns an error. Degenerate input and numerical
//! failures come back as a [`FitResult`] with `success == false` and a
//! message, so a batch caller can skip one test and keep going.

use serde::Serialize;
use tracing::debug;

use crate::fit::linear::{OlsFit, fit_line};
use crate::fit::nonlinear::{Bounds, CovarianceScale, LevenbergMarquardt, Loss, NonlinearFit};
use crate::fit::robust::{RobustLinearFit, RobustNorm, fit_line_robust};
use crate::fit::statistics::{FitStatistics, evaluate_fit};
use crate::models::ModelFn;

/// What kind of relationship to fit.
#[derive(Debug, Clone)]
pub enum FitMethod {
    /// `y = intercept + slope * x`.
    Linear,
    /// Caller-supplied model with declared parameters.
    Nonlinear(ModelFn),
}

#[derive(Debug, Clone)]
pub struct RegressionOptions {
    /// M-estimator for lines; for nonlinear models it also selects the
    /// bounded robust branch.
    pub robust: Option<RobustNorm>,
    /// Initial guess; a unit vector of the model's arity when unset.
    pub p0: Option<Vec<f64>>,
    pub bounds: Option<Bounds>,
    pub loss: Loss,
    pub f_scale: f64,
    pub max_nfev: Option<usize>,
    /// Used for the adjusted R²; `None` leaves it `NaN`.
    pub num_predictors: Option<usize>,
}

impl Default for RegressionOptions {
    fn default() -> Self {
        Self {
            robust: None,
            p0: None,
            bounds: None,
            loss: Loss::Linear,
            f_scale: 1.0,
            max_nfev: None,
            num_predictors: None,
        }
    }
}

/// Branch that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    LinearOls,
    RlmHuber,
    RlmTukey,
    NonlinearCurveFit,
    NonlinearLeastSquares,
}

/// Mode-specific payload; each variant carries only what its mode produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitEstimate {
    Ols(OlsFit),
    RobustLinear(RobustLinearFit),
    Nonlinear(NonlinearFit),
}

#[derive(Debug, Clone, Serialize)]
pub struct FitResult {
    pub mode: FitMode,
    pub success: bool,
    pub message: String,
    pub estimate: Option<FitEstimate>,
    /// Predictions at the fitted `x`; empty when there is no estimate.
    pub y_pred: Vec<f64>,
    pub stats: Option<FitStatistics>,
    #[serde(skip)]
    model: Option<ModelFn>,
}

/// Evaluates a fitted relationship at new points without refitting.
#[derive(Debug, Clone)]
pub enum Predictor {
    Line { intercept: f64, slope: f64 },
    Model { model: ModelFn, params: Vec<f64> },
}

impl Predictor {
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Predictor::Line { intercept, slope } => intercept + slope * x,
            Predictor::Model { model, params } => model.eval(x, params),
        }
    }

    pub fn eval_many(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&v| self.eval(v)).collect()
    }
}

impl FitResult {
    fn failure(mode: FitMode, message: impl Into<String>) -> Self {
        Self {
            mode,
            success: false,
            message: message.into(),
            estimate: None,
            y_pred: Vec::new(),
            stats: None,
            model: None,
        }
    }

    /// Fitted parameters. Lines report `[intercept, slope]`.
    pub fn params(&self) -> Option<Vec<f64>> {
        match self.estimate.as_ref()? {
            FitEstimate::Ols(f) => Some(vec![f.intercept, f.slope]),
            FitEstimate::RobustLinear(f) => Some(vec![f.intercept, f.slope]),
            FitEstimate::Nonlinear(f) => Some(f.params.clone()),
        }
    }

    /// Slope of a linear fit.
    pub fn slope(&self) -> Option<f64> {
        match self.estimate.as_ref()? {
            FitEstimate::Ols(f) => Some(f.slope),
            FitEstimate::RobustLinear(f) => Some(f.slope),
            FitEstimate::Nonlinear(_) => None,
        }
    }

    pub fn nonlinear(&self) -> Option<&NonlinearFit> {
        match self.estimate.as_ref()? {
            FitEstimate::Nonlinear(f) => Some(f),
            _ => None,
        }
    }

    /// Parameter covariance when the mode produces one.
    pub fn covariance(&self) -> Option<&[Vec<f64>]> {
        self.nonlinear().map(|f| f.covariance.as_slice())
    }

    pub fn predictor(&self) -> Option<Predictor> {
        match self.estimate.as_ref()? {
            FitEstimate::Ols(f) => Some(Predictor::Line {
                intercept: f.intercept,
                slope: f.slope,
            }),
            FitEstimate::RobustLinear(f) => Some(Predictor::Line {
                intercept: f.intercept,
                slope: f.slope,
            }),
            FitEstimate::Nonlinear(f) => Some(Predictor::Model {
                model: self.model.clone()?,
                params: f.params.clone(),
            }),
        }
    }

    /// Evaluate the fitted relationship at `x_new`.
    pub fn predict(&self, x_new: &[f64]) -> Option<Vec<f64>> {
        self.predictor().map(|p| p.eval_many(x_new))
    }
}

/// Fit `y` against `x`.
pub fn fit_regression(x: &[f64], y: &[f64], method: &FitMethod, options: &RegressionOptions) -> FitResult {
    let mode = select_mode(method, options);

    if x.len() != y.len() {
        return FitResult::failure(
            mode,
            format!("x and y must have the same length ({} vs {}).", x.len(), y.len()),
        );
    }
    if x.len() < 2 {
        return FitResult::failure(mode, format!("At least two points are required (got {}).", x.len()));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return FitResult::failure(mode, "x and y must be finite.");
    }

    let result = match method {
        FitMethod::Linear => fit_linear(x, y, mode, options),
        FitMethod::Nonlinear(model) => fit_nonlinear(x, y, model, mode, options),
    };
    debug!(?mode, n = x.len(), success = result.success, message = %result.message, "regression finished");
    result
}

fn select_mode(method: &FitMethod, options: &RegressionOptions) -> FitMode {
    match (method, options.robust) {
        (FitMethod::Linear, None) => FitMode::LinearOls,
        (FitMethod::Linear, Some(RobustNorm::Huber)) => FitMode::RlmHuber,
        (FitMethod::Linear, Some(RobustNorm::Tukey)) => FitMode::RlmTukey,
        (FitMethod::Nonlinear(_), robust) => {
            if robust.is_some() || options.loss != Loss::Linear {
                FitMode::NonlinearLeastSquares
            } else {
                FitMode::NonlinearCurveFit
            }
        }
    }
}

fn fit_linear(x: &[f64], y: &[f64], mode: FitMode, options: &RegressionOptions) -> FitResult {
    let fitted = match options.robust {
        None => fit_line(x, y).map(|f| (f.intercept, f.slope, "Fit successful.".to_string(), FitEstimate::Ols(f))),
        Some(norm) => fit_line_robust(x, y, norm).map(|f| {
            let message = if f.converged {
                "Fit successful.".to_string()
            } else {
                format!("{} IRLS stopped after {} iterations without converging.", f.norm.label(), f.iterations)
            };
            (f.intercept, f.slope, message, FitEstimate::RobustLinear(f))
        }),
    };
    let (intercept, slope, message, estimate) = match fitted {
        Ok(v) => v,
        Err(msg) => return FitResult::failure(mode, msg),
    };

    let y_pred: Vec<f64> = x.iter().map(|v| intercept + slope * v).collect();
    FitResult {
        mode,
        success: true,
        message,
        stats: Some(evaluate_fit(y, &y_pred, options.num_predictors)),
        estimate: Some(estimate),
        y_pred,
        model: None,
    }
}

fn fit_nonlinear(x: &[f64], y: &[f64], model: &ModelFn, mode: FitMode, options: &RegressionOptions) -> FitResult {
    let p0 = match &options.p0 {
        Some(p0) if p0.len() != model.arity() => {
            return FitResult::failure(
                mode,
                format!(
                    "p0 has {} values but model '{}' takes {} parameters ({}).",
                    p0.len(),
                    model.name(),
                    model.arity(),
                    model.param_names().join(", ")
                ),
            );
        }
        Some(p0) => p0.clone(),
        None => vec![1.0; model.arity()],
    };

    let robust_branch = mode == FitMode::NonlinearLeastSquares;
    let loss = if robust_branch && options.loss == Loss::Linear {
        // A norm without an explicit loss picks the closest smooth loss.
        match options.robust {
            Some(RobustNorm::Tukey) => Loss::Cauchy,
            _ => Loss::Huber,
        }
    } else {
        options.loss
    };

    let solver = LevenbergMarquardt {
        loss,
        f_scale: options.f_scale,
        bounds: options.bounds.as_ref(),
        max_nfev: options.max_nfev,
        covariance: if robust_branch {
            CovarianceScale::Cost
        } else {
            CovarianceScale::ResidualVariance
        },
    };

    let fit = match solver.minimize(x, y, model, &p0) {
        Ok(f) => f,
        Err(msg) => return FitResult::failure(mode, msg),
    };

    if !fit.converged() && !robust_branch {
        return FitResult::failure(
            mode,
            format!("Optimal parameters not found: {}", fit.termination.message()),
        );
    }

    let y_pred = model.eval_many(x, &fit.params);
    let success = fit.converged();
    let message = fit.termination.message().to_string();

    FitResult {
        mode,
        success,
        message,
        stats: Some(evaluate_fit(y, &y_pred, options.num_predictors)),
        estimate: Some(FitEstimate::Nonlinear(fit)),
        y_pred,
        model: Some(model.clone()),
    }
}
