//! Tunable analysis constants.
//!
//! Every empirical constant the solution methods rely on lives here with its
//! published default. A test definition can override any of them from a
//! `[settings]` table; omitted keys keep their defaults.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::fit::{Loss, RobustNorm};
use crate::recovery::StaticLevelMethod;

/// How to treat a screen that extends below the aquifer base
/// (`D - (d + b) < 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryAnomalyPolicy {
    /// Configuration error.
    #[default]
    Reject,
    /// Use the absolute value and record a warning on the result.
    Coerce,
}

/// Line estimator for the Bouwer–Rice log-linear fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEstimator {
    Huber,
    Tukey,
    /// Ordinary least squares.
    None,
}

impl LineEstimator {
    pub fn robust_norm(self) -> Option<RobustNorm> {
        match self {
            LineEstimator::Huber => Some(RobustNorm::Huber),
            LineEstimator::Tukey => Some(RobustNorm::Tukey),
            LineEstimator::None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSettings {
    pub static_level: StaticLevelMethod,
    /// Lower edge of the Bouwer–Rice fit window on `|H/H0|`.
    pub br_window_lower: f64,
    pub br_window_upper: f64,
    /// Samples with `|H/H0|` at or below this are never logged.
    pub br_min_ratio: f64,
    pub br_robust_norm: LineEstimator,
    /// Cap on `ln((D - (d + b)) / r*w)`.
    pub br_ln_cap: f64,
    pub butler_initial_cd: f64,
    pub butler_initial_mod_factor: f64,
    pub butler_max_nfev: Option<usize>,
    /// A loss other than `linear` fits the type curve with the robust
    /// least-squares branch.
    pub butler_loss: Loss,
    /// Transducer cable radius occupying the casing, in the well's length unit.
    pub cable_radius: f64,
    pub geometry_anomaly: GeometryAnomalyPolicy,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            static_level: StaticLevelMethod::default(),
            br_window_lower: 0.1,
            br_window_upper: 0.3,
            br_min_ratio: 1e-6,
            br_robust_norm: LineEstimator::Huber,
            br_ln_cap: 6.0,
            butler_initial_cd: 1.99,
            butler_initial_mod_factor: 1.0,
            butler_max_nfev: None,
            butler_loss: Loss::Linear,
            cable_radius: 0.0,
            geometry_anomaly: GeometryAnomalyPolicy::Reject,
        }
    }
}

impl AnalysisSettings {
    /// Parse a bare settings table.
    pub fn from_toml_str(s: &str) -> Result<Self, AppError> {
        let settings: Self =
            toml::from_str(s).map_err(|e| AppError::config(format!("Invalid settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check ranges and orderings. All problems are reported together.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors: Vec<String> = Vec::new();

        match self.static_level {
            StaticLevelMethod::Percentile { percentile } => {
                if !(0.0..=100.0).contains(&percentile) {
                    errors.push(format!("static_level.percentile ({percentile}) must lie in [0, 100]"));
                }
            }
            StaticLevelMethod::WindowShift { window } => {
                if window == 0 {
                    errors.push("static_level.window must be at least 1".to_string());
                }
            }
        }

        let lo = self.br_window_lower;
        let hi = self.br_window_upper;
        if !(lo > 0.0 && lo <= 1.0) || !(hi > 0.0 && hi <= 1.0) {
            errors.push(format!("br_window_lower/upper ({lo}, {hi}) must lie in (0, 1]"));
        } else if lo >= hi {
            errors.push(format!("br_window_lower ({lo}) must be less than br_window_upper ({hi})"));
        }
        if !(self.br_min_ratio.is_finite() && self.br_min_ratio >= 0.0) {
            errors.push(format!("br_min_ratio ({}) must be non-negative", self.br_min_ratio));
        }
        if !(self.br_ln_cap.is_finite() && self.br_ln_cap > 0.0) {
            errors.push(format!("br_ln_cap ({}) must be positive", self.br_ln_cap));
        }
        for (name, v) in [
            ("butler_initial_cd", self.butler_initial_cd),
            ("butler_initial_mod_factor", self.butler_initial_mod_factor),
        ] {
            if !(v.is_finite() && v > 0.0) {
                errors.push(format!("{name} ({v}) must be positive"));
            }
        }
        if self.butler_max_nfev == Some(0) {
            errors.push("butler_max_nfev must be at least 1".to_string());
        }
        if !(self.cable_radius.is_finite() && self.cable_radius >= 0.0) {
            errors.push(format!("cable_radius ({}) must be non-negative", self.cable_radius));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::config(format!("Invalid settings: {}", errors.join("; "))))
        }
    }
}
