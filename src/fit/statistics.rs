//! Goodness-of-fit statistics shared by every regression branch.

use serde::Serialize;

use crate::math::{mean, sample_std};

/// Statistics block computed from observed vs. predicted values.
///
/// Serialized keys follow the tabular report layout (`R_squared`, `RMSE`, ...).
/// Undefined values are `NaN` in memory and `null` once serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitStatistics {
    #[serde(rename = "R_squared")]
    pub r_squared: f64,
    #[serde(rename = "Adjusted_R_squared")]
    pub adjusted_r_squared: f64,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "MSE")]
    pub mse: f64,
    #[serde(rename = "SS_res")]
    pub ss_res: f64,
    #[serde(rename = "SS_tot")]
    pub ss_tot: f64,
    #[serde(rename = "Residual_Mean")]
    pub residual_mean: f64,
    #[serde(rename = "Residual_Std")]
    pub residual_std: f64,
    pub num_data: usize,
}

impl FitStatistics {
    /// `(label, value)` rows in report order.
    pub fn rows(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("R_squared", self.r_squared),
            ("Adjusted_R_squared", self.adjusted_r_squared),
            ("RMSE", self.rmse),
            ("MAE", self.mae),
            ("MSE", self.mse),
            ("SS_res", self.ss_res),
            ("SS_tot", self.ss_tot),
            ("Residual_Mean", self.residual_mean),
            ("Residual_Std", self.residual_std),
            ("num_data", self.num_data as f64),
        ]
    }
}

/// Evaluate a fit.
///
/// `num_predictors` enables the adjusted R², which is only defined when
/// `n > num_predictors + 1`.
pub fn evaluate_fit(y_obs: &[f64], y_pred: &[f64], num_predictors: Option<usize>) -> FitStatistics {
    let n = y_obs.len().min(y_pred.len());
    let residuals: Vec<f64> = y_obs.iter().zip(y_pred).map(|(o, p)| o - p).collect();

    let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
    let ss_tot = match mean(&y_obs[..n]) {
        Some(m) => y_obs[..n].iter().map(|v| (v - m) * (v - m)).sum(),
        None => f64::NAN,
    };

    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { f64::NAN };
    let mse = if n > 0 { ss_res / n as f64 } else { f64::NAN };
    let mae = if n > 0 {
        residuals.iter().map(|r| r.abs()).sum::<f64>() / n as f64
    } else {
        f64::NAN
    };

    let adjusted_r_squared = match num_predictors {
        Some(p) if n > p + 1 => 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / (n as f64 - p as f64 - 1.0),
        _ => f64::NAN,
    };

    FitStatistics {
        r_squared,
        adjusted_r_squared,
        rmse: mse.sqrt(),
        mae,
        mse,
        ss_res,
        ss_tot,
        residual_mean: mean(&residuals).unwrap_or(f64::NAN),
        residual_std: sample_std(&residuals),
        num_data: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_fit_has_unit_r_squared() {
        let y = [1.0, 2.0, 3.0, 4.0];
        let s = evaluate_fit(&y, &y, Some(1));
        assert_eq!(s.r_squared, 1.0);
        assert_eq!(s.adjusted_r_squared, 1.0);
        assert_eq!(s.rmse, 0.0);
        assert_eq!(s.num_data, 4);
    }

    #[test]
    fn adjusted_r_squared_needs_enough_points() {
        let obs = [1.0, 2.0, 2.5];
        let pred = [1.1, 1.9, 2.6];
        let s = evaluate_fit(&obs, &pred, Some(2));
        assert!(s.adjusted_r_squared.is_nan());
        assert!(s.r_squared > 0.9);
        let s = evaluate_fit(&obs, &pred, None);
        assert!(s.adjusted_r_squared.is_nan());
    }

    #[test]
    fn constant_observations_leave_r_squared_undefined() {
        let s = evaluate_fit(&[2.0, 2.0, 2.0], &[2.0, 2.1, 1.9], Some(1));
        assert!(s.r_squared.is_nan());
        assert!((s.mae - 0.2 / 3.0).abs() < 1e-12);
        assert!(s.residual_mean.abs() < 1e-12);
    }

    #[test]
    fn non_finite_values_serialize_as_null() {
        let s = evaluate_fit(&[2.0, 2.0], &[2.0, 2.0], None);
        let json = serde_json::to_value(&s).unwrap();
        assert!(json["R_squared"].is_null());
        assert_eq!(json["num_data"], 2);
    }
}
