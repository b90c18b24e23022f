//! Butler (2003) high-K slug-test analysis.
//!
//! Butler, J. J., Jr., Garnett, E. J., & Healey, J. M. (2003). Analysis of
//! slug tests in formations of high hydraulic conductivity. Ground Water,
//! 41(5), 620–630.
//!
//! The normalized response is fitted with the damped-oscillator type curve
//! in `(Cd, mod_factor)`. With `td = mod_factor * t` and
//! `mod_factor = sqrt(g / Le)`:
//!
//! ```text
//! K = rc,eff² · ln(shape) · mod_factor / (2 b Cd)
//! ```
//!
//! where the shape term is the Hvorslev confined factor or the Bouwer–Rice
//! `Re/rw` for unconfined settings.

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::{
    AnalysisResult, Aquifer, AquiferType, DampingRegime, MethodDetails, MethodKind, SlugWell, WellGeometry,
};
use crate::error::AppError;
use crate::fit::{FitMethod, FitResult, RegressionOptions, fit_regression};
use crate::models::{damped_oscillator, oscillator_model};
use crate::plot::{AxisScale, DiagnosticFigure};
use crate::recovery::{NormalizedRecovery, normalize_recovery};
use crate::settings::AnalysisSettings;
use crate::solution::{ScreenGeometry, SolutionMethod, TestSetup, TestType};

/// Samples on the fitted type curve in the diagnostic figure.
const CURVE_SAMPLES: usize = 400;

#[derive(Debug, Clone)]
pub struct Butler2003 {
    setup: TestSetup,
}

/// Hvorslev confined shape term `ln(V7)`.
///
/// `ar = b / rw`, `psi = sqrt(1 / anis) / ar`.
pub fn ln_confined_shape(screen_length: f64, well_radius: f64, anisotropy: f64) -> f64 {
    let ar = screen_length / well_radius;
    let psi = (1.0 / anisotropy).sqrt() / ar;
    let half_inv = 1.0 / (2.0 * psi);
    (half_inv + (1.0 + half_inv * half_inv).sqrt()).ln()
}

impl Butler2003 {
    pub fn new(
        name: impl Into<String>,
        test_type: TestType,
        aquifer: Aquifer,
        slug_well: SlugWell,
    ) -> Result<Self, AppError> {
        Self::with_settings(name, test_type, aquifer, slug_well, AnalysisSettings::default())
    }

    pub fn with_settings(
        name: impl Into<String>,
        test_type: TestType,
        aquifer: Aquifer,
        slug_well: SlugWell,
        settings: AnalysisSettings,
    ) -> Result<Self, AppError> {
        Ok(Self {
            setup: TestSetup::new(name.into(), test_type, aquifer, slug_well, settings)?,
        })
    }

    /// Casing radius reduced for the transducer cable volume.
    fn effective_casing_radius(&self) -> Result<f64, AppError> {
        let well = &self.setup.work_well;
        let rc = well.casing_radius();
        let r_cable = self.setup.settings.cable_radius;
        if r_cable >= rc {
            return Err(AppError::config(format!(
                "Cable radius ({r_cable:.4} {u}) must be smaller than casing radius ({rc:.4} {u}).",
                u = well.length_unit()
            )));
        }
        Ok((rc * rc - r_cable * r_cable).sqrt())
    }

    fn figure(&self, rec: &NormalizedRecovery, cd: f64, mod_factor: f64) -> DiagnosticFigure {
        let t_end = rec.time.last().copied().unwrap_or(0.0);
        let t_curve: Vec<f64> = (0..CURVE_SAMPLES)
            .map(|i| t_end * i as f64 / (CURVE_SAMPLES - 1) as f64)
            .collect();
        let w_curve: Vec<f64> = t_curve.iter().map(|&t| damped_oscillator(t, cd, mod_factor)).collect();

        DiagnosticFigure::new(
            format!("Butler (2003): {}", self.setup.name),
            "Time (s)",
            "H/H0",
            AxisScale::Linear,
        )
        .scatter("Observed", &rec.time, &rec.ratio)
        .line(format!("Type curve (Cd = {cd:.3})"), &t_curve, &w_curve)
    }

    fn fit(&self, rec: &NormalizedRecovery) -> Result<(FitResult, f64, f64), AppError> {
        let s = &self.setup.settings;
        let options = RegressionOptions {
            p0: Some(vec![s.butler_initial_cd, s.butler_initial_mod_factor]),
            loss: s.butler_loss,
            max_nfev: s.butler_max_nfev,
            num_predictors: Some(2),
            ..RegressionOptions::default()
        };
        let fit = fit_regression(&rec.time, &rec.ratio, &FitMethod::Nonlinear(oscillator_model()), &options);
        if !fit.success {
            return Err(AppError::convergence(format!("Butler (2003) type-curve fit failed: {}", fit.message)));
        }
        let params = fit.params().unwrap_or_default();
        let &[cd, mod_factor] = params.as_slice() else {
            return Err(AppError::convergence("Butler (2003) type-curve fit returned no parameters."));
        };
        if !(cd > 0.0 && mod_factor > 0.0) {
            return Err(AppError::convergence(format!(
                "Butler (2003) fit converged to non-physical parameters (Cd = {cd:.4}, mod_factor = {mod_factor:.4})."
            )));
        }
        Ok((fit, cd, mod_factor))
    }
}

impl SolutionMethod for Butler2003 {
    fn kind(&self) -> MethodKind {
        MethodKind::Butler2003
    }

    fn name(&self) -> &str {
        &self.setup.name
    }

    fn test_type(&self) -> TestType {
        self.setup.test_type
    }

    fn aquifer(&self) -> &Aquifer {
        &self.setup.aquifer
    }

    fn slug_well(&self) -> &SlugWell {
        &self.setup.slug_well
    }

    fn settings(&self) -> &AnalysisSettings {
        &self.setup.settings
    }

    fn analyze(&self) -> Result<AnalysisResult, AppError> {
        let setup = &self.setup;
        let settings = &setup.settings;
        let aquifer = &setup.work_aquifer;
        let well = &setup.work_well;
        let aquifer_type = aquifer.aquifer_type();
        let mut warnings = Vec::new();

        let anis = aquifer.anisotropy();
        if !(anis > 0.0) {
            return Err(AppError::config(
                "Anisotropy ratio must be positive for slug-test analysis (got 0).",
            ));
        }
        let rc_eff = self.effective_casing_radius()?;

        let rec = normalize_recovery(well.time(), well.head(), settings.static_level)?;
        let (fit, cd, mod_factor) = self.fit(&rec)?;
        let Some(stats) = fit.stats.clone() else {
            return Err(AppError::convergence("Butler (2003) fit produced no statistics."));
        };

        // Screen geometry only matters for the unconfined shape term.
        let geometry = match aquifer_type {
            AquiferType::Unconfined => {
                Some(ScreenGeometry::resolve(aquifer, well, settings.geometry_anomaly, &mut warnings)?)
            }
            AquiferType::Confined | AquiferType::SemiConfined => {
                let mut scratch = Vec::new();
                match ScreenGeometry::resolve(aquifer, well, settings.geometry_anomaly, &mut scratch) {
                    Ok(g) => Some(g),
                    Err(e) => {
                        warn!(error = %e, "unconfined shape term unavailable");
                        None
                    }
                }
            }
        };
        let b = well.screen_length();
        let ln_re_rw = match (aquifer_type, geometry) {
            (AquiferType::Unconfined, Some(g)) => g.ln_re_rw(settings.br_ln_cap)?,
            (_, Some(g)) => g.ln_re_rw(settings.br_ln_cap).unwrap_or(f64::NAN),
            (_, None) => f64::NAN,
        };

        let g_accel = well.length_unit().gravity();
        let effective_column_length = g_accel / (mod_factor * mod_factor);
        let ln_v7 = ln_confined_shape(b, well.well_radius(), anis);
        let scale = rc_eff * rc_eff * mod_factor / (2.0 * b * cd);
        let k_confined = scale * ln_v7;
        let k_unconfined = scale * ln_re_rw;

        let k = match aquifer_type {
            AquiferType::Unconfined => k_unconfined,
            AquiferType::Confined | AquiferType::SemiConfined => k_confined,
        };
        let estimated = setup.report_units(k);
        info!(
            test = %setup.name,
            cd,
            mod_factor,
            regime = ?DampingRegime::from_cd(cd),
            k = estimated.hydraulic_conductivity,
            units = %estimated.conductivity_units(),
            "Butler analysis complete"
        );

        let figure = self.figure(&rec, cd, mod_factor);
        Ok(AnalysisResult {
            test_name: setup.name.clone(),
            well_name: setup.slug_well.name().to_string(),
            method: MethodKind::Butler2003,
            aquifer_type: setup.aquifer.aquifer_type(),
            analyzed_at: Utc::now(),
            estimated_parameters: estimated,
            fitting_statistics: stats,
            static_level: rec.static_level,
            initial_displacement: rec.h0,
            details: MethodDetails::Butler {
                cd,
                mod_factor,
                regime: DampingRegime::from_cd(cd),
                fit_mode: fit.mode,
                effective_casing_radius: rc_eff,
                effective_column_length,
                ln_v7,
                ln_re_rw,
                k_confined,
                k_unconfined,
            },
            fit,
            warnings,
            figure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AquiferSpec, WellSpec};
    use crate::error::ErrorKind;
    use crate::fit::{FitMode, Loss};

    fn oscillating_well(cd: f64, mod_factor: f64) -> SlugWell {
        let time: Vec<f64> = (0..300).map(|i| i as f64 * 0.05).collect();
        let head = time.iter().map(|&t| 0.8 * damped_oscillator(t, cd, mod_factor)).collect();
        SlugWell::new(WellSpec::new(0.025, 0.05, 1.0, 20.0), head, time, None, true).unwrap()
    }

    fn aquifer(kind: &str) -> Aquifer {
        Aquifer::new(AquiferSpec::new(kind, 100.0, 30.0, 5.0)).unwrap()
    }

    #[test]
    fn recovers_damping_and_frequency() {
        let butler = Butler2003::new("B-1", TestType::Slug, aquifer("confined"), oscillating_well(1.0, 1.5)).unwrap();
        let res = butler.analyze().unwrap();
        let MethodDetails::Butler { cd, mod_factor, regime, k_confined, .. } = res.details else {
            panic!("wrong details variant");
        };
        assert!((cd - 1.0).abs() < 0.05, "cd = {cd}");
        assert!((mod_factor - 1.5).abs() < 0.05, "mod_factor = {mod_factor}");
        assert_eq!(regime, DampingRegime::Underdamped);
        assert_eq!(res.estimated_parameters.hydraulic_conductivity, k_confined);
        assert!(res.fitting_statistics.r_squared > 0.95);
    }

    #[test]
    fn aquifer_type_selects_the_reported_conductivity() {
        let res = Butler2003::new("U", TestType::Slug, aquifer("unconfined"), oscillating_well(1.0, 1.5))
            .unwrap()
            .analyze()
            .unwrap();
        let MethodDetails::Butler { k_unconfined, k_confined, .. } = res.details else {
            panic!("wrong details variant");
        };
        assert_eq!(res.estimated_parameters.hydraulic_conductivity, k_unconfined);
        assert_ne!(k_unconfined, k_confined);
    }

    #[test]
    fn cable_as_wide_as_casing_is_rejected() {
        let settings = AnalysisSettings {
            cable_radius: 0.025,
            ..AnalysisSettings::default()
        };
        let butler = Butler2003::with_settings("C", TestType::Slug, aquifer("confined"), oscillating_well(1.0, 1.5), settings)
            .unwrap();
        assert_eq!(butler.analyze().unwrap_err().kind(), ErrorKind::Configuration);
    }

    #[test]
    fn exhausted_fit_is_a_convergence_error() {
        let settings = AnalysisSettings {
            butler_max_nfev: Some(1),
            ..AnalysisSettings::default()
        };
        let butler = Butler2003::with_settings("N", TestType::Slug, aquifer("confined"), oscillating_well(1.0, 1.5), settings)
            .unwrap();
        assert_eq!(butler.analyze().unwrap_err().kind(), ErrorKind::Convergence);
    }

    #[test]
    fn overdamped_record_is_recovered() {
        let res = Butler2003::new("O", TestType::Slug, aquifer("confined"), oscillating_well(3.0, 1.5))
            .unwrap()
            .analyze()
            .unwrap();
        let MethodDetails::Butler { cd, mod_factor, regime, fit_mode, .. } = res.details else {
            panic!("wrong details variant");
        };
        assert!((cd - 3.0).abs() < 0.05, "cd = {cd}");
        assert!((mod_factor - 1.5).abs() < 0.05, "mod_factor = {mod_factor}");
        assert_eq!(regime, DampingRegime::Overdamped);
        assert_eq!(fit_mode, FitMode::NonlinearCurveFit);
        assert!(res.fitting_statistics.r_squared > 0.99);
    }

    #[test]
    fn critically_damped_record_is_recovered() {
        let res = Butler2003::new("C2", TestType::Slug, aquifer("confined"), oscillating_well(2.0, 1.5))
            .unwrap()
            .analyze()
            .unwrap();
        let MethodDetails::Butler { cd, mod_factor, .. } = res.details else {
            panic!("wrong details variant");
        };
        assert!((cd - 2.0).abs() < 0.05, "cd = {cd}");
        assert!((mod_factor - 1.5).abs() < 0.05, "mod_factor = {mod_factor}");
        assert!(res.estimated_parameters.hydraulic_conductivity > 0.0);
    }

    #[test]
    fn soft_l1_loss_uses_the_robust_branch() {
        let settings = AnalysisSettings {
            butler_loss: Loss::SoftL1,
            ..AnalysisSettings::default()
        };
        let res = Butler2003::with_settings("L", TestType::Slug, aquifer("confined"), oscillating_well(1.0, 1.5), settings)
            .unwrap()
            .analyze()
            .unwrap();
        let MethodDetails::Butler { cd, mod_factor, fit_mode, .. } = res.details else {
            panic!("wrong details variant");
        };
        assert_eq!(fit_mode, FitMode::NonlinearLeastSquares);
        assert!((cd - 1.0).abs() < 0.05, "cd = {cd}");
        assert!((mod_factor - 1.5).abs() < 0.05, "mod_factor = {mod_factor}");
    }

    #[test]
    fn confined_branch_uses_full_screen_length() {
        // Screen top 0.5 above a 5.0 water table.
        let time: Vec<f64> = (0..300).map(|i| i as f64 * 0.05).collect();
        let head = time.iter().map(|&t| 0.8 * damped_oscillator(t, 1.0, 1.5)).collect();
        let well = SlugWell::new(WellSpec::new(0.025, 0.05, 1.0, 4.5), head, time, None, true).unwrap();
        let res = Butler2003::new("S", TestType::Slug, aquifer("confined"), well)
            .unwrap()
            .analyze()
            .unwrap();
        let MethodDetails::Butler { ln_v7, cd, mod_factor, k_confined, .. } = res.details else {
            panic!("wrong details variant");
        };
        let expected = ln_confined_shape(1.0, 0.05, 1.0);
        assert!((ln_v7 - expected).abs() < 1e-12, "ln_v7 = {ln_v7}");
        assert!((ln_v7 - 2.9982).abs() < 1e-3);
        let k = 0.025f64.powi(2) * expected * mod_factor / (2.0 * 1.0 * cd);
        assert!((k_confined - k).abs() <= 1e-12 * k);
    }

    #[test]
    fn confined_shape_term_grows_with_aspect_ratio() {
        assert!(ln_confined_shape(2.0, 0.05, 1.0) > ln_confined_shape(0.5, 0.05, 1.0));
        // ar = 2, psi = 0.5: 1 + sqrt(2)
        assert!((ln_confined_shape(2.0, 1.0, 1.0) - (1.0 + 2f64.sqrt()).ln()).abs() < 1e-12);
    }
}
