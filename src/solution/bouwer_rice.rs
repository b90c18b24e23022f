//! Bouwer & Rice (1976) slug-test analysis.
//!
//! Bouwer, H., & Rice, R. C. (1976). A slug test for determining hydraulic
//! conductivity of unconfined aquifers with completely or partially
//! penetrating wells. Water Resources Research, 12(3), 423–428.
//!
//! The straight-line portion of `ln(H/H0)` against time gives the basic time
//! lag `T0`, and
//!
//! ```text
//! K = rc² ln(Re/rw) / (2 b T0)
//! ```

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::{
    AnalysisResult, Aquifer, MethodDetails, MethodKind, SlugWell, WellGeometry,
};
use crate::error::AppError;
use crate::fit::{FitMethod, FitResult, RegressionOptions, fit_regression};
use crate::models::log_linear_recovery;
use crate::plot::{AxisScale, DiagnosticFigure};
use crate::recovery::{NormalizedRecovery, normalize_recovery};
use crate::settings::AnalysisSettings;
use crate::solution::{ScreenGeometry, SolutionMethod, TestSetup, TestType};

#[derive(Debug, Clone)]
pub struct BouwerRice1976 {
    setup: TestSetup,
}

/// Samples used for the log-linear fit.
struct FitWindow {
    time: Vec<f64>,
    ln_ratio: Vec<f64>,
}

impl BouwerRice1976 {
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

    fn select_window(&self, rec: &NormalizedRecovery) -> Result<FitWindow, AppError> {
        let s = &self.setup.settings;
        let mut time = Vec::new();
        let mut ln_ratio = Vec::new();
        for (&t, &r) in rec.time.iter().zip(&rec.ratio) {
            let a = r.abs();
            if a >= s.br_window_lower && a <= s.br_window_upper && a > s.br_min_ratio {
                time.push(t);
                ln_ratio.push(a.ln());
            }
        }
        if time.len() < 2 {
            return Err(AppError::data(format!(
                "Only {} samples fall inside the fit window {} <= |H/H0| <= {}.",
                time.len(),
                s.br_window_lower,
                s.br_window_upper
            )));
        }
        Ok(FitWindow { time, ln_ratio })
    }

    fn figure(&self, rec: &NormalizedRecovery, window: &FitWindow, fit: &FitResult) -> DiagnosticFigure {
        let (intercept, slope) = match fit.params().as_deref() {
            Some([i, s]) => (*i, *s),
            _ => (f64::NAN, f64::NAN),
        };
        let fitted: Vec<f64> = rec.time.iter().map(|&t| log_linear_recovery(t, intercept, slope)).collect();
        let window_ratio: Vec<f64> = window.ln_ratio.iter().map(|v| v.exp()).collect();
        let abs_ratio: Vec<f64> = rec.ratio.iter().map(|r| r.abs()).collect();

        DiagnosticFigure::new(
            format!("Bouwer-Rice (1976): {}", self.setup.name),
            "Time (s)",
            "|H/H0|",
            AxisScale::Log,
        )
        .scatter("Observed", &rec.time, &abs_ratio)
        .scatter("Fit window", &window.time, &window_ratio)
        .line("Fitted line", &rec.time, &fitted)
    }
}

impl SolutionMethod for BouwerRice1976 {
    fn kind(&self) -> MethodKind {
        MethodKind::BouwerRice1976
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
        let well = &setup.work_well;
        let mut warnings = Vec::new();

        let geometry =
            ScreenGeometry::resolve(&setup.work_aquifer, well, settings.geometry_anomaly, &mut warnings)?;
        let rec = normalize_recovery(well.time(), well.head(), settings.static_level)?;
        debug!(static_level = rec.static_level, h0 = rec.h0, "recovery normalized");

        let window = self.select_window(&rec)?;
        debug!(points = window.time.len(), "fit window selected");

        let options = RegressionOptions {
            robust: settings.br_robust_norm.robust_norm(),
            num_predictors: Some(1),
            ..RegressionOptions::default()
        };
        let fit = fit_regression(&window.time, &window.ln_ratio, &FitMethod::Linear, &options);
        if !fit.success {
            return Err(AppError::convergence(format!("Bouwer-Rice line fit failed: {}", fit.message)));
        }
        let (Some(params), Some(stats)) = (fit.params(), fit.stats.clone()) else {
            return Err(AppError::convergence("Bouwer-Rice line fit returned no estimate."));
        };
        let &[intercept, slope] = params.as_slice() else {
            return Err(AppError::convergence("Bouwer-Rice line fit returned no estimate."));
        };
        if !(slope < 0.0) {
            return Err(AppError::data(format!(
                "Head is not recovering inside the fit window (slope {slope:.3e} >= 0)."
            )));
        }

        let t0 = -1.0 / slope;
        let ln_re_rw = geometry.ln_re_rw(settings.br_ln_cap)?;
        let rc = well.casing_radius();
        let k = rc * rc * ln_re_rw / (2.0 * geometry.b * t0);
        let estimated = setup.report_units(k);
        info!(
            test = %setup.name,
            t0,
            ln_re_rw,
            k = estimated.hydraulic_conductivity,
            units = %estimated.conductivity_units(),
            "Bouwer-Rice analysis complete"
        );

        let figure = self.figure(&rec, &window, &fit);
        Ok(AnalysisResult {
            test_name: setup.name.clone(),
            well_name: setup.slug_well.name().to_string(),
            method: MethodKind::BouwerRice1976,
            aquifer_type: setup.aquifer.aquifer_type(),
            analyzed_at: Utc::now(),
            estimated_parameters: estimated,
            fitting_statistics: stats,
            static_level: rec.static_level,
            initial_displacement: rec.h0,
            details: MethodDetails::BouwerRice {
                t0,
                slope,
                intercept,
                ln_re_rw,
                effective_well_radius: geometry.effective_well_radius,
                d: geometry.d,
                b: geometry.b,
                full_penetration: geometry.full_penetration,
                window: [settings.br_window_lower, settings.br_window_upper],
                window_points: window.time.len(),
            },
            fit,
            warnings,
            figure,
        })
    }
}
