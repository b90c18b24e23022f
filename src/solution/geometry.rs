//! Screen geometry and the Bouwer–Rice effective-radius term.
//!
//! Both solution methods need `ln(Re/rw)` for an unconfined setting, so the
//! offsets, the anomaly policy and the empirical polynomials live here.

use serde::Serialize;
use tracing::warn;

use crate::domain::{Aquifer, WellGeometry};
use crate::error::AppError;
use crate::settings::GeometryAnomalyPolicy;

/// Polynomial coefficients in `log10(b / r*w)`, constant term first.
const BETA_A: [f64; 5] = [1.353, 2.157, -4.027, 2.777, -0.460];
const BETA_B: [f64; 5] = [-0.401, 2.619, -3.267, 1.548, -0.210];
const BETA_C: [f64; 5] = [-1.605, 9.496, -12.317, 6.528, -0.986];

/// `|D - (d + b)|` below this fraction of `D` counts as full penetration.
const FULL_PENETRATION_TOL: f64 = 1e-6;

/// Offsets of the screen relative to the water table and aquifer base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenGeometry {
    /// Water table to screen top, clamped to `>= 0`.
    pub d: f64,
    /// Screen length.
    pub b: f64,
    /// Saturated thickness `D`.
    pub saturated_thickness: f64,
    /// `D - (d + b)`, after the anomaly policy.
    pub below_screen: f64,
    /// `rw * sqrt(anisotropy)`.
    pub effective_well_radius: f64,
    pub full_penetration: bool,
}

impl ScreenGeometry {
    /// Resolve the offsets for `well` in `aquifer`. Both must share a length
    /// unit. Tolerated anomalies are appended to `warnings`.
    pub fn resolve(
        aquifer: &Aquifer,
        well: &impl WellGeometry,
        policy: GeometryAnomalyPolicy,
        warnings: &mut Vec<String>,
    ) -> Result<Self, AppError> {
        let anis = aquifer.anisotropy();
        if !(anis > 0.0) {
            return Err(AppError::config(
                "Anisotropy ratio must be positive for slug-test analysis (got 0).",
            ));
        }

        let big_d = aquifer.saturated_thickness();
        let d_raw = well.screen_top_depth() - aquifer.water_table_depth();
        let b = well.screen_length();
        let d = d_raw.max(0.0);
        if d_raw < 0.0 {
            let msg = format!(
                "Screen top is {:.3} {} above the water table; d clamped to 0.",
                -d_raw,
                well.length_unit()
            );
            warn!("{msg}");
            warnings.push(msg);
        }

        let mut below = big_d - (d + b);
        let full_penetration = below.abs() <= FULL_PENETRATION_TOL * big_d;
        if below < 0.0 && !full_penetration {
            match policy {
                GeometryAnomalyPolicy::Reject => {
                    return Err(AppError::config(format!(
                        "Screen bottom of well '{}' is {:.3} {} below the aquifer base (D - (d + b) < 0).",
                        well.name(),
                        -below,
                        well.length_unit()
                    )));
                }
                GeometryAnomalyPolicy::Coerce => {
                    let msg = format!(
                        "D - (d + b) = {below:.3} is negative; using its absolute value."
                    );
                    warn!("{msg}");
                    warnings.push(msg);
                    below = below.abs();
                }
            }
        }

        Ok(Self {
            d,
            b,
            saturated_thickness: big_d,
            below_screen: below,
            effective_well_radius: well.well_radius() * anis.sqrt(),
            full_penetration,
        })
    }

    /// Dimensionless `ln(Re/rw)` from the Bouwer–Rice polynomials, with the
    /// below-screen logarithm capped at `ln_cap`.
    pub fn ln_re_rw(&self, ln_cap: f64) -> Result<f64, AppError> {
        let rws = self.effective_well_radius;
        let ratio = self.b / rws;
        let x = ratio.log10();
        let a = polynomial(&BETA_A, x);

        let part1 = 1.1 / ((self.d + self.b) / rws).ln();
        let part2 = if self.full_penetration {
            polynomial(&BETA_C, x) / ratio
        } else {
            let b_coef = polynomial(&BETA_B, x);
            let term = (self.below_screen / rws).ln().min(ln_cap);
            (a + b_coef * term) / ratio
        };

        let value = 1.0 / (part1 + part2);
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(AppError::config(format!(
                "Well geometry gives a non-physical ln(Re/rw) = {value} (d = {:.3}, b = {:.3}, r*w = {rws:.4}).",
                self.d, self.b
            )))
        }
    }
}

fn polynomial(coef: &[f64; 5], x: f64) -> f64 {
    coef.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AquiferSpec, Well, WellSpec};

    fn aquifer(thickness: f64, anis: f64) -> Aquifer {
        let mut spec = AquiferSpec::new("unconfined", 100.0, thickness, 10.0);
        spec.anisotropy = anis;
        Aquifer::new(spec).unwrap()
    }

    fn well(screen_len: f64, top: f64) -> Well {
        Well::new(WellSpec::new(0.064, 0.125, screen_len, top)).unwrap()
    }

    #[test]
    fn reference_geometry() {
        let mut warnings = Vec::new();
        let g = ScreenGeometry::resolve(&aquifer(50.6, 1.0), &well(1.52, 28.54), GeometryAnomalyPolicy::Reject, &mut warnings)
            .unwrap();
        assert!((g.d - 18.54).abs() < 1e-12);
        assert!((g.below_screen - 30.54).abs() < 1e-9);
        assert!(!g.full_penetration);
        assert!(warnings.is_empty());

        let ln = g.ln_re_rw(6.0).unwrap();
        assert!((ln - 2.01).abs() < 0.02, "ln(Re/rw) = {ln}");
    }

    #[test]
    fn polynomial_evaluates_in_ascending_powers() {
        assert_eq!(polynomial(&[1.0, 2.0, 3.0, 0.0, 0.0], 2.0), 17.0);
    }

    #[test]
    fn screen_below_base_is_rejected_or_coerced() {
        let mut warnings = Vec::new();
        let err = ScreenGeometry::resolve(&aquifer(10.0, 1.0), &well(3.0, 18.0), GeometryAnomalyPolicy::Reject, &mut warnings)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);

        let g = ScreenGeometry::resolve(&aquifer(10.0, 1.0), &well(3.0, 18.0), GeometryAnomalyPolicy::Coerce, &mut warnings)
            .unwrap();
        assert!((g.below_screen - 1.0).abs() < 1e-12);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn full_penetration_uses_third_polynomial() {
        let mut warnings = Vec::new();
        let g = ScreenGeometry::resolve(&aquifer(10.0, 1.0), &well(5.0, 15.0), GeometryAnomalyPolicy::Reject, &mut warnings)
            .unwrap();
        assert!(g.full_penetration);
        assert!(g.ln_re_rw(6.0).unwrap() > 0.0);
    }

    #[test]
    fn screen_above_water_table_clamps_d_only() {
        let mut warnings = Vec::new();
        let g = ScreenGeometry::resolve(&aquifer(50.0, 1.0), &well(4.0, 8.0), GeometryAnomalyPolicy::Reject, &mut warnings)
            .unwrap();
        assert_eq!(g.d, 0.0);
        assert_eq!(g.b, 4.0);
        assert!((g.below_screen - 46.0).abs() < 1e-12);
        assert_eq!(warnings.len(), 1);
        assert!(g.ln_re_rw(6.0).unwrap() > 0.0);
    }

    #[test]
    fn zero_anisotropy_is_a_configuration_error() {
        let mut warnings = Vec::new();
        let err = ScreenGeometry::resolve(&aquifer(50.0, 0.0), &well(1.5, 20.0), GeometryAnomalyPolicy::Reject, &mut warnings)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }
}
