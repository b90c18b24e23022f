//! Analysis outputs.
//!
//! These types are serializable so they can be:
//!
//! - printed as a human-readable summary
//! - exported to JSON
//! - compared across methods and tests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aquifer::AquiferType;
use crate::domain::units::{LengthUnit, TimeUnit, convert_length, convert_time};
use crate::fit::{FitMode, FitResult, FitStatistics};
use crate::plot::DiagnosticFigure;

/// Solution method that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    #[serde(rename = "bouwer_rice_1976", alias = "bouwer_rice")]
    BouwerRice1976,
    #[serde(rename = "butler_2003", alias = "butler")]
    Butler2003,
}

impl MethodKind {
    pub fn label(self) -> &'static str {
        match self {
            MethodKind::BouwerRice1976 => "Bouwer-Rice (1976)",
            MethodKind::Butler2003 => "Butler (2003)",
        }
    }
}

/// Hydraulic conductivity and transmissivity with the units they are in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimatedParameters {
    /// `L/T`.
    pub hydraulic_conductivity: f64,
    /// `L²/T`.
    pub transmissivity: f64,
    pub length_unit: LengthUnit,
    pub time_unit: TimeUnit,
}

impl EstimatedParameters {
    /// The same estimates expressed in other units.
    pub fn in_units(&self, length: LengthUnit, time: TimeUnit) -> EstimatedParameters {
        // Rates scale with the length of the new time unit.
        let per_time = convert_time(1.0, time, self.time_unit);
        let per_length = convert_length(1.0, self.length_unit, length);
        EstimatedParameters {
            hydraulic_conductivity: self.hydraulic_conductivity * per_length * per_time,
            transmissivity: self.transmissivity * per_length * per_length * per_time,
            length_unit: length,
            time_unit: time,
        }
    }

    pub fn conductivity_units(&self) -> String {
        format!("{}/{}", self.length_unit, self.time_unit)
    }

    pub fn transmissivity_units(&self) -> String {
        format!("{}^2/{}", self.length_unit, self.time_unit)
    }
}

/// Oscillation regime implied by the damping parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DampingRegime {
    Underdamped,
    CriticallyDamped,
    Overdamped,
}

impl DampingRegime {
    pub fn from_cd(cd: f64) -> Self {
        if (cd - 2.0).abs() < 1e-9 {
            DampingRegime::CriticallyDamped
        } else if cd > 2.0 {
            DampingRegime::Overdamped
        } else {
            DampingRegime::Underdamped
        }
    }
}

/// Intermediate quantities of each method, kept for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MethodDetails {
    BouwerRice {
        /// Basic time lag `T0 = -1/slope`.
        t0: f64,
        slope: f64,
        intercept: f64,
        ln_re_rw: f64,
        /// Anisotropy-adjusted well radius `r*w`.
        effective_well_radius: f64,
        /// Water table to screen top.
        d: f64,
        /// Submerged screen length.
        b: f64,
        full_penetration: bool,
        window: [f64; 2],
        window_points: usize,
    },
    Butler {
        cd: f64,
        mod_factor: f64,
        regime: DampingRegime,
        fit_mode: FitMode,
        effective_casing_radius: f64,
        /// Effective water-column length `Le = g / mod_factor²`.
        effective_column_length: f64,
        ln_v7: f64,
        ln_re_rw: f64,
        k_confined: f64,
        k_unconfined: f64,
    },
}

/// Everything one `analyze()` call produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub test_name: String,
    pub well_name: String,
    pub method: MethodKind,
    pub aquifer_type: AquiferType,
    pub analyzed_at: DateTime<Utc>,
    pub estimated_parameters: EstimatedParameters,
    pub fitting_statistics: FitStatistics,
    pub static_level: f64,
    pub initial_displacement: f64,
    pub details: MethodDetails,
    pub fit: FitResult,
    /// Tolerated anomalies (e.g. coerced geometry).
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub figure: DiagnosticFigure,
}

impl AnalysisResult {
    /// Dump the estimates to stdout.
    pub fn print_estimated_parameters(&self) {
        print!("{}", crate::report::format_estimated_parameters(self));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversion_scales_rates_and_areas() {
        let p = EstimatedParameters {
            hydraulic_conductivity: 1e-4,
            transmissivity: 5e-3,
            length_unit: LengthUnit::M,
            time_unit: TimeUnit::S,
        };
        let q = p.in_units(LengthUnit::M, TimeUnit::Min);
        assert!((q.hydraulic_conductivity - 6e-3).abs() < 1e-15);
        let f = p.in_units(LengthUnit::Ft, TimeUnit::S);
        assert!((f.hydraulic_conductivity - 3.28084e-4).abs() < 1e-15);
        assert!((f.transmissivity - 5e-3 * 3.28084 * 3.28084).abs() < 1e-12);
        assert_eq!(f.conductivity_units(), "ft/s");

        let back = f.in_units(LengthUnit::M, TimeUnit::S);
        assert!((back.hydraulic_conductivity - 1e-4).abs() < 1e-16);
    }

    #[test]
    fn regime_follows_damping() {
        assert_eq!(DampingRegime::from_cd(0.5), DampingRegime::Underdamped);
        assert_eq!(DampingRegime::from_cd(2.0), DampingRegime::CriticallyDamped);
        assert_eq!(DampingRegime::from_cd(2.5), DampingRegime::Overdamped);
    }
}
