//! Slug-test solution methods.
//!
//! Each method owns its aquifer, slug well and settings, and exposes one
//! operation through [`SolutionMethod::analyze`]. [`SlugTest`] dispatches over
//! the available methods so callers can pick one at runtime.
//!
//! Computations run in a single working frame: the well's length unit and
//! seconds (the Butler length scale needs `g` in L/s²). Estimates are then
//! reported in the aquifer's units.

pub mod bouwer_rice;
pub mod butler;
pub mod geometry;

pub use bouwer_rice::*;
pub use butler::*;
pub use geometry::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{Aquifer, AnalysisResult, EstimatedParameters, MethodKind, SlugWell, TimeUnit, WellGeometry};
use crate::error::AppError;
use crate::settings::AnalysisSettings;

/// Aquifer test type. Only slug tests can be analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    #[default]
    Slug,
}

impl FromStr for TestType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slug" => Ok(TestType::Slug),
            other => Err(AppError::config(format!(
                "Unsupported test type '{other}'; only 'slug' tests can be analyzed."
            ))),
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("slug")
    }
}

/// Capability shared by every solution method.
pub trait SolutionMethod {
    fn kind(&self) -> MethodKind;
    fn name(&self) -> &str;
    fn test_type(&self) -> TestType;
    /// Aquifer as supplied.
    fn aquifer(&self) -> &Aquifer;
    /// Slug well as supplied.
    fn slug_well(&self) -> &SlugWell;
    fn settings(&self) -> &AnalysisSettings;
    fn analyze(&self) -> Result<AnalysisResult, AppError>;
}

/// Inputs common to every method, with the working-frame copies.
#[derive(Debug, Clone)]
pub(crate) struct TestSetup {
    pub name: String,
    pub test_type: TestType,
    pub aquifer: Aquifer,
    pub slug_well: SlugWell,
    pub settings: AnalysisSettings,
    pub work_aquifer: Aquifer,
    pub work_well: SlugWell,
}

impl TestSetup {
    pub fn new(
        name: String,
        test_type: TestType,
        aquifer: Aquifer,
        slug_well: SlugWell,
        settings: AnalysisSettings,
    ) -> Result<Self, AppError> {
        settings.validate()?;
        let unit = slug_well.length_unit();
        let work_aquifer = aquifer.harmonized(unit);
        let work_well = slug_well.harmonized(unit, TimeUnit::S);
        if aquifer.length_unit() != unit || slug_well.time_unit() != TimeUnit::S {
            info!(
                test = %name,
                length = %unit,
                from_length = %aquifer.length_unit(),
                from_time = %slug_well.time_unit(),
                "harmonized units to working frame"
            );
        }
        Ok(Self {
            name,
            test_type,
            aquifer,
            slug_well,
            settings,
            work_aquifer,
            work_well,
        })
    }

    /// Estimates computed in the working frame, expressed in the aquifer's units.
    pub fn report_units(&self, conductivity: f64) -> EstimatedParameters {
        EstimatedParameters {
            hydraulic_conductivity: conductivity,
            transmissivity: conductivity * self.work_aquifer.saturated_thickness(),
            length_unit: self.work_well.length_unit(),
            time_unit: TimeUnit::S,
        }
        .in_units(self.aquifer.length_unit(), self.aquifer.time_unit())
    }
}

/// Runtime choice of solution method.
#[derive(Debug, Clone)]
pub enum SlugTest {
    BouwerRice(BouwerRice1976),
    Butler(Butler2003),
}

impl SlugTest {
    pub fn new(
        kind: MethodKind,
        name: impl Into<String>,
        test_type: TestType,
        aquifer: Aquifer,
        slug_well: SlugWell,
        settings: AnalysisSettings,
    ) -> Result<Self, AppError> {
        Ok(match kind {
            MethodKind::BouwerRice1976 => SlugTest::BouwerRice(BouwerRice1976::with_settings(
                name, test_type, aquifer, slug_well, settings,
            )?),
            MethodKind::Butler2003 => {
                SlugTest::Butler(Butler2003::with_settings(name, test_type, aquifer, slug_well, settings)?)
            }
        })
    }

    fn inner(&self) -> &dyn SolutionMethod {
        match self {
            SlugTest::BouwerRice(m) => m,
            SlugTest::Butler(m) => m,
        }
    }
}

impl SolutionMethod for SlugTest {
    fn kind(&self) -> MethodKind {
        self.inner().kind()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn test_type(&self) -> TestType {
        self.inner().test_type()
    }

    fn aquifer(&self) -> &Aquifer {
        self.inner().aquifer()
    }

    fn slug_well(&self) -> &SlugWell {
        self.inner().slug_well()
    }

    fn settings(&self) -> &AnalysisSettings {
        self.inner().settings()
    }

    fn analyze(&self) -> Result<AnalysisResult, AppError> {
        self.inner().analyze()
    }
}
