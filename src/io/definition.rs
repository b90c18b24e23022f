//! TOML test definitions.
//!
//! ```toml
//! name = "MW-1 rising head"
//! method = "bouwer_rice_1976"      # or "butler_2003"
//! test_type = "slug"
//! data = "mw1.csv"                 # relative to this file
//!
//! [aquifer]
//! aquifer_type = "unconfined"
//! ground_surface_elevation = 100.0
//! saturated_thickness = 50.6
//! water_table_depth = 10.0
//!
//! [well]
//! name = "MW-1"
//! casing_radius = 0.064
//! well_radius = 0.125
//! screen_length = 1.52
//! screen_top_depth = 28.54
//!
//! [settings]
//! br_window_upper = 0.35
//! ```
//!
//! Instead of `data`, the record may be given inline as `time` and `head`
//! arrays.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{Aquifer, AquiferSpec, MethodKind, SlugWell, WellSpec};
use crate::error::AppError;
use crate::io::ingest::{ColumnSpec, load_slug_csv};
use crate::settings::AnalysisSettings;
use crate::solution::{SlugTest, TestType};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestDefinition {
    pub name: String,
    pub method: MethodKind,
    #[serde(default = "default_test_type")]
    pub test_type: String,
    /// CSV record file.
    #[serde(default)]
    pub data: Option<PathBuf>,
    #[serde(default)]
    pub time_column: Option<String>,
    #[serde(default)]
    pub head_column: Option<String>,
    #[serde(default)]
    pub time: Option<Vec<f64>>,
    #[serde(default)]
    pub head: Option<Vec<f64>>,
    #[serde(default)]
    pub slug_volume: Option<f64>,
    #[serde(default = "default_recovery")]
    pub is_recovery_data: bool,
    pub aquifer: AquiferSpec,
    pub well: WellSpec,
    #[serde(default)]
    pub settings: AnalysisSettings,
}

fn default_test_type() -> String {
    "slug".to_string()
}

fn default_recovery() -> bool {
    true
}

impl TestDefinition {
    pub fn from_toml_str(s: &str) -> Result<Self, AppError> {
        toml::from_str(s).map_err(|e| AppError::config(format!("Invalid test definition: {e}")))
    }

    /// Build the runnable test. A relative `data` path resolves against
    /// `base_dir`.
    pub fn into_slug_test(self, base_dir: &Path) -> Result<SlugTest, AppError> {
        let test_type: TestType = self.test_type.parse()?;
        let (time, head) = self.load_record(base_dir)?;
        let aquifer = Aquifer::new(self.aquifer)?;
        let well = SlugWell::new(self.well, head, time, self.slug_volume, self.is_recovery_data)?;
        SlugTest::new(self.method, self.name, test_type, aquifer, well, self.settings)
    }

    fn load_record(&self, base_dir: &Path) -> Result<(Vec<f64>, Vec<f64>), AppError> {
        match (&self.data, &self.time, &self.head) {
            (Some(path), None, None) => {
                let path = if path.is_relative() { base_dir.join(path) } else { path.clone() };
                let defaults = ColumnSpec::default();
                let columns = ColumnSpec {
                    time: self.time_column.clone().unwrap_or(defaults.time),
                    head: self.head_column.clone().unwrap_or(defaults.head),
                };
                let record = load_slug_csv(&path, &columns)?;
                Ok((record.time, record.head))
            }
            (None, Some(time), Some(head)) => Ok((time.clone(), head.clone())),
            _ => Err(AppError::config(format!(
                "Test '{}' must give either `data` or both `time` and `head`.",
                self.name
            ))),
        }
    }
}

/// Read a definition file and build its test.
pub fn load_test_definition(path: &Path) -> Result<SlugTest, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read test definition '{}': {e}", path.display())))?;
    let def = TestDefinition::from_toml_str(&text)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    def.into_slug_test(base_dir)
}
