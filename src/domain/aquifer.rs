//! Aquifer entity.
//!
//! An `Aquifer` is built once per test from an [`AquiferSpec`] and is
//! immutable afterwards. Solution methods call [`Aquifer::harmonized`] to get
//! a copy expressed in the well's length unit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::units::{LengthUnit, TimeUnit, convert_length};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AquiferType {
    Unconfined,
    Confined,
    SemiConfined,
}

impl AquiferType {
    pub const ALL: [AquiferType; 3] = [
        AquiferType::Unconfined,
        AquiferType::Confined,
        AquiferType::SemiConfined,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AquiferType::Unconfined => "unconfined",
            AquiferType::Confined => "confined",
            AquiferType::SemiConfined => "semi-confined",
        }
    }
}

impl fmt::Display for AquiferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AquiferType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace('_', "-");
        AquiferType::ALL
            .into_iter()
            .find(|t| t.as_str() == norm)
            .ok_or_else(|| {
                AppError::config(format!(
                    "Invalid aquifer type: '{}'. Valid types are: unconfined, confined, semi-confined.",
                    s.trim()
                ))
            })
    }
}

/// Raw constructor parameters, as they arrive from a test definition.
///
/// The aquifer type is kept as a string here so an invalid value surfaces as
/// a configuration error from [`Aquifer::new`] rather than a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct AquiferSpec {
    #[serde(default = "default_aquifer_name")]
    pub name: String,
    pub aquifer_type: Option<String>,
    pub ground_surface_elevation: Option<f64>,
    pub saturated_thickness: Option<f64>,
    pub water_table_depth: Option<f64>,
    #[serde(default = "default_anisotropy")]
    pub anisotropy: f64,
    #[serde(default)]
    pub radial_conductivity: Option<f64>,
    #[serde(default)]
    pub vertical_conductivity: Option<f64>,
    #[serde(default)]
    pub specific_yield: Option<f64>,
    #[serde(default)]
    pub specific_storage: Option<f64>,
    #[serde(default = "default_length_unit")]
    pub length_unit: LengthUnit,
    #[serde(default = "default_time_unit")]
    pub time_unit: TimeUnit,
}

fn default_aquifer_name() -> String {
    "unnamed_aquifer".to_string()
}

fn default_anisotropy() -> f64 {
    1.0
}

fn default_length_unit() -> LengthUnit {
    LengthUnit::M
}

fn default_time_unit() -> TimeUnit {
    TimeUnit::S
}

impl AquiferSpec {
    /// Spec with the four required fields set and everything else defaulted.
    pub fn new(
        aquifer_type: &str,
        ground_surface_elevation: f64,
        saturated_thickness: f64,
        water_table_depth: f64,
    ) -> Self {
        Self {
            name: default_aquifer_name(),
            aquifer_type: Some(aquifer_type.to_string()),
            ground_surface_elevation: Some(ground_surface_elevation),
            saturated_thickness: Some(saturated_thickness),
            water_table_depth: Some(water_table_depth),
            anisotropy: default_anisotropy(),
            radial_conductivity: None,
            vertical_conductivity: None,
            specific_yield: None,
            specific_storage: None,
            length_unit: default_length_unit(),
            time_unit: default_time_unit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aquifer {
    name: String,
    aquifer_type: AquiferType,
    ground_surface_elevation: f64,
    saturated_thickness: f64,
    water_table_depth: f64,
    anisotropy: f64,
    radial_conductivity: Option<f64>,
    vertical_conductivity: Option<f64>,
    specific_yield: Option<f64>,
    specific_storage: Option<f64>,
    length_unit: LengthUnit,
    time_unit: TimeUnit,
}

impl Aquifer {
    pub fn new(spec: AquiferSpec) -> Result<Self, AppError> {
        let aquifer_type: AquiferType = required(spec.aquifer_type, "aquifer_type")?.parse()?;
        let ground_surface_elevation =
            required(spec.ground_surface_elevation, "ground_surface_elevation")?;
        let saturated_thickness = required(spec.saturated_thickness, "saturated_thickness")?;
        let water_table_depth = required(spec.water_table_depth, "water_table_depth")?;

        if !ground_surface_elevation.is_finite() {
            return Err(AppError::config("ground_surface_elevation must be finite."));
        }
        if !(saturated_thickness.is_finite() && saturated_thickness > 0.0) {
            return Err(AppError::config(format!(
                "Saturated thickness must be greater than zero (got {saturated_thickness})."
            )));
        }
        if !(water_table_depth.is_finite() && water_table_depth >= 0.0) {
            return Err(AppError::config(format!(
                "Water table depth must be non-negative (got {water_table_depth})."
            )));
        }
        if !(spec.anisotropy.is_finite() && spec.anisotropy >= 0.0) {
            return Err(AppError::config(format!(
                "Anisotropy ratio Kh/Kv must be non-negative (got {}).",
                spec.anisotropy
            )));
        }
        for (label, value) in [
            ("radial_conductivity", spec.radial_conductivity),
            ("vertical_conductivity", spec.vertical_conductivity),
            ("specific_yield", spec.specific_yield),
            ("specific_storage", spec.specific_storage),
        ] {
            if let Some(v) = value {
                if !(v.is_finite() && v >= 0.0) {
                    return Err(AppError::config(format!(
                        "{label} must be non-negative when set (got {v})."
                    )));
                }
            }
        }

        Ok(Self {
            name: spec.name,
            aquifer_type,
            ground_surface_elevation,
            saturated_thickness,
            water_table_depth,
            anisotropy: spec.anisotropy,
            radial_conductivity: spec.radial_conductivity,
            vertical_conductivity: spec.vertical_conductivity,
            specific_yield: spec.specific_yield,
            specific_storage: spec.specific_storage,
            length_unit: spec.length_unit,
            time_unit: spec.time_unit,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aquifer_type(&self) -> AquiferType {
        self.aquifer_type
    }

    pub fn ground_surface_elevation(&self) -> f64 {
        self.ground_surface_elevation
    }

    pub fn saturated_thickness(&self) -> f64 {
        self.saturated_thickness
    }

    pub fn water_table_depth(&self) -> f64 {
        self.water_table_depth
    }

    /// Kh/Kv.
    pub fn anisotropy(&self) -> f64 {
        self.anisotropy
    }

    pub fn radial_conductivity(&self) -> Option<f64> {
        self.radial_conductivity
    }

    pub fn vertical_conductivity(&self) -> Option<f64> {
        self.vertical_conductivity
    }

    pub fn specific_yield(&self) -> Option<f64> {
        self.specific_yield
    }

    pub fn specific_storage(&self) -> Option<f64> {
        self.specific_storage
    }

    pub fn length_unit(&self) -> LengthUnit {
        self.length_unit
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    /// Elevation of the water table.
    pub fn water_table_elevation(&self) -> f64 {
        self.ground_surface_elevation - self.water_table_depth
    }

    /// Sy·b for unconfined aquifers, Ss·b otherwise; `None` when the needed
    /// specific value is absent.
    pub fn storage_coefficient(&self) -> Option<f64> {
        let specific = match self.aquifer_type {
            AquiferType::Unconfined => self.specific_yield,
            AquiferType::Confined | AquiferType::SemiConfined => self.specific_storage,
        };
        specific.map(|s| s * self.saturated_thickness)
    }

    /// Kr·b, when a radial conductivity is known.
    pub fn transmissivity(&self) -> Option<f64> {
        self.radial_conductivity.map(|k| k * self.saturated_thickness)
    }

    /// Copy of this aquifer with every length-valued attribute expressed in
    /// `unit`. Conductivities become `unit` per the aquifer's time unit and
    /// specific storage (1/L) is scaled inversely.
    pub fn harmonized(&self, unit: LengthUnit) -> Aquifer {
        if unit == self.length_unit {
            return self.clone();
        }
        let from = self.length_unit;
        let len = |v: f64| convert_length(v, from, unit);
        Aquifer {
            name: self.name.clone(),
            aquifer_type: self.aquifer_type,
            ground_surface_elevation: len(self.ground_surface_elevation),
            saturated_thickness: len(self.saturated_thickness),
            water_table_depth: len(self.water_table_depth),
            anisotropy: self.anisotropy,
            radial_conductivity: self.radial_conductivity.map(len),
            vertical_conductivity: self.vertical_conductivity.map(len),
            specific_yield: self.specific_yield,
            specific_storage: self.specific_storage.map(|ss| ss / len(1.0)),
            length_unit: unit,
            time_unit: self.time_unit,
        }
    }
}

impl fmt::Display for Aquifer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = self.length_unit;
        writeln!(f, "Aquifer: {}", self.name)?;
        writeln!(f, "  Type: {}", self.aquifer_type)?;
        writeln!(f, "  Ground surface elevation: {:.2} {u}", self.ground_surface_elevation)?;
        writeln!(f, "  Saturated thickness: {:.2} {u}", self.saturated_thickness)?;
        writeln!(f, "  Water table depth: {:.2} {u}", self.water_table_depth)?;
        write!(f, "  Anisotropy (Kh/Kv): {:.3}", self.anisotropy)
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::config(format!("Required aquifer property '{field}' is not set.")))
}
