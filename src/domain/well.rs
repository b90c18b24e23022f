//! Well entities.
//!
//! Geometry is exposed through the [`WellGeometry`] capability so solution
//! methods do not care which kind of well they are handed. A [`SlugWell`]
//! wraps a plain [`Well`] and adds the recorded head/time series.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::units::{LengthUnit, TimeUnit, convert_length, convert_time};
use crate::error::AppError;

/// Geometry accessors shared by every well kind.
pub trait WellGeometry {
    fn name(&self) -> &str;
    /// Inner standpipe (casing) radius.
    fn casing_radius(&self) -> f64;
    /// Borehole radius.
    fn well_radius(&self) -> f64;
    fn screen_length(&self) -> f64;
    /// Depth from ground surface to the top of the screen.
    fn screen_top_depth(&self) -> f64;
    fn length_unit(&self) -> LengthUnit;

    /// Ratio of screen length to borehole radius.
    fn aspect_ratio(&self) -> f64 {
        self.screen_length() / self.well_radius()
    }
}

/// Raw well construction parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct WellSpec {
    #[serde(default = "default_well_name")]
    pub name: String,
    #[serde(default)]
    pub location: Option<(f64, f64)>,
    pub casing_radius: f64,
    pub well_radius: f64,
    pub screen_length: f64,
    pub screen_top_depth: f64,
    #[serde(default = "default_length_unit")]
    pub length_unit: LengthUnit,
    #[serde(default = "default_time_unit")]
    pub time_unit: TimeUnit,
}

fn default_well_name() -> String {
    "unnamed_slug_well".to_string()
}

fn default_length_unit() -> LengthUnit {
    LengthUnit::M
}

fn default_time_unit() -> TimeUnit {
    TimeUnit::S
}

impl WellSpec {
    pub fn new(casing_radius: f64, well_radius: f64, screen_length: f64, screen_top_depth: f64) -> Self {
        Self {
            name: default_well_name(),
            location: None,
            casing_radius,
            well_radius,
            screen_length,
            screen_top_depth,
            length_unit: default_length_unit(),
            time_unit: default_time_unit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Well {
    name: String,
    location: Option<(f64, f64)>,
    casing_radius: f64,
    well_radius: f64,
    screen_length: f64,
    screen_top_depth: f64,
    length_unit: LengthUnit,
    time_unit: TimeUnit,
}

impl Well {
    pub fn new(spec: WellSpec) -> Result<Self, AppError> {
        for (label, value) in [
            ("casing_radius", spec.casing_radius),
            ("well_radius", spec.well_radius),
            ("screen_length", spec.screen_length),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AppError::config(format!(
                    "{label} must be positive (got {value})."
                )));
            }
        }
        if !(spec.screen_top_depth.is_finite() && spec.screen_top_depth >= 0.0) {
            return Err(AppError::config(format!(
                "screen_top_depth must be non-negative (got {}).",
                spec.screen_top_depth
            )));
        }
        if spec.casing_radius >= spec.well_radius {
            return Err(AppError::config(format!(
                "Casing radius ({:.4} {u}) must be less than well radius ({:.4} {u}).",
                spec.casing_radius,
                spec.well_radius,
                u = spec.length_unit
            )));
        }

        Ok(Self {
            name: spec.name,
            location: spec.location,
            casing_radius: spec.casing_radius,
            well_radius: spec.well_radius,
            screen_length: spec.screen_length,
            screen_top_depth: spec.screen_top_depth,
            length_unit: spec.length_unit,
            time_unit: spec.time_unit,
        })
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        self.location
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    /// Copy with every length expressed in `unit`.
    pub fn harmonized(&self, unit: LengthUnit) -> Well {
        let from = self.length_unit;
        let c = |v: f64| convert_length(v, from, unit);
        Well {
            name: self.name.clone(),
            location: self.location,
            casing_radius: c(self.casing_radius),
            well_radius: c(self.well_radius),
            screen_length: c(self.screen_length),
            screen_top_depth: c(self.screen_top_depth),
            length_unit: unit,
            time_unit: self.time_unit,
        }
    }
}

impl WellGeometry for Well {
    fn name(&self) -> &str {
        &self.name
    }

    fn casing_radius(&self) -> f64 {
        self.casing_radius
    }

    fn well_radius(&self) -> f64 {
        self.well_radius
    }

    fn screen_length(&self) -> f64 {
        self.screen_length
    }

    fn screen_top_depth(&self) -> f64 {
        self.screen_top_depth
    }

    fn length_unit(&self) -> LengthUnit {
        self.length_unit
    }
}

impl fmt::Display for Well {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = self.length_unit;
        writeln!(f, "Well: {}", self.name)?;
        if let Some((x, y)) = self.location {
            writeln!(f, "  Location: ({x}, {y})")?;
        }
        writeln!(f, "  Casing radius: {:.4} {u}", self.casing_radius)?;
        writeln!(f, "  Well radius: {:.4} {u}", self.well_radius)?;
        writeln!(f, "  Screen length: {:.3} {u}", self.screen_length)?;
        write!(f, "  Screen top depth: {:.3} {u}", self.screen_top_depth)
    }
}

/// A well with the recorded slug-test response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlugWell {
    well: Well,
    head: Vec<f64>,
    time: Vec<f64>,
    slug_volume: Option<f64>,
    is_recovery_data: bool,
}

impl SlugWell {
    /// Build a slug well. `time` is elapsed time in the spec's time unit and
    /// must be strictly increasing; `head` must have the same length.
    pub fn new(
        spec: WellSpec,
        head: Vec<f64>,
        time: Vec<f64>,
        slug_volume: Option<f64>,
        is_recovery_data: bool,
    ) -> Result<Self, AppError> {
        let well = Well::new(spec)?;

        if head.len() != time.len() {
            return Err(AppError::data(format!(
                "head and time must have the same length ({} vs {}).",
                head.len(),
                time.len()
            )));
        }
        if head.len() < 2 {
            return Err(AppError::data("A slug record needs at least two samples."));
        }
        if let Some(i) = head.iter().position(|h| !h.is_finite()) {
            return Err(AppError::data(format!("Non-finite head value at sample {i}.")));
        }
        if let Some(i) = time.iter().position(|t| !t.is_finite()) {
            return Err(AppError::data(format!("Non-finite time value at sample {i}.")));
        }
        if let Some(i) = time.windows(2).position(|w| w[1] <= w[0]) {
            return Err(AppError::data(format!(
                "time must be strictly increasing (sample {} -> {}).",
                i,
                i + 1
            )));
        }
        if let Some(v) = slug_volume {
            if !(v.is_finite() && v > 0.0) {
                return Err(AppError::config(format!("slug_volume must be positive (got {v}).")));
            }
        }

        Ok(Self {
            well,
            head,
            time,
            slug_volume,
            is_recovery_data,
        })
    }

    pub fn well(&self) -> &Well {
        &self.well
    }

    pub fn head(&self) -> &[f64] {
        &self.head
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn slug_volume(&self) -> Option<f64> {
        self.slug_volume
    }

    pub fn is_recovery_data(&self) -> bool {
        self.is_recovery_data
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.well.time_unit
    }

    /// Copy with geometry and head in `length` and the time axis in `time`.
    pub fn harmonized(&self, length: LengthUnit, time: TimeUnit) -> SlugWell {
        let from_l = self.well.length_unit;
        let from_t = self.well.time_unit;
        let mut well = self.well.harmonized(length);
        well.time_unit = time;
        let scale = convert_length(1.0, from_l, length);
        SlugWell {
            well,
            head: self.head.iter().map(|&h| convert_length(h, from_l, length)).collect(),
            time: self.time.iter().map(|&t| convert_time(t, from_t, time)).collect(),
            slug_volume: self.slug_volume.map(|v| v * scale * scale * scale),
            is_recovery_data: self.is_recovery_data,
        }
    }
}

impl WellGeometry for SlugWell {
    fn name(&self) -> &str {
        self.well.name()
    }

    fn casing_radius(&self) -> f64 {
        self.well.casing_radius()
    }

    fn well_radius(&self) -> f64 {
        self.well.well_radius()
    }

    fn screen_length(&self) -> f64 {
        self.well.screen_length()
    }

    fn screen_top_depth(&self) -> f64 {
        self.well.screen_top_depth()
    }

    fn length_unit(&self) -> LengthUnit {
        self.well.length_unit()
    }
}

impl fmt::Display for SlugWell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.well)?;
        match self.slug_volume {
            Some(v) => writeln!(f, "  Slug volume: {v} {}^3", self.well.length_unit)?,
            None => writeln!(f, "  Slug volume: N/A")?,
        }
        write!(
            f,
            "  Samples: {} over {:.3} {}",
            self.head.len(),
            self.time[self.time.len() - 1] - self.time[0],
            self.well.time_unit
        )
    }
}
