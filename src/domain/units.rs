//! Unit harmonization for lengths and times.
//!
//! Only two families exist: lengths (`m`, `ft`) and times (`s`, `min`, `hr`).
//! Conversions inside a family always succeed; mixing families is an
//! unsupported conversion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Feet per metre.
const FT_PER_M: f64 = 3.28084;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    M,
    Ft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    S,
    Min,
    #[serde(alias = "h")]
    Hr,
}

/// Either kind of unit, for the generic [`convert`] entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Length(LengthUnit),
    Time(TimeUnit),
}

impl LengthUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            LengthUnit::M => "m",
            LengthUnit::Ft => "ft",
        }
    }

    fn feet_per_unit(self) -> f64 {
        match self {
            LengthUnit::M => FT_PER_M,
            LengthUnit::Ft => 1.0,
        }
    }

    /// Standard gravity expressed in this length unit per second squared.
    pub fn gravity(self) -> f64 {
        match self {
            LengthUnit::M => 9.80665,
            LengthUnit::Ft => 32.174,
        }
    }
}

impl TimeUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TimeUnit::S => "s",
            TimeUnit::Min => "min",
            TimeUnit::Hr => "hr",
        }
    }

    fn seconds_per_unit(self) -> f64 {
        match self {
            TimeUnit::S => 1.0,
            TimeUnit::Min => 60.0,
            TimeUnit::Hr => 3600.0,
        }
    }
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Length(u) => u.symbol(),
            Unit::Time(u) => u.symbol(),
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for LengthUnit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" => Ok(LengthUnit::M),
            "ft" => Ok(LengthUnit::Ft),
            other => Err(AppError::config(format!(
                "Invalid length unit '{other}'. Must be 'm' or 'ft'."
            ))),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" => Ok(TimeUnit::S),
            "min" => Ok(TimeUnit::Min),
            "hr" | "h" => Ok(TimeUnit::Hr),
            other => Err(AppError::config(format!(
                "Invalid time unit '{other}'. Must be 's', 'min', or 'hr'."
            ))),
        }
    }
}

impl FromStr for Unit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(u) = s.parse::<LengthUnit>() {
            return Ok(Unit::Length(u));
        }
        if let Ok(u) = s.parse::<TimeUnit>() {
            return Ok(Unit::Time(u));
        }
        Err(AppError::config(format!("Unknown unit '{}'.", s.trim())))
    }
}

impl From<LengthUnit> for Unit {
    fn from(value: LengthUnit) -> Self {
        Unit::Length(value)
    }
}

impl From<TimeUnit> for Unit {
    fn from(value: TimeUnit) -> Self {
        Unit::Time(value)
    }
}

/// Convert `value` from one unit to another.
///
/// Identity when the units are equal. Errors on a length/time mix.
pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64, AppError> {
    match (from, to) {
        (Unit::Length(a), Unit::Length(b)) => Ok(convert_length(value, a, b)),
        (Unit::Time(a), Unit::Time(b)) => Ok(convert_time(value, a, b)),
        _ => Err(AppError::config(format!(
            "Unsupported unit conversion: {from} to {to}"
        ))),
    }
}

/// String-keyed variant of [`convert`] for boundary callers.
pub fn convert_str(value: f64, from: &str, to: &str) -> Result<f64, AppError> {
    let from: Unit = from.parse()?;
    let to: Unit = to.parse()?;
    convert(value, from, to)
}

pub fn convert_length(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
    if from == to {
        return value;
    }
    value * from.feet_per_unit() / to.feet_per_unit()
}

pub fn convert_time(value: f64, from: TimeUnit, to: TimeUnit) -> f64 {
    if from == to {
        return value;
    }
    value * from.seconds_per_unit() / to.seconds_per_unit()
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: [Unit; 5] = [
        Unit::Length(LengthUnit::M),
        Unit::Length(LengthUnit::Ft),
        Unit::Time(TimeUnit::S),
        Unit::Time(TimeUnit::Min),
        Unit::Time(TimeUnit::Hr),
    ];

    fn same_family(a: Unit, b: Unit) -> bool {
        matches!(
            (a, b),
            (Unit::Length(_), Unit::Length(_)) | (Unit::Time(_), Unit::Time(_))
        )
    }

    #[test]
    fn round_trip_within_family() {
        for &v in &[0.0, 1e-6, 0.125, 1.0, 50.6, 1e6, -3.5] {
            for &a in &UNITS {
                for &b in &UNITS {
                    if !same_family(a, b) {
                        continue;
                    }
                    let there = convert(v, a, b).unwrap();
                    let back = convert(there, b, a).unwrap();
                    assert!(
                        (back - v).abs() <= 1e-12 * v.abs().max(1.0),
                        "{v} {a}->{b}->{a} gave {back}"
                    );
                }
            }
        }
    }

    #[test]
    fn known_factors() {
        assert!((convert_length(1.0, LengthUnit::M, LengthUnit::Ft) - 3.28084).abs() < 1e-12);
        assert_eq!(convert_time(2.0, TimeUnit::Min, TimeUnit::S), 120.0);
        assert_eq!(convert_time(7200.0, TimeUnit::S, TimeUnit::Hr), 2.0);
        assert_eq!(convert_time(1.0, TimeUnit::Hr, TimeUnit::Min), 60.0);
    }

    #[test]
    fn identity_when_units_match() {
        assert_eq!(convert_str(4.2, "ft", "ft").unwrap(), 4.2);
        assert_eq!(convert_str(4.2, "h", "hr").unwrap(), 4.2);
    }

    #[test]
    fn mixing_length_and_time_is_rejected() {
        let err = convert_str(1.0, "m", "s").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
        assert!(convert_str(1.0, "yd", "m").is_err());
    }
}
