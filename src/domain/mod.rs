//! Domain types used throughout the analysis.
//!
//! This module defines:
//!
//! - units and the harmonizer (`LengthUnit`, `TimeUnit`, `convert`)
//! - the physical setting (`Aquifer`) and instrumented wells (`Well`, `SlugWell`)
//! - analysis outputs (`AnalysisResult`, `EstimatedParameters`)

pub mod aquifer;
pub mod result;
pub mod units;
pub mod well;

pub use aquifer::*;
pub use result::*;
pub use units::*;
pub use well::*;
