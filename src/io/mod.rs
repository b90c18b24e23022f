//! Input/output helpers.
//!
//! - CSV ingest of time/head records (`ingest`)
//! - TOML test definitions (`definition`)
//! - JSON result and SVG figure exports (`export`)

pub mod definition;
pub mod export;
pub mod ingest;

pub use definition::*;
pub use export::*;
pub use ingest::*;
