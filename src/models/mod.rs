//! Physical forward models for slug-test recovery.
//!
//! Models are small pure functions wrapped in [`ModelFn`] so the regression
//! engine can stay generic.

pub mod decay;
pub mod model;
pub mod oscillator;

pub use decay::*;
pub use model::*;
pub use oscillator::*;
