//! Regression engine.
//!
//! Responsibilities:
//!
//! - ordinary least squares on a line, with inference (`linear`)
//! - Huber/Tukey M-estimation by IRLS (`robust`)
//! - nonlinear least squares with robust losses and bounds (`nonlinear`)
//! - the shared goodness-of-fit block (`statistics`)
//! - a single non-failing entry point over all of them (`engine`)

pub mod engine;
pub mod linear;
pub mod nonlinear;
pub mod robust;
pub mod statistics;

pub use engine::*;
pub use linear::*;
pub use nonlinear::*;
pub use robust::*;
pub use statistics::*;
