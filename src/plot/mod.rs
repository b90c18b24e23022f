//! Diagnostic figures.
//!
//! - `figure`: renderer-independent description built by the solution methods
//! - `svg`: file-quality output via plotters
//! - `ascii`: fixed-grid terminal output

pub mod ascii;
pub mod figure;
pub mod svg;

pub use figure::*;
