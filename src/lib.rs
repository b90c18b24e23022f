//! `slug-curves` library crate.
//!
//! Slug-test analysis for aquifer hydraulic conductivity: unit harmonization,
//! static-level and recovery isolation, a regression engine, and the
//! Bouwer-Rice (1976) and Butler (2003) solution methods.
//!
//! The binary (`slug`) is a thin wrapper around this library so the analysis
//! is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod recovery;
pub mod report;
pub mod settings;
pub mod solution;
