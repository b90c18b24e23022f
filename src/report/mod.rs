//! Reporting utilities: human-readable result summaries.

pub mod format;

pub use format::*;
