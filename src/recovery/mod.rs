//! Static level and recovery isolation.
//!
//! Two strategies estimate the pre-test static water level:
//!
//! - [`percentile_static_level`]: average of the samples whose local change is
//!   below a low percentile of all local changes
//! - [`isolate_recovery`]: sliding-window mean shift that locates the
//!   perturbation instant and keeps only what follows it
//!
//! [`normalize_recovery`] turns either into the `H/H0` series the solution
//! methods fit.

pub mod percentile;
pub mod window;

pub use percentile::*;
pub use window::*;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Strategy used to find the static level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum StaticLevelMethod {
    Percentile { percentile: f64 },
    WindowShift { window: usize },
}

impl Default for StaticLevelMethod {
    fn default() -> Self {
        StaticLevelMethod::Percentile { percentile: 10.0 }
    }
}

/// Recovery record normalized to the initial displacement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecovery {
    pub static_level: f64,
    /// Initial displacement `H0` (first sample of the recovery minus static level).
    pub h0: f64,
    /// Index of the first recovery sample in the raw record.
    pub start_index: usize,
    /// Elapsed time since the first recovery sample.
    pub time: Vec<f64>,
    /// `H/H0`.
    pub ratio: Vec<f64>,
}

/// Smallest initial displacement that can be normalized by.
const MIN_DISPLACEMENT: f64 = 1e-12;

/// Estimate the static level with `method` and normalize what follows.
pub fn normalize_recovery(
    time: &[f64],
    head: &[f64],
    method: StaticLevelMethod,
) -> Result<NormalizedRecovery, AppError> {
    if time.len() != head.len() {
        return Err(AppError::data(format!(
            "time and head must have the same length ({} vs {}).",
            time.len(),
            head.len()
        )));
    }

    let (static_level, start_index) = match method {
        StaticLevelMethod::Percentile { percentile } => (percentile_static_level(head, percentile)?, 0),
        StaticLevelMethod::WindowShift { window } => {
            let segment = isolate_recovery(time, head, window)?;
            (segment.static_level, segment.transition_index)
        }
    };

    let h0 = head[start_index] - static_level;
    if !(h0.abs() > MIN_DISPLACEMENT) {
        return Err(AppError::data(format!(
            "Initial displacement is zero (head {:.6} at static level {:.6}).",
            head[start_index], static_level
        )));
    }

    let t_start = time[start_index];
    Ok(NormalizedRecovery {
        static_level,
        h0,
        start_index,
        time: time[start_index..].iter().map(|t| t - t_start).collect(),
        ratio: head[start_index..].iter().map(|h| (h - static_level) / h0).collect(),
    })
}
