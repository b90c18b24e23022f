//! Sliding-window mean-shift recovery isolation.

use serde::Serialize;
use tracing::debug;

use crate::error::AppError;
use crate::math::{argmax, argmin, mean};

/// Recovery part of a two-phase record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoverySegment {
    pub static_level: f64,
    /// Index of the perturbation instant in the raw record.
    pub transition_index: usize,
    /// Raw time stamps from the transition on.
    pub time: Vec<f64>,
    /// Head minus static level from the transition on.
    pub displacement: Vec<f64>,
}

/// Locate the perturbation in a flat-then-recovering record.
///
/// The index with the largest jump between the means of the `window`
/// samples before and after it is refined to the local extremum within
/// `±window` samples. The static level is the mean of the `window` samples
/// preceding the refined index.
pub fn isolate_recovery(time: &[f64], head: &[f64], window: usize) -> Result<RecoverySegment, AppError> {
    if window == 0 {
        return Err(AppError::config("Recovery window must be at least one sample."));
    }
    let n = head.len();
    if time.len() != n {
        return Err(AppError::data("time and head must have the same length."));
    }
    if n < 2 * window + 1 {
        return Err(AppError::data(format!(
            "Record of {n} samples is too short for a window of {window}."
        )));
    }

    let mut best = 0.0;
    let mut best_i = window;
    let mut shift_up = true;
    for i in window..=(n - window) {
        let before = mean(&head[i - window..i]).unwrap_or(f64::NAN);
        let after = mean(&head[i..i + window]).unwrap_or(f64::NAN);
        let d = after - before;
        if d.abs() > best {
            best = d.abs();
            best_i = i;
            shift_up = d > 0.0;
        }
    }
    if best == 0.0 {
        return Err(AppError::data("No level shift found in the head record."));
    }

    let lo = best_i - window;
    let hi = (best_i + window).min(n);
    let local = &head[lo..hi];
    let j = if shift_up { argmax(local) } else { argmin(local) }
        .ok_or_else(|| AppError::data("Empty search window around the level shift."))?;
    let transition = lo + j;
    if transition == 0 {
        return Err(AppError::data("Perturbation at the first sample leaves no pre-test record."));
    }

    let pre = &head[transition.saturating_sub(window)..transition];
    let static_level = mean(pre).ok_or_else(|| AppError::data("No pre-test samples before the perturbation."))?;
    debug!(transition, static_level, shift = best, "recovery isolated");

    Ok(RecoverySegment {
        static_level,
        transition_index: transition,
        time: time[transition..].to_vec(),
        displacement: head[transition..].iter().map(|h| h - static_level).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(jump: f64) -> (Vec<f64>, Vec<f64>) {
        let time: Vec<f64> = (0..60).map(|i| i as f64 * 0.5).collect();
        let head = (0..60)
            .map(|i| if i < 25 { 10.0 } else { 10.0 + jump * (-(i as f64 - 25.0) / 5.0).exp() })
            .collect();
        (time, head)
    }

    #[test]
    fn finds_a_rising_slug() {
        let (time, head) = record(2.0);
        let seg = isolate_recovery(&time, &head, 6).unwrap();
        assert_eq!(seg.transition_index, 25);
        assert_eq!(seg.static_level, 10.0);
        assert_eq!(seg.time[0], 12.5);
        assert!((seg.displacement[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn finds_a_falling_slug() {
        let (time, head) = record(-1.0);
        let seg = isolate_recovery(&time, &head, 6).unwrap();
        assert_eq!(seg.transition_index, 25);
        assert!((seg.displacement[0] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn short_or_flat_records_are_rejected() {
        let (time, head) = record(2.0);
        assert!(isolate_recovery(&time[..5], &head[..5], 3).is_err());
        assert!(isolate_recovery(&time, &vec![1.0; 60], 3).is_err());
    }
}
