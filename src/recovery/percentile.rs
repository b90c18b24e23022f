//! Percentile-threshold static level.

use tracing::debug;

use crate::error::AppError;
use crate::math::{mean, percentile};

/// Absolute change from each sample to the next; the last change is repeated
/// for the final sample so the result lines up with `head`.
pub fn local_changes(head: &[f64]) -> Vec<f64> {
    let mut diffs: Vec<f64> = head.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    if let Some(&last) = diffs.last() {
        diffs.push(last);
    }
    diffs
}

/// Mean head over the samples whose local change is at or below the given
/// percentile of all local changes.
pub fn percentile_static_level(head: &[f64], pct: f64) -> Result<f64, AppError> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(AppError::config(format!(
            "Static-level percentile must lie in [0, 100] (got {pct})."
        )));
    }
    if head.len() < 2 {
        return Err(AppError::data("At least two head samples are needed to find a static level."));
    }

    let diffs = local_changes(head);
    let threshold = percentile(&diffs, pct)
        .ok_or_else(|| AppError::data("Could not compute a stability threshold from the head record."))?;

    let stable: Vec<f64> = head
        .iter()
        .zip(&diffs)
        .filter(|(_, d)| **d <= threshold)
        .map(|(h, _)| *h)
        .collect();

    let level = mean(&stable).ok_or_else(|| {
        AppError::data(format!(
            "No stable samples at or below the {pct}th-percentile change threshold ({threshold:.3e})."
        ))
    })?;

    debug!(threshold, stable = stable.len(), level, "static level from percentile threshold");
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    fn slug_record(level: f64, sigma: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, sigma.max(f64::MIN_POSITIVE)).unwrap();
        let mut head = vec![level; 150];
        head.extend((0..150).map(|i| level + 2.0 * (-(i as f64) / 12.0).exp()));
        for h in head.iter_mut() {
            if sigma > 0.0 {
                *h += noise.sample(&mut rng);
            }
        }
        head
    }

    #[test]
    fn local_changes_repeat_the_last_difference() {
        assert_eq!(local_changes(&[1.0, 3.0, 2.0]), vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn level_is_within_noise_of_truth() {
        for (sigma, seed) in [(0.0, 1), (0.01, 2), (0.1, 3)] {
            let head = slug_record(4.2, sigma, seed);
            let level = percentile_static_level(&head, 10.0).unwrap();
            assert!((level - 4.2).abs() <= 3.0 * sigma + 1e-9, "sigma={sigma} level={level}");
        }
    }

    #[test]
    fn out_of_range_percentile_is_a_configuration_error() {
        let err = percentile_static_level(&[1.0, 2.0], 120.0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn nan_record_has_no_stable_samples() {
        let err = percentile_static_level(&[f64::NAN, f64::NAN, f64::NAN], 10.0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DataQuality);
    }
}
