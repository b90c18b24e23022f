//! Descriptive statistics over plain slices.

use std::cmp::Ordering;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`ddof = 1`); `NaN` for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    let Some(m) = mean(values) else {
        return f64::NAN;
    };
    if n < 2 {
        return f64::NAN;
    }
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (n as f64 - 1.0)).sqrt()
}

pub fn median_mut(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Normalized median absolute deviation about the median (`MAD / 0.6745`).
pub fn mad_scale(values: &[f64]) -> Option<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    let med = median_mut(&mut v)?;
    let mut dev: Vec<f64> = v.iter().map(|x| (x - med).abs()).collect();
    median_mut(&mut dev).map(|mad| mad / 0.6745)
}

/// Percentile with linear interpolation between closest ranks.
///
/// `p` is in `[0, 100]`. Returns `None` for an empty slice or out-of-range `p`.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Index of the largest value (first one on ties).
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the smallest value (first one on ties).
pub fn argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_linearly() {
        let v = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&v, 0.0), Some(1.0));
        assert_eq!(percentile(&v, 100.0), Some(5.0));
        assert_eq!(percentile(&v, 50.0), Some(3.0));
        assert!((percentile(&v, 10.0).unwrap() - 1.4).abs() < 1e-12);
        assert_eq!(percentile(&v, 101.0), None);
        assert_eq!(percentile(&[], 10.0), None);
    }

    #[test]
    fn sample_std_matches_hand_computation() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((sample_std(&v) - 2.138_089_935_299_395).abs() < 1e-12);
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn arg_extrema_pick_first_on_ties() {
        let v = [1.0, 3.0, 3.0, -2.0, -2.0];
        assert_eq!(argmax(&v), Some(1));
        assert_eq!(argmin(&v), Some(3));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn mad_scale_of_symmetric_sample() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        // median 3, absolute deviations [2,1,0,1,2] -> MAD 1
        assert!((mad_scale(&v).unwrap() - 1.0 / 0.6745).abs() < 1e-12);
    }
}
