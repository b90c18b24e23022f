//! Ordinary least squares for a straight line.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Simple `y = intercept + slope * x` regression with inference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OlsFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub rvalue: f64,
    /// Two-sided p-value for `slope = 0`.
    pub pvalue: f64,
    pub stderr: f64,
    pub intercept_stderr: f64,
}

const TINY: f64 = 1e-20;

/// Fit a line by ordinary least squares.
///
/// Callers guarantee `x.len() == y.len() >= 2`. Fails when every `x` is the
/// same (the slope is undefined).
pub fn fit_line(x: &[f64], y: &[f64]) -> Result<OlsFit, String> {
    let n = x.len();
    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    // Biased (1/n) second moments.
    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    sxx /= nf;
    syy /= nf;
    sxy /= nf;

    if sxx == 0.0 {
        return Err("Cannot calculate a linear regression if all x values are identical.".to_string());
    }

    let rvalue = if syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let (pvalue, stderr, intercept_stderr) = if n == 2 {
        let p = if y[0] == y[1] { 1.0 } else { 0.0 };
        (p, 0.0, 0.0)
    } else {
        let df = nf - 2.0;
        let t = rvalue * (df / ((1.0 - rvalue + TINY) * (1.0 + rvalue + TINY))).sqrt();
        let p = student_t_two_sided(t, df);
        let se = ((1.0 - rvalue * rvalue) * syy / sxx / df).sqrt();
        (p, se, se * (sxx + x_mean * x_mean).sqrt())
    };

    Ok(OlsFit {
        slope,
        intercept,
        rvalue,
        pvalue,
        stderr,
        intercept_stderr,
    })
}

fn student_t_two_sided(t: f64, df: f64) -> f64 {
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}
