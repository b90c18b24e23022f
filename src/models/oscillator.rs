//! Damped-oscillator response of a slug test in a high-K formation.
//!
//! The normalized head `w = H/H0` satisfies
//!
//! ```text
//! w'' + Cd w' + w = 0,   w(0) = 1,   w'(0) = 0
//! ```
//!
//! in dimensionless time `td = mod_factor * t`. `Cd` is the damping
//! parameter: above 2 the response is overdamped, below 2 it oscillates.

use crate::models::ModelFn;

/// Half-width of the band treated as critically damped.
const CRITICAL_BAND: f64 = 1e-9;

/// Normalized head at elapsed time `t`.
pub fn damped_oscillator(t: f64, cd: f64, mod_factor: f64) -> f64 {
    let td = mod_factor * t;
    let half = cd / 2.0;

    if (cd - 2.0).abs() < CRITICAL_BAND {
        return (1.0 + td) * (-td).exp();
    }

    if cd > 2.0 {
        let root = (half * half - 1.0).sqrt();
        let r_plus = -half + root;
        let r_minus = -half - root;
        (r_minus * (r_plus * td).exp() - r_plus * (r_minus * td).exp()) / (r_minus - r_plus)
    } else {
        let omega = (1.0 - half * half).sqrt();
        (-half * td).exp() * ((omega * td).cos() + half / omega * (omega * td).sin())
    }
}

/// [`damped_oscillator`] with parameters `(cd, mod_factor)`.
pub fn oscillator_model() -> ModelFn {
    ModelFn::new("damped_oscillator", &["cd", "mod_factor"], |t, p| {
        damped_oscillator(t, p[0], p[1])
    })
}
