//! Synthetic slug-test records.
//!
//! A record is a flat pre-test period at the static level, the instantaneous
//! displacement `H0`, and the recovery given by one of the forward models.
//! Gaussian noise is drawn from a seeded generator so records are
//! reproducible.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{ModelFn, exponential_model, oscillator_model};

/// Forward model for the recovery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ResponseModel {
    /// `exp(-t / t0)`.
    Exponential { t0: f64 },
    /// Damped oscillator in `(Cd, mod_factor)`.
    Oscillator { cd: f64, mod_factor: f64 },
}

impl ResponseModel {
    /// The regression model for this response and its true parameters.
    pub fn model_fn(&self) -> (ModelFn, Vec<f64>) {
        match *self {
            ResponseModel::Exponential { t0 } => (exponential_model(), vec![t0]),
            ResponseModel::Oscillator { cd, mod_factor } => (oscillator_model(), vec![cd, mod_factor]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSlugTest {
    pub static_level: f64,
    /// Initial displacement `H0`; negative for a slug removal.
    pub displacement: f64,
    pub model: ResponseModel,
    /// Sampling interval.
    pub dt: f64,
    /// Recovery duration after the perturbation.
    pub duration: f64,
    /// Flat record before the perturbation.
    pub pre_test: f64,
    /// Standard deviation of the head noise.
    pub noise_std: f64,
    pub seed: u64,
}

impl Default for SyntheticSlugTest {
    fn default() -> Self {
        Self {
            static_level: 0.0,
            displacement: 1.0,
            model: ResponseModel::Exponential { t0: 10.0 },
            dt: 0.5,
            duration: 60.0,
            pre_test: 0.0,
            noise_std: 0.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticRecord {
    pub time: Vec<f64>,
    pub head: Vec<f64>,
    /// Index of the perturbation sample.
    pub start_index: usize,
}

/// Build the sampled record.
pub fn generate_slug_record(cfg: &SyntheticSlugTest) -> Result<SyntheticRecord, AppError> {
    if !(cfg.dt.is_finite() && cfg.dt > 0.0) {
        return Err(AppError::config(format!("Sampling interval must be positive (got {}).", cfg.dt)));
    }
    if !(cfg.duration.is_finite() && cfg.duration >= cfg.dt) {
        return Err(AppError::config("Recovery duration must cover at least one sample interval."));
    }
    if !(cfg.pre_test.is_finite() && cfg.pre_test >= 0.0) {
        return Err(AppError::config("Pre-test duration must be non-negative."));
    }
    if !(cfg.displacement.is_finite() && cfg.displacement != 0.0) {
        return Err(AppError::config("Initial displacement must be non-zero."));
    }
    match cfg.model {
        ResponseModel::Exponential { t0 } if !(t0 > 0.0) => {
            return Err(AppError::config(format!("Time lag t0 must be positive (got {t0}).")));
        }
        ResponseModel::Oscillator { cd, mod_factor } if !(cd > 0.0 && mod_factor > 0.0) => {
            return Err(AppError::config("Cd and mod_factor must be positive."));
        }
        _ => {}
    }

    let noise = if cfg.noise_std > 0.0 {
        Some(
            Normal::new(0.0, cfg.noise_std)
                .map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?,
        )
    } else {
        None
    };
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    let n_pre = (cfg.pre_test / cfg.dt).round() as usize;
    let n_rec = (cfg.duration / cfg.dt).floor() as usize + 1;
    let mut time = Vec::with_capacity(n_pre + n_rec);
    let mut head = Vec::with_capacity(n_pre + n_rec);

    for i in 0..n_pre {
        time.push(i as f64 * cfg.dt);
        head.push(cfg.static_level);
    }
    let (model, params) = cfg.model.model_fn();
    let elapsed: Vec<f64> = (0..n_rec).map(|i| i as f64 * cfg.dt).collect();
    for (i, ratio) in model.eval_many(&elapsed, &params).into_iter().enumerate() {
        time.push((n_pre + i) as f64 * cfg.dt);
        head.push(cfg.static_level + cfg.displacement * ratio);
    }

    if let Some(dist) = noise {
        for h in head.iter_mut() {
            *h += dist.sample(&mut rng);
        }
    }

    Ok(SyntheticRecord {
        time,
        head,
        start_index: n_pre,
    })
}
