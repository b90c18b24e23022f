//! Model functions with an explicit parameter list.
//!
//! The fitter never inspects a callable to find out how many parameters it
//! takes. Every model is declared together with its parameter names, and the
//! arity is the length of that list.

use std::fmt;
use std::sync::Arc;

type Eval = dyn Fn(f64, &[f64]) -> f64 + Send + Sync;

/// A scalar model `y = f(x; params)`.
///
/// Cheap to clone; the closure is shared.
#[derive(Clone)]
pub struct ModelFn {
    name: &'static str,
    param_names: &'static [&'static str],
    eval: Arc<Eval>,
}

impl ModelFn {
    pub fn new<F>(name: &'static str, param_names: &'static [&'static str], f: F) -> Self
    where
        F: Fn(f64, &[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            name,
            param_names,
            eval: Arc::new(f),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn param_names(&self) -> &'static [&'static str] {
        self.param_names
    }

    pub fn arity(&self) -> usize {
        self.param_names.len()
    }

    /// Evaluate at one point.
    ///
    /// Callers are responsible for passing `arity()` parameters.
    pub fn eval(&self, x: f64, params: &[f64]) -> f64 {
        (self.eval)(x, params)
    }

    pub fn eval_many(&self, x: &[f64], params: &[f64]) -> Vec<f64> {
        x.iter().map(|&v| self.eval(v, params)).collect()
    }
}

impl fmt::Debug for ModelFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFn")
            .field("name", &self.name)
            .field("param_names", &self.param_names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_comes_from_declared_names() {
        let m = ModelFn::new("affine", &["a", "b"], |x, p| p[0] + p[1] * x);
        assert_eq!(m.arity(), 2);
        assert_eq!(m.eval(2.0, &[1.0, 3.0]), 7.0);
        assert_eq!(m.eval_many(&[0.0, 1.0], &[1.0, 3.0]), vec![1.0, 4.0]);
        assert!(format!("{m:?}").contains("affine"));
    }
}
