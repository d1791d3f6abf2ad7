//! RBF (Radial Basis Function) row kernel
//!
//! K(x, y) = exp(-γ * ||x - y||²) over dense kernel-matrix rows. The gamma
//! parameter controls the kernel width; when the caller leaves it unset the
//! trainer resolves it to 1 / n_train.

use crate::core::Sample;
use crate::kernel::Kernel;

/// RBF kernel: K(x, y) = exp(-γ * ||x - y||²).
#[derive(Debug, Clone, Copy)]
pub struct RbfKernel {
    gamma: f64,
}

impl RbfKernel {
    /// Create an RBF kernel with the given gamma.
    ///
    /// # Panics
    /// Panics if gamma is not positive.
    pub fn new(gamma: f64) -> Self {
        assert!(gamma > 0.0, "gamma must be positive, got: {gamma}");
        Self { gamma }
    }

    /// gamma = 1 / n_features, the libsvm-style default.
    pub fn with_auto_gamma(n_features: usize) -> Self {
        assert!(n_features > 0, "feature count must be positive");
        Self::new(1.0 / n_features as f64)
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Kernel for RbfKernel {
    fn compute(&self, x: &Sample, y: &Sample) -> f64 {
        (-self.gamma * squared_distance(&x.row, &y.row)).exp()
    }
}

fn squared_distance(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter()
        .zip(y)
        .map(|(&a, &b)| {
            let diff = a - b;
            diff * diff
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(row: Vec<f64>) -> Sample {
        Sample::new(0, row, 1.0)
    }

    #[test]
    fn test_rbf_identical_rows_give_one() {
        let kernel = RbfKernel::new(0.5);
        let x = sample(vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(kernel.compute(&x, &x), 1.0);
    }

    #[test]
    fn test_rbf_distance_decay() {
        let kernel = RbfKernel::new(1.0);
        let x = sample(vec![0.0, 0.0]);
        let near = sample(vec![0.1, 0.0]);
        let far = sample(vec![2.0, 0.0]);
        assert!(kernel.compute(&x, &near) > kernel.compute(&x, &far));
        assert_relative_eq!(kernel.compute(&x, &far), (-4.0f64).exp());
    }

    #[test]
    fn test_auto_gamma() {
        let kernel = RbfKernel::with_auto_gamma(4);
        assert_relative_eq!(kernel.gamma(), 0.25);
    }

    #[test]
    #[should_panic(expected = "gamma must be positive")]
    fn test_rbf_rejects_non_positive_gamma() {
        RbfKernel::new(0.0);
    }
}
