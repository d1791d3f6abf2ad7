//! Sequential Minimal Optimization (SMO) solver
//!
//! Two-variable SMO for the binary C-SVC dual problem. The working pair is
//! chosen by KKT violation for the first variable and maximum |E_i - E_j|
//! for the second; the analytic step clips against the box constraints.
//! Shrinking, when enabled, drops bound-stuck variables from the active set
//! between full passes and always re-verifies over the full set before
//! declaring convergence.

use crate::cache::KernelCache;
use crate::core::{GksvmError, Result, Sample, SolverConfig};
use crate::kernel::Kernel;
use log::debug;
use std::sync::Arc;

/// Output of one solve: dual variables, bias, and the support-vector set.
#[derive(Debug, Clone)]
pub struct SolveResult {
    /// Lagrange multipliers, one per training sample.
    pub alpha: Vec<f64>,
    /// Bias term b.
    pub b: f64,
    /// Indices of samples with non-zero alpha, ascending.
    pub support_vectors: Vec<usize>,
    /// Outer iterations performed.
    pub iterations: usize,
}

/// SMO solver over an arbitrary kernel seam.
pub struct SmoSolver<K: Kernel> {
    kernel: Arc<K>,
    config: SolverConfig,
}

impl<K: Kernel> SmoSolver<K> {
    pub fn new(kernel: Arc<K>, config: SolverConfig) -> Self {
        Self { kernel, config }
    }

    /// Solve the dual problem for the given samples.
    pub fn solve(&self, samples: &[Sample]) -> Result<SolveResult> {
        if samples.is_empty() {
            return Err(GksvmError::Solver("empty training set".to_string()));
        }
        for sample in samples {
            if sample.label != 1.0 && sample.label != -1.0 {
                return Err(GksvmError::InvalidLabel(sample.label));
            }
        }

        let n = samples.len();
        if n == 1 {
            // Degenerate problem: pin the single sample at the box edge.
            return Ok(SolveResult {
                alpha: vec![self.config.c.min(1.0)],
                b: 0.0,
                support_vectors: vec![0],
                iterations: 1,
            });
        }

        let mut cache = if self.kernel.cacheable() {
            Some(KernelCache::with_memory_limit(self.config.cache_size))
        } else {
            None
        };

        let mut alpha = vec![0.0; n];
        // With all alphas zero the output is zero, so E_i = -y_i.
        let mut errors: Vec<f64> = samples.iter().map(|s| -s.label).collect();

        let mut active: Vec<usize> = (0..n).collect();
        let mut iterations = 0;
        let mut examine_all = true;
        let mut num_changed = 0;
        let mut since_shrink = 0;

        while (num_changed > 0 || examine_all) && iterations < self.config.max_iterations {
            num_changed = 0;

            if examine_all {
                // Full verification pass restores every shrunk variable.
                active = (0..n).collect();
                for i in 0..n {
                    if self.examine(i, samples, &mut alpha, &mut errors, &active, &mut cache)? {
                        num_changed += 1;
                    }
                }
            } else {
                for idx in 0..active.len() {
                    let i = active[idx];
                    if alpha[i] > 0.0
                        && alpha[i] < self.config.c
                        && self.examine(i, samples, &mut alpha, &mut errors, &active, &mut cache)?
                    {
                        num_changed += 1;
                    }
                }

                since_shrink += 1;
                if self.config.shrinking && since_shrink >= self.config.shrinking_interval {
                    let before = active.len();
                    let eps = self.config.epsilon;
                    let c = self.config.c;
                    active.retain(|&i| {
                        let r = errors[i] * samples[i].label;
                        let stuck_low = alpha[i] <= 0.0 && r > eps;
                        let stuck_high = alpha[i] >= c && r < -eps;
                        !(stuck_low || stuck_high)
                    });
                    if active.len() < before {
                        debug!("shrinking: {} -> {} active variables", before, active.len());
                    }
                    since_shrink = 0;
                }
            }

            if examine_all {
                examine_all = false;
            } else if num_changed == 0 {
                examine_all = true;
            }
            iterations += 1;
        }

        let b = self.estimate_bias(&alpha, &errors, samples);
        let support_vectors: Vec<usize> = alpha
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| (a > 1e-12).then_some(i))
            .collect();

        if let Some(cache) = &cache {
            debug!("kernel cache hit rate: {:.3}", cache.hit_rate());
        }
        debug!(
            "solver finished after {} iterations with {} support vectors",
            iterations,
            support_vectors.len()
        );

        Ok(SolveResult {
            alpha,
            b,
            support_vectors,
            iterations,
        })
    }

    fn kernel_value(
        &self,
        cache: &mut Option<KernelCache>,
        samples: &[Sample],
        i: usize,
        j: usize,
    ) -> f64 {
        if let Some(cache) = cache {
            if let Some(value) = cache.get(i, j) {
                return value;
            }
            let value = self.kernel.compute(&samples[i], &samples[j]);
            cache.put(i, j, value);
            value
        } else {
            self.kernel.compute(&samples[i], &samples[j])
        }
    }

    /// Check one example's KKT conditions and, on violation, try a step
    /// with the partner that maximizes |E_i - E_j|.
    fn examine(
        &self,
        i: usize,
        samples: &[Sample],
        alpha: &mut [f64],
        errors: &mut [f64],
        active: &[usize],
        cache: &mut Option<KernelCache>,
    ) -> Result<bool> {
        let y_i = samples[i].label;
        let r_i = errors[i] * y_i;

        let violates = (r_i < -self.config.epsilon && alpha[i] < self.config.c)
            || (r_i > self.config.epsilon && alpha[i] > 0.0);
        if !violates {
            return Ok(false);
        }

        let mut best = None;
        let mut best_gap = 0.0;
        for &j in active {
            if j == i {
                continue;
            }
            let gap = (errors[i] - errors[j]).abs();
            if gap > best_gap {
                best_gap = gap;
                best = Some(j);
            }
        }

        match best {
            Some(j) => self.take_step(i, j, samples, alpha, errors, cache),
            None => Ok(false),
        }
    }

    /// Analytic two-variable update. Returns whether progress was made.
    fn take_step(
        &self,
        i: usize,
        j: usize,
        samples: &[Sample],
        alpha: &mut [f64],
        errors: &mut [f64],
        cache: &mut Option<KernelCache>,
    ) -> Result<bool> {
        if i == j {
            return Ok(false);
        }

        let y_i = samples[i].label;
        let y_j = samples[j].label;
        let alpha_i_old = alpha[i];
        let alpha_j_old = alpha[j];
        let e_i = errors[i];
        let e_j = errors[j];

        let (low, high) = if y_i != y_j {
            let diff = alpha_j_old - alpha_i_old;
            (0.0_f64.max(diff), self.config.c.min(self.config.c + diff))
        } else {
            let sum = alpha_i_old + alpha_j_old;
            (0.0_f64.max(sum - self.config.c), self.config.c.min(sum))
        };
        if low >= high {
            return Ok(false);
        }

        let k_ii = self.kernel_value(cache, samples, i, i);
        let k_jj = self.kernel_value(cache, samples, j, j);
        let k_ij = self.kernel_value(cache, samples, i, j);
        let eta = k_ii + k_jj - 2.0 * k_ij;
        if eta <= 0.0 {
            // Indefinite direction; skip rather than chase the boundary.
            return Ok(false);
        }

        let mut alpha_j_new = alpha_j_old + y_j * (e_i - e_j) / eta;
        alpha_j_new = alpha_j_new.clamp(low, high);

        if (alpha_j_new - alpha_j_old).abs()
            < self.config.epsilon * (alpha_j_new + alpha_j_old + self.config.epsilon)
        {
            return Ok(false);
        }

        let alpha_i_new = alpha_i_old + y_i * y_j * (alpha_j_old - alpha_j_new);
        alpha[i] = alpha_i_new;
        alpha[j] = alpha_j_new;

        let delta_i = y_i * (alpha_i_new - alpha_i_old);
        let delta_j = y_j * (alpha_j_new - alpha_j_old);
        for t in 0..samples.len() {
            let k_it = self.kernel_value(cache, samples, i, t);
            let k_jt = self.kernel_value(cache, samples, j, t);
            errors[t] += delta_i * k_it + delta_j * k_jt;
        }

        Ok(true)
    }

    /// Bias from margin support vectors, falling back to all of them.
    fn estimate_bias(&self, alpha: &[f64], errors: &[f64], samples: &[Sample]) -> f64 {
        let margin: Vec<usize> = (0..samples.len())
            .filter(|&i| {
                alpha[i] > self.config.epsilon && alpha[i] < self.config.c - self.config.epsilon
            })
            .collect();
        let pool: Vec<usize> = if margin.is_empty() {
            (0..samples.len())
                .filter(|&i| alpha[i] > self.config.epsilon)
                .collect()
        } else {
            margin
        };
        if pool.is_empty() {
            return 0.0;
        }
        -pool.iter().map(|&i| errors[i]).sum::<f64>() / pool.len() as f64
    }
}
