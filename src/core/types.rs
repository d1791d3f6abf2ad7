//! Core type definitions for the gapped k-mer SVM

use crate::core::{GksvmError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kernel family used by the trainer and predictor.
///
/// `ExactKmer` reads values straight out of the precomputed gapped k-mer
/// matrix; `Linear` and `Rbf` treat the dense train-block rows of that matrix
/// as feature vectors and evaluate a row kernel on top of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KernelSpec {
    /// Gapped k-mer counts, looked up from the shared triangular matrix.
    ExactKmer,
    /// Dot product between kernel-matrix rows.
    Linear,
    /// Gaussian kernel between kernel-matrix rows. `gamma = None` resolves
    /// to `1 / n_train` at training time.
    Rbf { gamma: Option<f64> },
}

impl KernelSpec {
    /// Wire name, matching the construction-parameter strings.
    pub fn name(&self) -> &'static str {
        match self {
            KernelSpec::ExactKmer => "gakco",
            KernelSpec::Linear => "linear",
            KernelSpec::Rbf { .. } => "rbf",
        }
    }

    /// Row-kernel types size their working structures over train+test rows
    /// and therefore need the test corpus before the matrix is built.
    pub fn requires_test_corpus(&self) -> bool {
        matches!(self, KernelSpec::Linear | KernelSpec::Rbf { .. })
    }
}

impl FromStr for KernelSpec {
    type Err = GksvmError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gakco" => Ok(KernelSpec::ExactKmer),
            "linear" => Ok(KernelSpec::Linear),
            "rbf" => Ok(KernelSpec::Rbf { gamma: None }),
            other => Err(GksvmError::UnknownKernel(other.to_string())),
        }
    }
}

/// Immutable pipeline configuration, validated at construction and passed by
/// reference into each stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GksvmConfig {
    /// Window length of each extracted g-mer.
    pub g: usize,
    /// Number of don't-care positions per window.
    pub m: usize,
    /// Regularization parameter C.
    pub c: f64,
    /// nu parameter, carried for solver-contract compatibility.
    pub nu: f64,
    /// Solver tolerance.
    pub eps: f64,
    /// Kernel family.
    pub kernel: KernelSpec,
    /// Enable the solver's shrinking heuristic.
    pub shrinking: bool,
    /// Fit sigmoid calibration so predictions carry class probabilities.
    pub probability: bool,
    /// Worker threads for kernel accumulation; 0 means all available cores.
    pub num_threads: usize,
    /// Lock shards over the flat triangular index space.
    pub num_shards: usize,
    /// Row-kernel LRU cache size in bytes.
    pub cache_size: usize,
    /// Iteration cap for the solver's outer loop.
    pub max_iterations: usize,
    /// Suppress diagnostic output.
    pub quiet: bool,
}

impl GksvmConfig {
    /// Create a configuration for the given window length and mismatch
    /// budget, with all other parameters at their defaults.
    pub fn new(g: usize, m: usize) -> Result<Self> {
        if g < 1 {
            return Err(GksvmError::InvalidParameter(format!(
                "g must be at least 1, got {g}"
            )));
        }
        if m >= g {
            return Err(GksvmError::InvalidParameter(format!(
                "m must be smaller than g, got g = {g}, m = {m}"
            )));
        }
        Ok(Self {
            g,
            m,
            c: 1.0,
            nu: 0.5,
            eps: 0.001,
            kernel: KernelSpec::Linear,
            shrinking: true,
            probability: true,
            num_threads: 0,
            num_shards: 128,
            cache_size: 100_000_000,
            max_iterations: 10_000,
            quiet: false,
        })
    }

    /// Informative positions per window.
    pub fn k(&self) -> usize {
        self.g - self.m
    }

    /// Effective worker count once `0` has been resolved.
    pub fn effective_threads(&self) -> usize {
        if self.num_threads > 0 {
            self.num_threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

/// One training or test instance as the solver sees it: the arena id (for
/// precomputed lookups), the dense kernel-matrix row over train columns (for
/// row kernels), and the ±1 label.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Merged arena id of the underlying sequence.
    pub id: usize,
    /// Kernel-matrix row restricted to train columns; empty on the
    /// precomputed path, which never reads it.
    pub row: Vec<f64>,
    /// Class label (+1 or -1; 0 for unlabeled prediction inputs).
    pub label: f64,
}

impl Sample {
    pub fn new(id: usize, row: Vec<f64>, label: f64) -> Self {
        Self { id, row, label }
    }
}

/// Per-test-sequence prediction outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (+1 or -1; 0 never matches the true label).
    pub label: i32,
    /// Raw decision function value.
    pub decision_value: f64,
    /// Probability of the +1 class.
    pub probability: f64,
}

impl Prediction {
    pub fn new(label: i32, decision_value: f64, probability: f64) -> Self {
        Self {
            label,
            decision_value,
            probability,
        }
    }
}

/// Aggregate evaluation over the test block, written once by the predictor.
#[derive(Debug, Clone)]
pub struct PredictionReport {
    /// Per-test predictions in original test-sequence order.
    pub predictions: Vec<Prediction>,
    /// Fraction of test sequences whose predicted label matched.
    pub accuracy: f64,
    /// Pairwise-rank AUC over positive/negative probability scores.
    pub auc: f64,
    /// Negative-labelled sequences predicted positive.
    pub false_positives: usize,
    /// Positive-labelled sequences predicted negative.
    pub false_negatives: usize,
    /// Test sequences with true label +1.
    pub num_positive: usize,
    /// Test sequences with true label -1.
    pub num_negative: usize,
}

impl PredictionReport {
    /// Fraction of the test block carrying the positive label.
    pub fn percent_positive(&self) -> f64 {
        let total = self.num_positive + self.num_negative;
        if total == 0 {
            0.0
        } else {
            self.num_positive as f64 / total as f64
        }
    }
}

/// Configuration for the embedded SMO solver.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Upper bound for the dual variables.
    pub c: f64,
    /// Tolerance for KKT conditions.
    pub epsilon: f64,
    /// Maximum number of outer iterations.
    pub max_iterations: usize,
    /// Kernel cache size in bytes (row kernels only).
    pub cache_size: usize,
    /// Enable shrinking of bound-stuck variables.
    pub shrinking: bool,
    /// Outer iterations between shrinking sweeps.
    pub shrinking_interval: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 0.001,
            max_iterations: 10_000,
            cache_size: 100_000_000,
            shrinking: true,
            shrinking_interval: 100,
        }
    }
}

impl SolverConfig {
    /// Derive the solver configuration from the pipeline configuration.
    pub fn from_config(config: &GksvmConfig) -> Self {
        Self {
            c: config.c,
            epsilon: config.eps,
            max_iterations: config.max_iterations,
            cache_size: config.cache_size,
            shrinking: config.shrinking,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_spec_parse() {
        assert_eq!("gakco".parse::<KernelSpec>().unwrap(), KernelSpec::ExactKmer);
        assert_eq!("linear".parse::<KernelSpec>().unwrap(), KernelSpec::Linear);
        assert_eq!(
            "rbf".parse::<KernelSpec>().unwrap(),
            KernelSpec::Rbf { gamma: None }
        );
    }

    #[test]
    fn test_kernel_spec_unknown_is_fatal() {
        let err = "polynomial".parse::<KernelSpec>().unwrap_err();
        assert!(matches!(err, GksvmError::UnknownKernel(name) if name == "polynomial"));
    }

    #[test]
    fn test_kernel_spec_test_corpus_requirement() {
        assert!(!KernelSpec::ExactKmer.requires_test_corpus());
        assert!(KernelSpec::Linear.requires_test_corpus());
        assert!(KernelSpec::Rbf { gamma: None }.requires_test_corpus());
    }

    #[test]
    fn test_config_defaults() {
        let config = GksvmConfig::new(7, 2).unwrap();
        assert_eq!(config.k(), 5);
        assert_eq!(config.c, 1.0);
        assert_eq!(config.nu, 0.5);
        assert_eq!(config.eps, 0.001);
        assert_eq!(config.kernel, KernelSpec::Linear);
        assert!(config.shrinking);
        assert!(config.probability);
        assert_eq!(config.num_shards, 128);
    }

    #[test]
    fn test_config_rejects_bad_mismatch_budget() {
        assert!(GksvmConfig::new(3, 3).is_err());
        assert!(GksvmConfig::new(3, 7).is_err());
        assert!(GksvmConfig::new(0, 0).is_err());
        assert!(GksvmConfig::new(1, 0).is_ok());
    }

    #[test]
    fn test_effective_threads_resolves_zero() {
        let mut config = GksvmConfig::new(4, 1).unwrap();
        assert!(config.effective_threads() >= 1);
        config.num_threads = 3;
        assert_eq!(config.effective_threads(), 3);
    }

    #[test]
    fn test_prediction_report_percent_positive() {
        let report = PredictionReport {
            predictions: Vec::new(),
            accuracy: 0.0,
            auc: 0.5,
            false_positives: 0,
            false_negatives: 0,
            num_positive: 3,
            num_negative: 1,
        };
        assert_eq!(report.percent_positive(), 0.75);
    }

    #[test]
    fn test_solver_config_from_pipeline_config() {
        let mut config = GksvmConfig::new(5, 1).unwrap();
        config.c = 10.0;
        config.eps = 0.01;
        config.shrinking = false;
        let solver = SolverConfig::from_config(&config);
        assert_eq!(solver.c, 10.0);
        assert_eq!(solver.epsilon, 0.01);
        assert!(!solver.shrinking);
        assert_eq!(solver.shrinking_interval, 100);
    }
}
