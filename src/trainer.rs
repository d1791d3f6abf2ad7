//! Model Trainer: adapter between the kernel matrix and the SMO solver
//!
//! Slices the train×train block of the precomputed matrix, shapes it into
//! solver samples for the configured kernel family, runs the solver, and
//! assembles the immutable [`Model`]. The kernel matrix itself is never
//! mutated here.

use crate::core::{GksvmConfig, KernelSpec, Result, Sample, SolverConfig};
use crate::kernel::{Kernel, LinearKernel, PrecomputedKernel, RbfKernel, TriMatrix};
use crate::solver::{fit_sigmoid, Sigmoid, SmoSolver};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Trained maximum-margin classifier. Produced once, immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Support-vector indices relative to the train block, ascending.
    pub sv_indices: Vec<usize>,
    /// Dual coefficient `alpha_i * y_i` per support vector.
    pub sv_coef: Vec<f64>,
    /// Bias term of the decision function.
    pub bias: f64,
    /// Two-class label ordering; the +1 slot is found by scanning, never
    /// assumed to be slot 0.
    pub labels: [i32; 2],
    /// Kernel family, with RBF gamma resolved to its concrete value.
    pub kernel: KernelSpec,
    /// Sigmoid calibration, present when probability estimation was on.
    pub sigmoid: Option<Sigmoid>,
    /// Size of the train block the model was fitted on.
    pub n_train: usize,
}

impl Model {
    pub fn n_support_vectors(&self) -> usize {
        self.sv_indices.len()
    }

    /// Slot of class +1 in the label-ordering array.
    pub fn positive_slot(&self) -> usize {
        self.labels
            .iter()
            .position(|&l| l == 1)
            .expect("model labels always contain +1")
    }

    /// Decision value for arena id `x` under the precomputed kernel.
    pub fn decision_precomputed(&self, matrix: &TriMatrix, x: usize) -> f64 {
        self.sv_indices
            .iter()
            .zip(&self.sv_coef)
            .map(|(&sv, &coef)| coef * matrix.value(sv, x))
            .sum::<f64>()
            + self.bias
    }

    /// Decision value for a dense row over train columns under a row
    /// kernel. `sv_rows` are the support vectors' own rows, in
    /// `sv_indices` order.
    pub fn decision_row(&self, sv_rows: &[Vec<f64>], x_row: &[f64]) -> f64 {
        let x = Sample::new(0, x_row.to_vec(), 0.0);
        let acc: f64 = match self.kernel {
            KernelSpec::Linear => {
                let kernel = LinearKernel::new();
                sv_rows
                    .iter()
                    .zip(&self.sv_coef)
                    .map(|(row, &coef)| {
                        coef * kernel.compute(&Sample::new(0, row.clone(), 0.0), &x)
                    })
                    .sum()
            }
            KernelSpec::Rbf { gamma } => {
                let kernel = RbfKernel::new(gamma.expect("gamma resolved at training time"));
                sv_rows
                    .iter()
                    .zip(&self.sv_coef)
                    .map(|(row, &coef)| {
                        coef * kernel.compute(&Sample::new(0, row.clone(), 0.0), &x)
                    })
                    .sum()
            }
            KernelSpec::ExactKmer => unreachable!("row decision on the precomputed kernel"),
        };
        acc + self.bias
    }
}

/// Fit a model on the train×train block of the matrix.
pub fn train_model(
    matrix: &Arc<TriMatrix>,
    train_labels: &[i32],
    config: &GksvmConfig,
) -> Result<Model> {
    let n_train = train_labels.len();

    // Resolve the RBF width now so the model carries a concrete value.
    let kernel = match config.kernel {
        KernelSpec::Rbf { gamma } => KernelSpec::Rbf {
            gamma: Some(gamma.unwrap_or(1.0 / n_train as f64)),
        },
        other => other,
    };

    let samples: Vec<Sample> = (0..n_train)
        .map(|i| {
            let row = match kernel {
                KernelSpec::ExactKmer => Vec::new(),
                _ => matrix.row(i, n_train),
            };
            Sample::new(i, row, train_labels[i] as f64)
        })
        .collect();

    let solver_config = SolverConfig::from_config(config);
    let result = match kernel {
        KernelSpec::ExactKmer => {
            let lookup = PrecomputedKernel::new(Arc::clone(matrix));
            SmoSolver::new(Arc::new(lookup), solver_config).solve(&samples)?
        }
        KernelSpec::Linear => {
            SmoSolver::new(Arc::new(LinearKernel::new()), solver_config).solve(&samples)?
        }
        KernelSpec::Rbf { gamma } => {
            let rbf = RbfKernel::new(gamma.expect("resolved above"));
            SmoSolver::new(Arc::new(rbf), solver_config).solve(&samples)?
        }
    };

    let sv_indices = result.support_vectors;
    let sv_coef: Vec<f64> = sv_indices
        .iter()
        .map(|&i| result.alpha[i] * samples[i].label)
        .collect();

    // Class ordering follows first appearance in the training labels.
    let first = train_labels.first().copied().unwrap_or(1);
    let labels = [first, -first];

    let mut model = Model {
        sv_indices,
        sv_coef,
        bias: result.b,
        labels,
        kernel,
        sigmoid: None,
        n_train,
    };

    if config.probability {
        let sv_rows: Vec<Vec<f64>> = match kernel {
            KernelSpec::ExactKmer => Vec::new(),
            _ => model
                .sv_indices
                .iter()
                .map(|&sv| matrix.row(sv, n_train))
                .collect(),
        };
        let decisions: Vec<f64> = (0..n_train)
            .map(|i| match kernel {
                KernelSpec::ExactKmer => model.decision_precomputed(matrix, i),
                _ => model.decision_row(&sv_rows, &samples[i].row),
            })
            .collect();
        let label_values: Vec<f64> = train_labels.iter().map(|&l| l as f64).collect();
        model.sigmoid = Some(fit_sigmoid(&decisions, &label_values));
    }

    info!(
        "trained {} model: {} support vectors, bias {:.6}",
        model.kernel.name(),
        model.n_support_vectors(),
        model.bias
    );
    Ok(model)
}
