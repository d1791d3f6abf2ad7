//! Predictor/Evaluator over the train×test block
//!
//! Scores every test sequence against the trained model, aggregates
//! accuracy, false positive/negative counts and the pairwise-rank AUC, and
//! writes the predicted labels in original test order.

use crate::core::{KernelSpec, Prediction, PredictionReport, Result};
use crate::kernel::TriMatrix;
use crate::trainer::Model;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Score the test block and build the report.
///
/// For the precomputed kernel only the entries at support-vector columns
/// are populated per test row; the row kernels need the full dense row.
pub fn evaluate(matrix: &TriMatrix, model: &Model, test_labels: &[i32]) -> PredictionReport {
    let n_train = model.n_train;
    let n_test = test_labels.len();
    info!("predicting labels for {} sequences", n_test);

    let sv_rows: Vec<Vec<f64>> = match model.kernel {
        KernelSpec::ExactKmer => Vec::new(),
        _ => model
            .sv_indices
            .iter()
            .map(|&sv| matrix.row(sv, n_train))
            .collect(),
    };

    let slot = model.positive_slot();
    let mut predictions = Vec::with_capacity(n_test);
    let mut pos_scores = Vec::new();
    let mut neg_scores = Vec::new();
    let mut correct = 0;
    let mut false_positives = 0;
    let mut false_negatives = 0;

    for (t, &truth) in test_labels.iter().enumerate() {
        let x_id = n_train + t;
        let decision = match model.kernel {
            KernelSpec::ExactKmer => {
                let mut row = vec![0.0; n_train];
                for &sv in &model.sv_indices {
                    row[sv] = matrix.value(sv, x_id);
                }
                model
                    .sv_indices
                    .iter()
                    .zip(&model.sv_coef)
                    .map(|(&sv, &coef)| coef * row[sv])
                    .sum::<f64>()
                    + model.bias
            }
            _ => model.decision_row(&sv_rows, &matrix.row(x_id, n_train)),
        };

        let guess = if decision > 0.0 {
            1
        } else if decision < 0.0 {
            -1
        } else {
            0
        };

        let p_plus = match &model.sigmoid {
            Some(sigmoid) => sigmoid.predict(decision),
            // Uncalibrated fallback keeps the ranking defined.
            None => 1.0 / (1.0 + (-decision).exp()),
        };
        let mut pair = [0.0; 2];
        pair[slot] = p_plus;
        pair[1 - slot] = 1.0 - p_plus;
        let probability = pair[slot];

        if truth > 0 {
            pos_scores.push(probability);
            if guess < 0 {
                false_negatives += 1;
            }
        } else {
            neg_scores.push(probability);
            if guess > 0 {
                false_positives += 1;
            }
        }
        if (decision < 0.0 && truth < 0) || (decision > 0.0 && truth > 0) {
            correct += 1;
        }

        predictions.push(Prediction::new(guess, decision, probability));
    }

    let accuracy = if n_test == 0 {
        0.0
    } else {
        correct as f64 / n_test as f64
    };
    let auc = pairwise_auc(&pos_scores, &neg_scores);

    PredictionReport {
        predictions,
        accuracy,
        auc,
        false_positives,
        false_negatives,
        num_positive: pos_scores.len(),
        num_negative: neg_scores.len(),
    }
}

/// AUC by pairwise rank comparison: the fraction of (positive, negative)
/// score pairs where the positive score is higher, ties counting one-half.
/// An empty side yields the neutral 0.5.
pub fn pairwise_auc(pos: &[f64], neg: &[f64]) -> f64 {
    if pos.is_empty() || neg.is_empty() {
        return 0.5;
    }
    let mut favorable = 0.0;
    for &p in pos {
        for &q in neg {
            if p > q {
                favorable += 1.0;
            } else if p == q {
                favorable += 0.5;
            }
        }
    }
    favorable / (pos.len() * neg.len()) as f64
}

/// Write one integer label per line, in original test-sequence order.
pub fn write_labels<P: AsRef<Path>>(report: &PredictionReport, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for prediction in &report.predictions {
        writeln!(writer, "{}", prediction.label)?;
    }
    writer.flush()?;
    Ok(())
}
