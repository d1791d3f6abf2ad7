//! Sigmoid calibration of decision values (Platt scaling)
//!
//! Fits `p(+1 | f) = 1 / (1 + exp(a * f + b))` on training decision values
//! by Newton iteration with backtracking, using the smoothed targets from
//! Platt's original formulation so the fit stays finite on separable data.

use serde::{Deserialize, Serialize};

/// Fitted sigmoid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sigmoid {
    pub a: f64,
    pub b: f64,
}

impl Sigmoid {
    /// Probability of the +1 class for decision value `f`.
    pub fn predict(&self, f: f64) -> f64 {
        let t = self.a * f + self.b;
        // Evaluate the stable branch to avoid overflow in exp.
        if t >= 0.0 {
            (-t).exp() / (1.0 + (-t).exp())
        } else {
            1.0 / (1.0 + t.exp())
        }
    }
}

/// Fit the sigmoid on training decision values and their ±1 labels.
pub fn fit_sigmoid(decisions: &[f64], labels: &[f64]) -> Sigmoid {
    debug_assert_eq!(decisions.len(), labels.len());
    let n = decisions.len();

    let num_pos = labels.iter().filter(|&&y| y > 0.0).count() as f64;
    let num_neg = n as f64 - num_pos;

    // Smoothed targets keep the log-likelihood finite even when the
    // training data is perfectly separated.
    let hi = (num_pos + 1.0) / (num_pos + 2.0);
    let lo = 1.0 / (num_neg + 2.0);
    let targets: Vec<f64> = labels
        .iter()
        .map(|&y| if y > 0.0 { hi } else { lo })
        .collect();

    let mut a = 0.0;
    let mut b = ((num_neg + 1.0) / (num_pos + 1.0)).ln();

    let min_step = 1e-10;
    let sigma = 1e-12;
    let mut fval = objective(decisions, &targets, a, b);

    for _ in 0..100 {
        // Gradient and Hessian of the negative log-likelihood.
        let (mut h11, mut h22, mut h21) = (sigma, sigma, 0.0);
        let (mut g1, mut g2) = (0.0, 0.0);
        for (&f, &t) in decisions.iter().zip(&targets) {
            let fab = a * f + b;
            let (p, q) = if fab >= 0.0 {
                let e = (-fab).exp();
                (e / (1.0 + e), 1.0 / (1.0 + e))
            } else {
                let e = fab.exp();
                (1.0 / (1.0 + e), e / (1.0 + e))
            };
            let d2 = p * q;
            h11 += f * f * d2;
            h22 += d2;
            h21 += f * d2;
            let d1 = t - p;
            g1 += f * d1;
            g2 += d1;
        }

        if g1.abs() < 1e-5 && g2.abs() < 1e-5 {
            break;
        }

        // Newton direction from the 2x2 system.
        let det = h11 * h22 - h21 * h21;
        let da = -(h22 * g1 - h21 * g2) / det;
        let db = -(h11 * g2 - h21 * g1) / det;
        let grad_dot_dir = g1 * da + g2 * db;

        // Backtracking line search.
        let mut step = 1.0;
        while step >= min_step {
            let new_a = a + step * da;
            let new_b = b + step * db;
            let new_f = objective(decisions, &targets, new_a, new_b);
            if new_f < fval + 1e-4 * step * grad_dot_dir {
                a = new_a;
                b = new_b;
                fval = new_f;
                break;
            }
            step /= 2.0;
        }
        if step < min_step {
            break;
        }
    }

    Sigmoid { a, b }
}

fn objective(decisions: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    decisions
        .iter()
        .zip(targets)
        .map(|(&f, &t)| {
            let fab = a * f + b;
            if fab >= 0.0 {
                t * fab + (1.0 + (-fab).exp()).ln()
            } else {
                (t - 1.0) * fab + (1.0 + fab.exp()).ln()
            }
        })
        .sum()
}
