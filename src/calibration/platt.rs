//! Platt scaling (sigmoid calibration)

use crate::error::{ScreeningError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Platt scaling calibrator
///
/// Fits a sigmoid on raw decision scores: P(y=1|f) = 1 / (1 + exp(-(A*f + B)))
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    /// Slope parameter A
    a: Option<f64>,
    /// Intercept parameter B
    b: Option<f64>,
    /// Maximum Newton iterations
    max_iter: usize,
    /// Convergence tolerance on the gradient
    tol: f64,
}

impl PlattScaling {
    pub fn new() -> Self {
        Self {
            a: None,
            b: None,
            max_iter: 100,
            tol: 1e-5,
        }
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Get fitted parameters
    pub fn parameters(&self) -> Option<(f64, f64)> {
        match (self.a, self.b) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }

    fn sigmoid(z: f64) -> f64 {
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let e = z.exp();
            e / (1.0 + e)
        }
    }

    /// ln(1 + e^z) without overflow
    fn softplus(z: f64) -> f64 {
        if z > 0.0 {
            z + (-z).exp().ln_1p()
        } else {
            z.exp().ln_1p()
        }
    }

    fn neg_log_likelihood(scores: &Array1<f64>, targets: &[f64], a: f64, b: f64) -> f64 {
        scores
            .iter()
            .zip(targets.iter())
            .map(|(&f, &t)| {
                let z = a * f + b;
                t * Self::softplus(-z) + (1.0 - t) * Self::softplus(z)
            })
            .sum()
    }

    /// Fit on decision scores and 0/1 labels
    pub fn fit(&mut self, scores: &Array1<f64>, labels: &Array1<f64>) -> Result<()> {
        let n = scores.len();
        if n != labels.len() {
            return Err(ScreeningError::InvalidInput(
                "Scores and labels must have same length".to_string(),
            ));
        }
        if n == 0 {
            return Err(ScreeningError::InvalidInput("Empty input".to_string()));
        }

        // Target values with Platt's adjustment against overfitting
        let n_pos = labels.iter().filter(|&&y| y > 0.5).count() as f64;
        let n_neg = n as f64 - n_pos;
        let target_pos = (n_pos + 1.0) / (n_pos + 2.0);
        let target_neg = 1.0 / (n_neg + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|&y| if y > 0.5 { target_pos } else { target_neg })
            .collect();

        let mut a = 0.0;
        let mut b = ((n_pos + 1.0) / (n_neg + 1.0)).ln();
        let mut loss = Self::neg_log_likelihood(scores, &targets, a, b);

        for _ in 0..self.max_iter {
            let mut grad_a = 0.0;
            let mut grad_b = 0.0;
            let mut hess_aa = 1e-12;
            let mut hess_ab = 0.0;
            let mut hess_bb = 1e-12;

            for (&f, &t) in scores.iter().zip(targets.iter()) {
                let p = Self::sigmoid(a * f + b);
                let d1 = p - t;
                let d2 = p * (1.0 - p);

                grad_a += f * d1;
                grad_b += d1;
                hess_aa += f * f * d2;
                hess_ab += f * d2;
                hess_bb += d2;
            }

            if grad_a.abs() < self.tol && grad_b.abs() < self.tol {
                break;
            }

            // Solve the 2x2 Newton system using Cramer's rule
            let det = hess_aa * hess_bb - hess_ab * hess_ab;
            if det.abs() < 1e-15 {
                break;
            }
            let delta_a = (hess_bb * grad_a - hess_ab * grad_b) / det;
            let delta_b = (hess_aa * grad_b - hess_ab * grad_a) / det;
            let descent = grad_a * delta_a + grad_b * delta_b;

            // Backtracking line search
            let mut step = 1.0;
            let mut accepted = false;
            while step >= 1e-10 {
                let new_a = a - step * delta_a;
                let new_b = b - step * delta_b;
                let new_loss = Self::neg_log_likelihood(scores, &targets, new_a, new_b);
                if new_loss <= loss - 1e-4 * step * descent {
                    a = new_a;
                    b = new_b;
                    loss = new_loss;
                    accepted = true;
                    break;
                }
                step /= 2.0;
            }

            if !accepted {
                break;
            }
        }

        self.a = Some(a);
        self.b = Some(b);
        Ok(())
    }

    /// Probability of the positive class for one decision score
    pub fn probability(&self, score: f64) -> Result<f64> {
        let (a, b) = self.parameters().ok_or_else(|| {
            ScreeningError::InvalidInput("Calibrator not fitted".to_string())
        })?;
        Ok(Self::sigmoid(a * score + b))
    }

    /// Calibrate a batch of decision scores
    pub fn calibrate(&self, scores: &Array1<f64>) -> Result<Array1<f64>> {
        scores.iter().map(|&s| self.probability(s)).collect()
    }
}

impl Default for PlattScaling {
    fn default() -> Self {
        Self::new()
    }
}
