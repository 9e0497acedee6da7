//! Support Vector Machine classifier
//!
//! Binary SVC trained with SMO (Sequential Minimal Optimization). Class
//! probabilities come from Platt scaling fitted on out-of-fold decision values.

use crate::calibration::PlattScaling;
use crate::error::{ScreeningError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum number of samples for eager kernel matrix computation.
/// Beyond this, training will return an error to prevent OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Kernel width for the RBF kernel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gamma {
    /// 1 / (n_features * Var(X)), Var over every element of the training matrix
    Scale,
    /// 1 / n_features
    Auto,
    /// Explicit value
    Value(f64),
}

/// Kernel function type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// Linear kernel: K(x, y) = x · y
    Linear,
    /// Radial Basis Function (Gaussian): K(x, y) = exp(-γ * ||x - y||²)
    RBF { gamma: Gamma },
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::RBF { gamma: Gamma::Scale }
    }
}

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// Kernel function
    pub kernel: KernelType,
    /// Tolerance for stopping criterion
    pub tol: f64,
    /// Maximum number of sweeps over the training set
    pub max_iter: usize,
    /// Random seed
    pub random_state: Option<u64>,
    /// Fit a Platt calibrator so `predict_proba` is available
    pub probability: bool,
    /// Folds used to collect out-of-fold scores for calibration
    pub calibration_folds: usize,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::default(),
            tol: 1e-3,
            max_iter: 1000,
            random_state: Some(42),
            probability: true,
            calibration_folds: 5,
        }
    }
}

/// Support vectors and coefficients of one trained binary machine
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinarySVM {
    support_vectors: Array2<f64>,
    alphas: Array1<f64>,
    support_labels: Array1<f64>,
    bias: f64,
}

/// Support Vector Classifier for 0/1 labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMClassifier {
    config: SVMConfig,
    machine: Option<BinarySVM>,
    /// Gamma resolved against the training data
    gamma: f64,
    calibrator: Option<PlattScaling>,
    n_features: usize,
    is_fitted: bool,
}

impl SVMClassifier {
    /// Create a new SVM classifier
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            machine: None,
            gamma: 1.0,
            calibrator: None,
            n_features: 0,
            is_fitted: false,
        }
    }

    /// Fit on a scaled matrix and 0/1 labels
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(ScreeningError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if let Some((i, v)) = y.iter().enumerate().find(|(_, &v)| v != 0.0 && v != 1.0) {
            return Err(ScreeningError::InvalidInput(format!(
                "SVM classifier requires 0/1 labels, but sample {} has label {}",
                i, v
            )));
        }
        let n_pos = y.iter().filter(|&&v| v == 1.0).count();
        if n_pos == 0 || n_pos == y.len() {
            return Err(ScreeningError::InvalidInput(
                "SVM requires both classes in the training labels".to_string(),
            ));
        }

        self.n_features = x.ncols();
        self.gamma = self.resolve_gamma(x);

        let y_signed = y.mapv(|v| if v == 1.0 { 1.0 } else { -1.0 });
        let seed = self.config.random_state;
        self.machine = Some(self.train_machine(x, &y_signed, seed)?);

        self.calibrator = if self.config.probability {
            let scores = self.out_of_fold_scores(x, &y_signed)?;
            let mut platt = PlattScaling::new();
            platt.fit(&scores, y)?;
            Some(platt)
        } else {
            None
        };

        self.is_fitted = true;
        Ok(())
    }

    fn resolve_gamma(&self, x: &Array2<f64>) -> f64 {
        let n_features = x.ncols().max(1) as f64;
        match self.config.kernel {
            KernelType::Linear => 1.0,
            KernelType::RBF { gamma: Gamma::Value(g) } => g,
            KernelType::RBF { gamma: Gamma::Auto } => 1.0 / n_features,
            KernelType::RBF { gamma: Gamma::Scale } => {
                let var = x.var(0.0);
                if var > 0.0 {
                    1.0 / (n_features * var)
                } else {
                    1.0
                }
            }
        }
    }

    fn train_machine(&self, x: &Array2<f64>, y: &Array1<f64>, seed: Option<u64>) -> Result<BinarySVM> {
        let (alphas, bias, support_indices) = self.smo_train(x, y, seed)?;

        let sv_count = support_indices.len();
        let mut support_vectors = Array2::zeros((sv_count, x.ncols()));
        let mut support_labels = Array1::zeros(sv_count);
        let mut support_alphas = Array1::zeros(sv_count);

        for (i, &idx) in support_indices.iter().enumerate() {
            support_vectors.row_mut(i).assign(&x.row(idx));
            support_labels[i] = y[idx];
            support_alphas[i] = alphas[idx];
        }

        Ok(BinarySVM {
            support_vectors,
            alphas: support_alphas,
            support_labels,
            bias,
        })
    }

    /// Decision values for every training row, each produced by a machine
    /// that did not see the row. Falls back to in-sample values when a class
    /// is too small to spread over the folds.
    fn out_of_fold_scores(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.config.calibration_folds;
        let n_pos = y.iter().filter(|&&v| v > 0.0).count();
        let n_neg = y.len() - n_pos;

        let machine = self.machine.as_ref().ok_or(ScreeningError::ModelNotFitted)?;
        if k < 2 || n_pos < k || n_neg < k {
            return Ok(self.score_matrix(machine, x));
        }

        let folds = self.stratified_folds(y, k);
        let fold_scores: Vec<(Vec<usize>, Array1<f64>)> = folds
            .par_iter()
            .enumerate()
            .map(|(fold_idx, test_idx)| {
                let train_idx: Vec<usize> = (0..y.len()).filter(|i| !test_idx.contains(i)).collect();
                let x_train = x.select(Axis(0), &train_idx);
                let y_train: Array1<f64> = train_idx.iter().map(|&i| y[i]).collect();
                let seed = self.config.random_state.map(|s| s.wrapping_add(fold_idx as u64 + 1));

                let fold_machine = self.train_machine(&x_train, &y_train, seed)?;
                let x_test = x.select(Axis(0), test_idx);
                Ok((test_idx.clone(), self.score_matrix(&fold_machine, &x_test)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut scores = Array1::zeros(y.len());
        for (indices, values) in fold_scores {
            for (&i, &v) in indices.iter().zip(values.iter()) {
                scores[i] = v;
            }
        }
        Ok(scores)
    }

    /// Deal each class's shuffled rows round-robin over `k` folds
    fn stratified_folds(&self, y: &Array1<f64>, k: usize) -> Vec<Vec<usize>> {
        let mut rng = match self.config.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut folds = vec![Vec::new(); k];
        for positive in [false, true] {
            let mut members: Vec<usize> = (0..y.len()).filter(|&i| (y[i] > 0.0) == positive).collect();
            members.shuffle(&mut rng);
            for (pos, idx) in members.into_iter().enumerate() {
                folds[pos % k].push(idx);
            }
        }
        for fold in &mut folds {
            fold.sort_unstable();
        }
        folds
    }

    /// SMO training algorithm
    fn smo_train(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        seed: Option<u64>,
    ) -> Result<(Array1<f64>, f64, Vec<usize>)> {
        let n = x.nrows();

        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(ScreeningError::TrainingError(format!(
                "Dataset has {} samples, exceeding the maximum {} for SVM kernel matrix",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        let mut alphas = Array1::zeros(n);
        let mut bias = 0.0;

        // Precompute kernel matrix for efficiency
        let kernel_matrix = self.compute_kernel_matrix(x);

        let mut rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let c = self.config.c;
        let tol = self.config.tol;
        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while n > 1 && passes < max_passes && total_iter < self.config.max_iter {
            let mut num_changed = 0;

            for i in 0..n {
                let e_i = decision_cached(&kernel_matrix, &alphas, y, bias, i) - y[i];

                // Check KKT conditions
                if (y[i] * e_i < -tol && alphas[i] < c) || (y[i] * e_i > tol && alphas[i] > 0.0) {
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = decision_cached(&kernel_matrix, &alphas, y, bias, j) - y[j];
                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        ((alphas[j] - alphas[i]).max(0.0), (c + alphas[j] - alphas[i]).min(c))
                    } else {
                        ((alphas[i] + alphas[j] - c).max(0.0), (alphas[i] + alphas[j]).min(c))
                    };
                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let eta = 2.0 * kernel_matrix[[i, j]] - kernel_matrix[[i, i]] - kernel_matrix[[j, j]];
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] = (alphas[j] - y[j] * (e_i - e_j) / eta).clamp(l, h);
                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }
                    alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                    let b1 = bias - e_i
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, i]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[i, j]];
                    let b2 = bias - e_j
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, j]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[j, j]];

                    bias = if alphas[i] > 0.0 && alphas[i] < c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        let support_indices: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-8)
            .map(|(i, _)| i)
            .collect();

        Ok((alphas, bias, support_indices))
    }

    /// Kernel matrix, rows computed in parallel
    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let xi = x.row(i);
                (0..n).map(|j| self.kernel(xi, x.row(j))).collect()
            })
            .collect();

        Array2::from_shape_fn((n, n), |(i, j)| rows[i][j])
    }

    fn kernel(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self.config.kernel {
            KernelType::Linear => a.dot(&b),
            KernelType::RBF { .. } => {
                let norm_sq: f64 = a.iter().zip(b.iter()).map(|(p, q)| (p - q).powi(2)).sum();
                (-self.gamma * norm_sq).exp()
            }
        }
    }

    fn score_matrix(&self, machine: &BinarySVM, x: &Array2<f64>) -> Array1<f64> {
        x.axis_iter(Axis(0))
            .map(|row| self.score_sample(machine, row))
            .collect()
    }

    fn score_sample(&self, machine: &BinarySVM, sample: ArrayView1<f64>) -> f64 {
        let mut sum = machine.bias;
        for (j, sv) in machine.support_vectors.axis_iter(Axis(0)).enumerate() {
            sum += machine.alphas[j] * machine.support_labels[j] * self.kernel(sample, sv);
        }
        sum
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<&BinarySVM> {
        if !self.is_fitted {
            return Err(ScreeningError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ScreeningError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        self.machine.as_ref().ok_or(ScreeningError::ModelNotFitted)
    }

    /// Signed distance to the separating surface; positive means class 1
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let machine = self.check_input(x)?;
        Ok(self.score_matrix(machine, x))
    }

    /// Predict 0/1 labels from the sign of the decision function
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .decision_function(x)?
            .mapv(|s| if s >= 0.0 { 1.0 } else { 0.0 }))
    }

    /// Calibrated probability of class 1 for every row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let calibrator = self.calibrator.as_ref().ok_or_else(|| {
            ScreeningError::InvalidInput("probability estimates were not enabled for this SVM".to_string())
        })?;
        calibrator.calibrate(&self.decision_function(x)?)
    }

    /// Get number of support vectors
    pub fn n_support_vectors(&self) -> usize {
        self.machine.as_ref().map(|m| m.support_vectors.nrows()).unwrap_or(0)
    }

    /// Number of input features
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Gamma used by the RBF kernel after fitting
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

fn decision_cached(k: &Array2<f64>, alphas: &Array1<f64>, y: &Array1<f64>, bias: f64, idx: usize) -> f64 {
    let mut sum = bias;
    for i in 0..alphas.len() {
        if alphas[i] != 0.0 {
            sum += alphas[i] * y[i] * k[[i, idx]];
        }
    }
    sum
}
