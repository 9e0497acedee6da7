//! Random Forest classifier

use super::decision_tree::{sorted_classes, argmax, DecisionTree};
use crate::error::{ScreeningError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Random Forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random state
    pub random_state: Option<u64>,
    feature_importances: Option<Array1<f64>>,
    n_features: usize,
    classes: Vec<f64>,
}

/// Strategy for max features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Floor of the square root of n_features
    Sqrt,
    /// Floor of log2 of n_features
    Log2,
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    /// Create a new classifier forest
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: None,
            feature_importances: None,
            n_features: 0,
            classes: Vec::new(),
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set max features strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn compute_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().floor() as usize,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ScreeningError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || self.n_estimators == 0 {
            return Err(ScreeningError::TrainingError(
                "Random forest needs at least one sample and one tree".to_string(),
            ));
        }

        self.n_features = n_features;
        self.classes = sorted_classes(y.iter().copied());
        let max_features = self.compute_max_features(n_features);

        // Tree `i` is seeded with base + i, so the forest is reproducible
        // regardless of how rayon schedules the work.
        let base_seed = self.random_state.unwrap_or(42);

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTree::new()
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(max_features)
                    .with_random_state(rng.next_u64())
                    .with_classes(self.classes.clone());
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }

                tree.fit_indices(x, y, &sample_indices)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            n_trees = trees.len(),
            max_features,
            mean_depth = trees.iter().map(|t| t.get_depth()).sum::<usize>() as f64 / trees.len() as f64,
            "Random forest grown"
        );

        self.trees = trees;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        let mut total_importances = vec![0.0; self.n_features];

        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (total, &val) in total_importances.iter_mut().zip(imp.iter()) {
                    *total += val;
                }
            }
        }

        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    /// Mean of the trees' leaf distributions, columns ordered as `classes()`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(ScreeningError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ScreeningError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let per_tree: Vec<Array2<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict_proba(x))
            .collect::<Result<Vec<_>>>()?;

        // Summed in tree order so the result does not depend on scheduling
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for tree_proba in &per_tree {
            proba += tree_proba;
        }
        proba /= per_tree.len() as f64;

        Ok(proba)
    }

    /// Probability of `class` for every row, zero when the class was never seen
    pub fn predict_class_proba(&self, x: &Array2<f64>, class: f64) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(match self.classes.iter().position(|&c| c == class) {
            Some(idx) => proba.column(idx).to_owned(),
            None => Array1::zeros(x.nrows()),
        })
    }

    /// Class with the highest averaged probability
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .axis_iter(Axis(0))
            .map(|row| self.classes[argmax(row)])
            .collect())
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blobs() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.2],
            [0.1, 0.3],
            [1.0, 1.0],
            [1.1, 1.1],
            [1.2, 1.2],
            [0.9, 1.3],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_classifier() {
        let (x, y) = blobs();

        let mut rf = RandomForest::new(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        let correct = predictions.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        assert!(correct >= 7);
        assert_eq!(rf.n_trees(), 10);
    }

    #[test]
    fn test_probabilities_are_distributions() {
        let (x, y) = blobs();

        let mut rf = RandomForest::new(25).with_random_state(7);
        rf.fit(&x, &y).unwrap();

        let proba = rf.predict_proba(&x).unwrap();
        for row in proba.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }

        let p1 = rf.predict_class_proba(&x, 1.0).unwrap();
        assert!(p1[6] > p1[0]);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = blobs();

        let mut a = RandomForest::new(15).with_random_state(42);
        let mut b = RandomForest::new(15).with_random_state(42);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_max_features_strategies() {
        assert_eq!(RandomForest::new(1).compute_max_features(8), 2);
        assert_eq!(RandomForest::new(1).with_max_features(MaxFeatures::Log2).compute_max_features(8), 3);
        assert_eq!(RandomForest::new(1).with_max_features(MaxFeatures::Fixed(20)).compute_max_features(8), 8);
        assert_eq!(RandomForest::new(1).compute_max_features(1), 1);
    }

    #[test]
    fn test_unknown_class_probability_is_zero() {
        let (x, y) = blobs();
        let mut rf = RandomForest::new(3).with_random_state(1);
        rf.fit(&x, &y).unwrap();

        let p = rf.predict_class_proba(&x, 5.0).unwrap();
        assert!(p.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_feature_mismatch() {
        let (x, y) = blobs();
        let mut rf = RandomForest::new(3).with_random_state(1);
        rf.fit(&x, &y).unwrap();

        assert!(rf.predict_proba(&array![[1.0, 2.0, 3.0]]).is_err());
    }
}
