//! Decision tree classifier
//!
//! CART tree grown on Gini impurity. Leaves keep the class distribution of
//! the training rows that reached them so the forest can average them.

use crate::error::{ScreeningError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding class frequencies, aligned with the tree's classes
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth, unbounded when `None`
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn at random for every split, all when `None`
    pub max_features: Option<usize>,
    /// Seed for the per-split feature draw
    pub random_state: Option<u64>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
    classes: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            n_features: 0,
            feature_importances: None,
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

    /// Set number of features considered per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fix the class list up front. Used by the forest so that every tree's
    /// leaf distributions share one column order even when a bootstrap
    /// sample misses a class.
    pub fn with_classes(mut self, classes: Vec<f64>) -> Self {
        self.classes = classes;
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_indices(x, y, &indices)
    }

    /// Fit on a subset of rows. Repeated indices count once per occurrence.
    pub fn fit_indices(&mut self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Result<&mut Self> {
        let n_features = x.ncols();

        if x.nrows() != y.len() {
            return Err(ScreeningError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if indices.is_empty() {
            return Err(ScreeningError::TrainingError(
                "Cannot fit a decision tree on zero samples".to_string(),
            ));
        }

        let sample_classes = sorted_classes(indices.iter().map(|&i| y[i]));
        if self.classes.is_empty() {
            self.classes = sample_classes;
        } else if let Some(unknown) = sample_classes.iter().find(|c| !self.classes.contains(c)) {
            return Err(ScreeningError::TrainingError(format!(
                "label {} is not among the declared classes {:?}",
                unknown, self.classes
            )));
        }

        self.n_features = n_features;
        let labels: Vec<usize> = y
            .iter()
            .map(|v| self.classes.iter().position(|c| c == v).unwrap_or(0))
            .collect();

        let mut rng = match self.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut importances = vec![0.0; n_features];
        let mut builder = TreeBuilder {
            tree: self,
            x,
            labels: &labels,
            rng: &mut rng,
            importances: &mut importances,
        };
        let root = builder.build(indices.to_vec(), 0);
        self.root = Some(root);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    /// Class distribution for every row, columns ordered as `classes()`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let root = self.check_input(x)?;
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for (i, row) in x.axis_iter(Axis(0)).enumerate() {
            let distribution = leaf_distribution(root, row);
            for (j, &p) in distribution.iter().enumerate() {
                proba[[i, j]] = p;
            }
        }
        Ok(proba)
    }

    /// Most frequent class of the reached leaf
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .axis_iter(Axis(0))
            .map(|row| self.classes[argmax(row)])
            .collect())
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<&TreeNode> {
        let root = self.root.as_ref().ok_or(ScreeningError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(ScreeningError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(root)
    }

    /// Classes in the column order used by `predict_proba`
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        self.root.as_ref().map(node_depth).unwrap_or(0)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.root.as_ref().map(count_leaves).unwrap_or(0)
    }
}

struct TreeBuilder<'a, R: Rng> {
    tree: &'a DecisionTree,
    x: &'a Array2<f64>,
    labels: &'a [usize],
    rng: &'a mut R,
    importances: &'a mut [f64],
}

impl<R: Rng> TreeBuilder<'_, R> {
    fn build(&mut self, indices: Vec<usize>, depth: usize) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_counts(&indices);
        let impurity = gini(&counts, n_samples);

        let should_stop = n_samples < self.tree.min_samples_split
            || n_samples < 2 * self.tree.min_samples_leaf
            || self.tree.max_depth.map_or(false, |d| depth >= d)
            || impurity <= 0.0;

        if should_stop {
            return self.leaf(&counts, n_samples);
        }

        let Some((feature_idx, threshold, gain)) = self.find_best_split(&indices, impurity) else {
            return self.leaf(&counts, n_samples);
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.x[[i, feature_idx]] <= threshold);

        self.importances[feature_idx] += n_samples as f64 * gain;

        let left = Box::new(self.build(left_indices, depth + 1));
        let right = Box::new(self.build(right_indices, depth + 1));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    fn leaf(&self, counts: &[usize], n_samples: usize) -> TreeNode {
        let n = n_samples.max(1) as f64;
        TreeNode::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / n).collect(),
            n_samples,
        }
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.tree.classes.len()];
        for &i in indices {
            counts[self.labels[i]] += 1;
        }
        counts
    }

    /// Best (feature, threshold, gain) over a random draw of candidate
    /// features. Each candidate is swept once in sorted order while class
    /// counts move from the right side to the left.
    fn find_best_split(&mut self, indices: &[usize], parent_impurity: f64) -> Option<(usize, f64, f64)> {
        let n_features = self.x.ncols();
        let n_try = self.tree.max_features.unwrap_or(n_features).clamp(1, n_features);
        let candidates = rand::seq::index::sample(&mut *self.rng, n_features, n_try).into_vec();

        let n = indices.len();
        let min_leaf = self.tree.min_samples_leaf.max(1);
        let total_counts = self.class_counts(indices);
        let mut best: Option<(usize, f64, f64)> = None;

        for feature_idx in candidates {
            let mut order: Vec<(f64, usize)> = indices
                .iter()
                .map(|&i| (self.x[[i, feature_idx]], self.labels[i]))
                .collect();
            order.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_counts = vec![0usize; total_counts.len()];
            let mut right_counts = total_counts.clone();

            for pos in 0..n - 1 {
                let (value, label) = order[pos];
                left_counts[label] += 1;
                right_counts[label] -= 1;

                let next_value = order[pos + 1].0;
                if next_value <= value {
                    continue;
                }
                let left_n = pos + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let weighted = (left_n as f64 * gini(&left_counts, left_n)
                    + right_n as f64 * gini(&right_counts, right_n))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > best.map_or(0.0, |b| b.2) {
                    best = Some((feature_idx, (value + next_value) / 2.0, gain));
                }
            }
        }

        best
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

fn leaf_distribution<'a>(node: &'a TreeNode, sample: ArrayView1<f64>) -> &'a [f64] {
    match node {
        TreeNode::Leaf { distribution, .. } => distribution,
        TreeNode::Split { feature_idx, threshold, left, right, .. } => {
            if sample[*feature_idx] <= *threshold {
                leaf_distribution(left, sample)
            } else {
                leaf_distribution(right, sample)
            }
        }
    }
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn count_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
    }
}

pub(crate) fn sorted_classes(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut classes: Vec<f64> = values.collect();
    classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    classes.dedup();
    classes
}

pub(crate) fn argmax(row: ArrayView1<f64>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_decision_tree_classifier() {
        let x = array![
            [1.0, 2.0],
            [1.5, 1.8],
            [5.0, 8.0],
            [8.0, 8.0],
            [1.0, 0.6],
            [9.0, 11.0],
        ];
        let y = array![0.0, 0.0, 1.0, 1.0, 0.0, 1.0];

        let mut tree = DecisionTree::new().with_random_state(42);
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions, y);
        assert!(tree.get_depth() >= 2);
    }

    #[test]
    fn test_leaf_distribution_with_depth_limit() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 0.0, 1.0, 0.0];

        let mut tree = DecisionTree::new().with_max_depth(0);
        tree.fit(&x, &y).unwrap();

        let proba = tree.predict_proba(&x).unwrap();
        assert_eq!(proba.ncols(), 2);
        assert!((proba[[0, 0]] - 0.75).abs() < 1e-12);
        assert!((proba[[0, 1]] - 0.25).abs() < 1e-12);
        assert_eq!(tree.get_n_leaves(), 1);
    }

    #[test]
    fn test_declared_classes_keep_columns() {
        let x = array![[0.0], [1.0]];
        let y = array![1.0, 1.0];

        let mut tree = DecisionTree::new().with_classes(vec![0.0, 1.0]);
        tree.fit(&x, &y).unwrap();

        let proba = tree.predict_proba(&x).unwrap();
        assert_eq!(proba.row(0).to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_undeclared_label_rejected() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0, 2.0];

        let mut tree = DecisionTree::new().with_classes(vec![0.0, 1.0]);
        assert!(tree.fit(&x, &y).is_err());
    }

    #[test]
    fn test_feature_importances_sum_to_one() {
        let x = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new().with_random_state(1);
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert!((importances.sum() - 1.0).abs() < 1e-12);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_predict_before_fit() {
        let tree = DecisionTree::new();
        assert!(matches!(tree.predict(&array![[1.0]]), Err(ScreeningError::ModelNotFitted)));
    }
}
