//! Training configuration

use crate::preprocessing::PreprocessingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::random_forest::MaxFeatures;
use super::svm::SVMConfig;

/// Random forest hyper-parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub random_state: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: 42,
        }
    }
}

/// Configuration for a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// CSV file with a header row
    pub data_path: PathBuf,
    /// Directory receiving the four artifact files
    pub model_dir: PathBuf,
    pub preprocessing: PreprocessingConfig,
    pub svm: SVMConfig,
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("dataset/diabetes.csv"),
            model_dir: PathBuf::from("model"),
            preprocessing: PreprocessingConfig::default(),
            svm: SVMConfig::default(),
            forest: ForestConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn new(data_path: impl Into<PathBuf>, model_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    /// Set number of trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.forest.n_estimators = n;
        self
    }

    /// Seed used by the split, the SVM and the forest
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.preprocessing.random_state = seed;
        self.svm.random_state = Some(seed);
        self.forest.random_state = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.data_path, PathBuf::from("dataset/diabetes.csv"));
        assert_eq!(config.model_dir, PathBuf::from("model"));
        assert_eq!(config.forest.n_estimators, 100);
        assert_eq!(config.svm.c, 1.0);
        assert_eq!(config.preprocessing.test_size, 0.2);
    }

    #[test]
    fn test_seed_propagates() {
        let config = TrainingConfig::default().with_random_state(7);
        assert_eq!(config.preprocessing.random_state, 7);
        assert_eq!(config.svm.random_state, Some(7));
        assert_eq!(config.forest.random_state, 7);
    }
}
