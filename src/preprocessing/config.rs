//! Preprocessing configuration

use serde::{Deserialize, Serialize};

/// Configuration for dataset preparation before training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Random seed for the stratified split
    pub random_state: u64,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
        }
    }
}

impl PreprocessingConfig {
    /// Set the held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Set the split seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}
