//! Model training module
//!
//! Provides the two screening classifiers and the engine that trains them:
//! - RBF Support Vector Machine with Platt-calibrated probabilities
//! - Random Forest of Gini decision trees

mod config;
mod engine;
mod models;
pub mod decision_tree;
pub mod random_forest;
pub mod svm;

pub use config::{ForestConfig, TrainingConfig};
pub use engine::{ModelEvaluation, TrainEngine, TrainingReport};
pub use models::{ClassMetrics, ClassificationReport, ProbabilisticClassifier, CLASS_NAMES};
pub use decision_tree::{DecisionTree, TreeNode};
pub use random_forest::{MaxFeatures, RandomForest};
pub use svm::{Gamma, KernelType, SVMClassifier, SVMConfig};
