//! Diabetes screening - SVM + Random Forest soft-voting classifier
//!
//! This crate trains two classifiers on a tabular medical dataset and
//! serves their averaged prediction through a web form:
//! - Target column detection, mean imputation, stratified split, scaling
//! - RBF SVM with Platt-calibrated probabilities
//! - 100-tree Random Forest
//! - Versioned JSON artifacts shared by the trainer and the server
//!
//! # Modules
//!
//! ## Core ML Modules
//! - [`preprocessing`] - Dataset preparation and standard scaling
//! - [`training`] - SVM, decision tree, random forest and the training engine
//! - [`calibration`] - Platt scaling for SVM probabilities
//! - [`ensemble`] - Soft voting
//! - [`inference`] - Form validation and scoring
//!
//! ## Services
//! - [`export`] - Artifact bundle persistence
//! - [`server`] - HTTP form server
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod calibration;
pub mod ensemble;
pub mod inference;

// Services
pub mod export;
pub mod server;
pub mod cli;

// Utilities
pub mod utils;

pub use error::{ScreeningError, Result};
pub use training::TrainingReport;

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{ScreeningError, Result};
    pub use crate::preprocessing::{DataPreprocessor, Dataset, PreprocessingConfig, StandardScaler};
    pub use crate::training::{RandomForest, SVMClassifier, TrainEngine, TrainingConfig, TrainingReport};
    pub use crate::ensemble::{soft_vote, EnsemblePrediction, Verdict};
    pub use crate::export::ArtifactBundle;
    pub use crate::inference::{InferenceEngine, PredictError};
    pub use crate::utils::DataLoader;
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
