//! Data preprocessing module
//!
//! Turns the raw CSV table into model-ready matrices:
//! - Binary target column detection
//! - Mean imputation of missing feature values
//! - Stratified train/test split
//! - Standard scaling fitted on the training partition

mod config;
mod dataset;
mod imputer;
mod pipeline;
mod scaler;
mod split;
mod target;

pub use config::PreprocessingConfig;
pub use dataset::Dataset;
pub use imputer::MeanImputer;
pub use pipeline::{DataPreprocessor, PreparationSummary, PreparedData};
pub use scaler::StandardScaler;
pub use split::{SplitIndices, StratifiedSplit};
pub use target::{detect_target_column, DetectedTarget, TargetMatch};
