//! Inference module
//!
//! Validates submitted feature values and scores them with the loaded bundle.

mod engine;
mod error;

pub use engine::InferenceEngine;
pub use error::PredictError;
