//! Error types for the diabetes screening crate

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for screening operations
pub type Result<T> = std::result::Result<T, ScreeningError>;

/// Main error type for training, artifact handling and inference
#[derive(Error, Debug)]
pub enum ScreeningError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("No target column detected: expected a column holding both 0 and 1 values")]
    TargetNotFound,

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Artifact not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Artifact mismatch: {0}")]
    ArtifactMismatch(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<polars::error::PolarsError> for ScreeningError {
    fn from(err: polars::error::PolarsError) -> Self {
        ScreeningError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ScreeningError {
    fn from(err: serde_json::Error) -> Self {
        ScreeningError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ScreeningError {
    fn from(err: ndarray::ShapeError) -> Self {
        ScreeningError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScreeningError::DataError("bad row".to_string());
        assert_eq!(err.to_string(), "Data error: bad row");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ScreeningError = io_err.into();
        assert!(matches!(err, ScreeningError::IoError(_)));
    }

    #[test]
    fn test_artifact_missing_names_path() {
        let err = ScreeningError::ArtifactMissing(PathBuf::from("model/scaler.json"));
        assert!(err.to_string().contains("model/scaler.json"));
    }
}
