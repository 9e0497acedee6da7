//! Per-request prediction failures

use thiserror::Error;

/// Why a submitted row could not be scored. Every variant is recoverable:
/// the server shows the message and keeps serving.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("Field '{0}' is empty")]
    MissingField(String),

    #[error("Field '{0}' is not a valid number")]
    NotNumeric(String),

    #[error("Prediction failed: {0}")]
    Internal(String),
}

impl From<crate::error::ScreeningError> for PredictError {
    fn from(err: crate::error::ScreeningError) -> Self {
        PredictError::Internal(err.to_string())
    }
}
