//! Probability calibration
//!
//! Maps raw classifier scores to class probabilities.

mod platt;

pub use platt::PlattScaling;
