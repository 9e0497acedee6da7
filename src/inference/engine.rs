//! Inference engine
//!
//! Holds the loaded artifact bundle and turns one submitted form row into an
//! [`EnsemblePrediction`]. The engine is immutable after construction and is
//! shared between request handlers without locking.

use crate::ensemble::{soft_vote, EnsemblePrediction};
use crate::error::Result;
use crate::export::ArtifactBundle;
use crate::training::ProbabilisticClassifier;
use super::PredictError;
use ndarray::Array2;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Scores raw rows with both classifiers of one bundle
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    bundle: ArtifactBundle,
}

impl InferenceEngine {
    pub fn new(bundle: ArtifactBundle) -> Self {
        Self { bundle }
    }

    /// Load and validate the bundle stored in `dir`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let bundle = ArtifactBundle::load(dir.as_ref())?;
        info!(
            features = bundle.n_features(),
            run_id = %bundle.run_id,
            trained_at = %bundle.created_at,
            "Model bundle ready"
        );
        Ok(Self::new(bundle))
    }

    /// Feature names in training order
    pub fn feature_names(&self) -> &[String] {
        &self.bundle.feature_names
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    /// Validate a submitted form in feature order. The first missing or
    /// non-numeric field is reported.
    pub fn parse_form(&self, form: &HashMap<String, String>) -> std::result::Result<Vec<f64>, PredictError> {
        self.feature_names()
            .iter()
            .map(|name| {
                let raw = form.get(name).map(String::as_str).unwrap_or_default();
                if raw.is_empty() {
                    return Err(PredictError::MissingField(name.clone()));
                }
                // surrounding blanks are accepted, a blank-only value is not a number
                match raw.trim().parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    _ => Err(PredictError::NotNumeric(name.clone())),
                }
            })
            .collect()
    }

    /// Score one row given in training feature order
    pub fn predict_row(&self, row: &[f64]) -> std::result::Result<EnsemblePrediction, PredictError> {
        let scaled = self.bundle.scaler.transform_row(row)?;

        let svm_probability = positive_probability(&self.bundle.svm, &scaled)?;
        let forest_probability = positive_probability(&self.bundle.forest, &scaled)?;

        let prediction = soft_vote(svm_probability, forest_probability);
        debug!(
            svm = svm_probability,
            forest = forest_probability,
            final_probability = prediction.final_probability,
            verdict = %prediction.verdict,
            "Row scored"
        );
        Ok(prediction)
    }

    /// Validate then score a submitted form
    pub fn predict_form(&self, form: &HashMap<String, String>) -> std::result::Result<EnsemblePrediction, PredictError> {
        let row = self.parse_form(form)?;
        self.predict_row(&row)
    }
}

fn positive_probability<M: ProbabilisticClassifier>(
    model: &M,
    x: &Array2<f64>,
) -> std::result::Result<f64, PredictError> {
    let proba = model.predict_positive_proba(x)?;
    match proba.iter().next() {
        Some(&p) if (0.0..=1.0).contains(&p) => Ok(p),
        Some(&p) => Err(PredictError::Internal(format!(
            "{} returned probability {} outside [0, 1]",
            model.name(),
            p
        ))),
        None => Err(PredictError::Internal(format!("{} returned no probability", model.name()))),
    }
}
