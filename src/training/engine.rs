//! Training engine: dataset in, evaluated and persisted bundle out

use crate::error::Result;
use crate::export::ArtifactBundle;
use crate::preprocessing::{DataPreprocessor, Dataset, PreparationSummary, TargetMatch};
use crate::utils::DataLoader;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use super::models::{ClassificationReport, ProbabilisticClassifier};
use super::random_forest::RandomForest;
use super::svm::SVMClassifier;
use super::TrainingConfig;

/// Held-out evaluation of one classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEvaluation {
    pub model_name: String,
    pub report: ClassificationReport,
    pub training_time_secs: f64,
}

/// Everything a training run has to say about itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub column_names: Vec<String>,
    pub target: String,
    pub target_rule: TargetMatch,
    pub feature_names: Vec<String>,
    pub summary: PreparationSummary,
    pub n_train: usize,
    pub n_test: usize,
    pub svm: ModelEvaluation,
    pub forest: ModelEvaluation,
    pub n_support_vectors: usize,
    pub run_id: Uuid,
    /// Written files, empty when nothing was saved
    pub artifacts: Vec<PathBuf>,
}

/// Main training engine
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Load the configured CSV, train, evaluate and write the artifacts
    pub fn run(&self) -> Result<TrainingReport> {
        let dataset = DataLoader::new().load_csv(&self.config.data_path)?;
        let (bundle, mut report) = self.fit(&dataset)?;
        report.artifacts = bundle.save(&self.config.model_dir)?;
        Ok(report)
    }

    /// Train both classifiers on `dataset` without touching the disk
    pub fn fit(&self, dataset: &Dataset) -> Result<(ArtifactBundle, TrainingReport)> {
        let prepared = DataPreprocessor::new(self.config.preprocessing.clone()).prepare(dataset)?;

        let mut svm = SVMClassifier::new(self.config.svm.clone());
        let svm_eval = evaluate(&mut svm, &prepared.x_train, &prepared.y_train, &prepared.x_test, &prepared.y_test)?;

        let forest_config = &self.config.forest;
        let mut forest = RandomForest::new(forest_config.n_estimators)
            .with_max_features(forest_config.max_features)
            .with_bootstrap(forest_config.bootstrap)
            .with_random_state(forest_config.random_state);
        let forest_eval = evaluate(&mut forest, &prepared.x_train, &prepared.y_train, &prepared.x_test, &prepared.y_test)?;

        let n_support_vectors = svm.n_support_vectors();
        let bundle = ArtifactBundle::new(svm, forest, prepared.scaler, prepared.feature_names.clone())?;

        let report = TrainingReport {
            column_names: dataset.column_names().to_vec(),
            target: prepared.target.name.clone(),
            target_rule: prepared.target.rule,
            feature_names: prepared.feature_names,
            summary: prepared.summary,
            n_train: prepared.x_train.nrows(),
            n_test: prepared.x_test.nrows(),
            svm: svm_eval,
            forest: forest_eval,
            n_support_vectors,
            run_id: bundle.run_id,
            artifacts: Vec::new(),
        };

        Ok((bundle, report))
    }
}

fn evaluate<M: ProbabilisticClassifier>(
    model: &mut M,
    x_train: &ndarray::Array2<f64>,
    y_train: &ndarray::Array1<f64>,
    x_test: &ndarray::Array2<f64>,
    y_test: &ndarray::Array1<f64>,
) -> Result<ModelEvaluation> {
    let start = Instant::now();
    model.fit(x_train, y_train)?;
    let training_time_secs = start.elapsed().as_secs_f64();

    let report = ClassificationReport::compute(y_test, &model.predict(x_test)?)?;
    info!(
        model = model.name(),
        accuracy = report.accuracy,
        secs = training_time_secs,
        "Model trained"
    );

    Ok(ModelEvaluation {
        model_name: model.name().to_string(),
        report,
        training_time_secs,
    })
}
