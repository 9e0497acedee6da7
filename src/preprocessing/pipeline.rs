//! Dataset preparation: target detection, imputation, split and scaling

use crate::error::{ScreeningError, Result};
use super::{
    detect_target_column, Dataset, DetectedTarget, MeanImputer, PreprocessingConfig,
    StandardScaler, StratifiedSplit,
};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Counts gathered while preparing the data, reported by the training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparationSummary {
    pub n_rows_read: usize,
    pub n_rows_used: usize,
    pub missing_feature_values: usize,
    pub dropped_target_rows: usize,
    /// (label, count) over the rows used, ordered by label
    pub class_counts: Vec<(f64, usize)>,
}

/// Everything the classifiers need, produced from one dataset
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub target: DetectedTarget,
    pub feature_names: Vec<String>,
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    /// Binary labels, 1.0 where the target value is 1
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    pub scaler: StandardScaler,
    pub summary: PreparationSummary,
}

/// Turns a raw dataset into scaled train/test matrices
#[derive(Debug, Clone, Default)]
pub struct DataPreprocessor {
    config: PreprocessingConfig,
}

impl DataPreprocessor {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn prepare(&self, dataset: &Dataset) -> Result<PreparedData> {
        let target = detect_target_column(dataset)?;
        info!(target = %target.name, rule = ?target.rule, "Target column detected");

        let feature_idx: Vec<usize> = (0..dataset.n_columns()).filter(|&i| i != target.index).collect();
        if feature_idx.is_empty() {
            return Err(ScreeningError::PreprocessingError(
                "dataset has no feature columns besides the target".to_string(),
            ));
        }
        let feature_names: Vec<String> = feature_idx
            .iter()
            .map(|&i| dataset.column_names()[i].clone())
            .collect();

        let missing_feature_values: usize = feature_idx.iter().map(|&i| dataset.missing_in(i)).sum();

        // Means come from every row, including rows that later land in the test partition.
        let raw_columns: Vec<&[Option<f64>]> = feature_idx.iter().map(|&i| dataset.column_at(i)).collect();
        let filled = MeanImputer::new().fit_transform(&feature_names, &raw_columns)?;
        if missing_feature_values > 0 {
            debug!(missing = missing_feature_values, "Filled missing feature values with column means");
        }

        let target_column = dataset.column_at(target.index);
        let kept_rows: Vec<usize> = target_column
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|_| i))
            .collect();
        let dropped_target_rows = dataset.n_rows() - kept_rows.len();

        let x = Array2::from_shape_fn((kept_rows.len(), feature_names.len()), |(r, c)| {
            filled[c][kept_rows[r]]
        });
        let y_raw: Array1<f64> = kept_rows
            .iter()
            .filter_map(|&i| target_column[i])
            .collect();

        let class_counts = count_classes(&y_raw);

        let split = StratifiedSplit::new(self.config.test_size, self.config.random_state).split(&y_raw)?;
        let x_train = x.select(Axis(0), &split.train);
        let x_test = x.select(Axis(0), &split.test);
        let y_train = binarize(&split.train, &y_raw);
        let y_test = binarize(&split.test, &y_raw);

        let mut scaler = StandardScaler::new();
        let x_train = scaler.fit_transform(&x_train)?;
        let x_test = scaler.transform(&x_test)?;

        info!(
            train_rows = x_train.nrows(),
            test_rows = x_test.nrows(),
            features = feature_names.len(),
            "Data prepared"
        );

        Ok(PreparedData {
            target,
            feature_names,
            x_train,
            x_test,
            y_train,
            y_test,
            scaler,
            summary: PreparationSummary {
                n_rows_read: dataset.n_rows(),
                n_rows_used: kept_rows.len(),
                missing_feature_values,
                dropped_target_rows,
                class_counts,
            },
        })
    }
}

fn binarize(indices: &[usize], y: &Array1<f64>) -> Array1<f64> {
    indices
        .iter()
        .map(|&i| if y[i] == 1.0 { 1.0 } else { 0.0 })
        .collect()
}

fn count_classes(y: &Array1<f64>) -> Vec<(f64, usize)> {
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for &label in y.iter() {
        match counts.iter_mut().find(|(c, _)| *c == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label, 1)),
        }
    }
    counts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    counts
}
