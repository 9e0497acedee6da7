//! Classifier trait and evaluation metrics

use crate::error::{ScreeningError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use super::random_forest::RandomForest;
use super::svm::SVMClassifier;

/// Display names for the negative and positive class
pub const CLASS_NAMES: [&str; 2] = ["Negatif", "Positif"];

/// A binary classifier able to score the positive class
pub trait ProbabilisticClassifier: Send + Sync {
    /// Fit on a scaled matrix and 0/1 labels
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Hard 0/1 predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Probability of class 1 for every row
    fn predict_positive_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Input dimension seen during fitting
    fn n_features(&self) -> usize;

    fn name(&self) -> &'static str;
}

impl ProbabilisticClassifier for SVMClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        SVMClassifier::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        SVMClassifier::predict(self, x)
    }

    fn predict_positive_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict_proba(x)
    }

    fn n_features(&self) -> usize {
        SVMClassifier::n_features(self)
    }

    fn name(&self) -> &'static str {
        "SVM"
    }
}

impl ProbabilisticClassifier for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        RandomForest::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        RandomForest::predict(self, x)
    }

    fn predict_positive_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict_class_proba(x, 1.0)
    }

    fn n_features(&self) -> usize {
        RandomForest::n_features(self)
    }

    fn name(&self) -> &'static str {
        "Random Forest"
    }
}

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Held-out evaluation of a binary classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    /// Index 0 is the negative class, index 1 the positive class
    pub per_class: [ClassMetrics; 2],
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Compute the report from 0/1 truth and predictions
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(ScreeningError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(ScreeningError::InvalidInput(
                "Cannot evaluate on an empty partition".to_string(),
            ));
        }

        // confusion[truth][prediction]
        let mut confusion = [[0usize; 2]; 2];
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            confusion[(t > 0.5) as usize][(p > 0.5) as usize] += 1;
        }

        let n = y_true.len();
        let correct = confusion[0][0] + confusion[1][1];

        let per_class = [0usize, 1].map(|c| {
            let tp = confusion[c][c] as f64;
            let predicted = (confusion[0][c] + confusion[1][c]) as f64;
            let support = confusion[c][0] + confusion[c][1];
            let precision = if predicted > 0.0 { tp / predicted } else { 0.0 };
            let recall = if support > 0 { tp / support as f64 } else { 0.0 };
            let f1_score = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics { precision, recall, f1_score, support }
        });

        let average = |weight: &dyn Fn(&ClassMetrics) -> f64| {
            let total: f64 = per_class.iter().map(weight).sum();
            let avg = |metric: fn(&ClassMetrics) -> f64| {
                if total > 0.0 {
                    per_class.iter().map(|m| weight(m) * metric(m)).sum::<f64>() / total
                } else {
                    0.0
                }
            };
            ClassMetrics {
                precision: avg(|m| m.precision),
                recall: avg(|m| m.recall),
                f1_score: avg(|m| m.f1_score),
                support: n,
            }
        };

        Ok(Self {
            accuracy: correct as f64 / n as f64,
            macro_avg: average(&|_| 1.0),
            weighted_avg: average(&|m| m.support as f64),
            per_class,
        })
    }

    /// Fixed-width table in the usual precision / recall / f1 / support layout
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:>14} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support");
        let _ = writeln!(out);
        for (name, m) in CLASS_NAMES.iter().zip(self.per_class.iter()) {
            let _ = writeln!(out, "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}", name, m.precision, m.recall, m.f1_score, m.support);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{:>14} {:>10} {:>10} {:>10.2} {:>10}", "accuracy", "", "", self.accuracy, self.macro_avg.support);
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            let _ = writeln!(out, "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}", name, m.precision, m.recall, m.f1_score, m.support);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classification_report() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];

        let report = ClassificationReport::compute(&y_true, &y_pred).unwrap();

        assert!((report.accuracy - 0.75).abs() < 1e-12);
        let positive = report.per_class[1];
        assert!((positive.precision - 0.75).abs() < 1e-12);
        assert!((positive.recall - 0.75).abs() < 1e-12);
        assert_eq!(positive.support, 4);
        assert_eq!(report.macro_avg.support, 8);
    }

    #[test]
    fn test_weighted_average_uses_support() {
        let y_true = array![0.0, 0.0, 0.0, 1.0];
        let y_pred = array![0.0, 0.0, 0.0, 0.0];

        let report = ClassificationReport::compute(&y_true, &y_pred).unwrap();

        assert_eq!(report.per_class[1].precision, 0.0);
        assert!((report.per_class[0].precision - 0.75).abs() < 1e-12);
        assert!((report.weighted_avg.recall - 0.75).abs() < 1e-12);
        assert!((report.macro_avg.recall - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_render_names_classes() {
        let report = ClassificationReport::compute(&array![0.0, 1.0], &array![0.0, 1.0]).unwrap();
        let table = report.render();
        assert!(table.contains("Negatif"));
        assert!(table.contains("Positif"));
        assert!(table.contains("weighted avg"));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(ClassificationReport::compute(&array![0.0], &array![0.0, 1.0]).is_err());
    }
}
