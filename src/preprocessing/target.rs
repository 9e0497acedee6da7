//! Binary target column detection

use crate::error::{ScreeningError, Result};
use super::Dataset;
use serde::{Deserialize, Serialize};

/// Which detection rule selected the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetMatch {
    /// Distinct non-missing values are exactly {0, 1}
    Exact,
    /// Distinct values include 0 and 1 alongside other values
    Superset,
}

/// The detected target column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedTarget {
    pub index: usize,
    pub name: String,
    pub rule: TargetMatch,
}

/// Find the target column.
///
/// Columns are scanned in order and the first one whose distinct non-missing
/// values are exactly {0, 1} wins. Failing that, the first column holding
/// both 0 and 1 among other values is taken.
pub fn detect_target_column(dataset: &Dataset) -> Result<DetectedTarget> {
    let distinct: Vec<Vec<f64>> = (0..dataset.n_columns())
        .map(|idx| distinct_values(dataset.column_at(idx)))
        .collect();

    let exact = distinct
        .iter()
        .position(|values| values.len() == 2 && has_zero_and_one(values));
    let (index, rule) = match exact {
        Some(idx) => (idx, TargetMatch::Exact),
        None => {
            let idx = distinct
                .iter()
                .position(|values| has_zero_and_one(values))
                .ok_or(ScreeningError::TargetNotFound)?;
            (idx, TargetMatch::Superset)
        }
    };

    Ok(DetectedTarget {
        index,
        name: dataset.column_names()[index].clone(),
        rule,
    })
}

fn has_zero_and_one(values: &[f64]) -> bool {
    values.contains(&0.0) && values.contains(&1.0)
}

fn distinct_values(column: &[Option<f64>]) -> Vec<f64> {
    let mut values: Vec<f64> = column.iter().flatten().copied().filter(|v| !v.is_nan()).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values.dedup();
    values
}
