//! Mean imputation for numeric feature columns

use crate::error::{ScreeningError, Result};
use serde::{Deserialize, Serialize};

/// Replaces missing cells with the mean of the column's present values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeanImputer {
    fill_values: Vec<f64>,
    is_fitted: bool,
}

impl MeanImputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute one mean per column. A column with no present values cannot be imputed.
    pub fn fit(&mut self, names: &[String], columns: &[&[Option<f64>]]) -> Result<&mut Self> {
        let mut fill_values = Vec::with_capacity(columns.len());

        for (name, column) in names.iter().zip(columns.iter()) {
            let present: Vec<f64> = column.iter().flatten().copied().collect();
            if present.is_empty() {
                return Err(ScreeningError::PreprocessingError(format!(
                    "feature '{}' has no values to compute a mean from",
                    name
                )));
            }
            fill_values.push(present.iter().sum::<f64>() / present.len() as f64);
        }

        self.fill_values = fill_values;
        self.is_fitted = true;
        Ok(self)
    }

    /// Fill the gaps of each column with its fitted mean
    pub fn transform(&self, columns: &[&[Option<f64>]]) -> Result<Vec<Vec<f64>>> {
        if !self.is_fitted {
            return Err(ScreeningError::ModelNotFitted);
        }
        if columns.len() != self.fill_values.len() {
            return Err(ScreeningError::ShapeError {
                expected: format!("{} columns", self.fill_values.len()),
                actual: format!("{} columns", columns.len()),
            });
        }

        Ok(columns
            .iter()
            .zip(self.fill_values.iter())
            .map(|(column, &mean)| column.iter().map(|v| v.unwrap_or(mean)).collect())
            .collect())
    }

    pub fn fit_transform(&mut self, names: &[String], columns: &[&[Option<f64>]]) -> Result<Vec<Vec<f64>>> {
        self.fit(names, columns)?;
        self.transform(columns)
    }

    pub fn fill_values(&self) -> &[f64] {
        &self.fill_values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_with_column_mean() {
        let names = vec!["bmi".to_string(), "age".to_string()];
        let bmi = vec![Some(20.0), None, Some(30.0), None];
        let age = vec![Some(50.0), Some(31.0), Some(32.0), Some(21.0)];

        let mut imputer = MeanImputer::new();
        let filled = imputer.fit_transform(&names, &[&bmi, &age]).unwrap();

        assert_eq!(filled[0], vec![20.0, 25.0, 30.0, 25.0]);
        assert_eq!(filled[1], vec![50.0, 31.0, 32.0, 21.0]);
        assert_eq!(imputer.fill_values(), &[25.0, 33.5]);
    }

    #[test]
    fn test_all_missing_column_is_rejected() {
        let names = vec!["insulin".to_string()];
        let insulin: Vec<Option<f64>> = vec![None, None];

        let mut imputer = MeanImputer::new();
        assert!(imputer.fit(&names, &[&insulin]).is_err());
    }

    #[test]
    fn test_transform_requires_fit() {
        let imputer = MeanImputer::new();
        let col = vec![Some(1.0)];
        assert!(matches!(imputer.transform(&[&col]), Err(ScreeningError::ModelNotFitted)));
    }
}
