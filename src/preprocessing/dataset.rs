//! Column-major numeric table with missing cells

use crate::error::{ScreeningError, Result};
use polars::prelude::*;

/// A numeric table read from disk. Cells are `None` when missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl Dataset {
    /// Build a dataset from named columns of equal length
    pub fn new(names: Vec<String>, columns: Vec<Vec<Option<f64>>>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(ScreeningError::ShapeError {
                expected: format!("{} columns", names.len()),
                actual: format!("{} columns", columns.len()),
            });
        }

        if let Some(first) = columns.first() {
            let n_rows = first.len();
            for (name, col) in names.iter().zip(columns.iter()) {
                if col.len() != n_rows {
                    return Err(ScreeningError::ShapeError {
                        expected: format!("{} rows", n_rows),
                        actual: format!("{} rows in column '{}'", col.len(), name),
                    });
                }
            }
        }

        Ok(Self { names, columns })
    }

    /// Convert a polars frame, casting every column to `Float64`. Non-finite
    /// cells (`NaN`, `inf`) are treated as missing.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let mut names = Vec::with_capacity(df.width());
        let mut columns = Vec::with_capacity(df.width());

        for column in df.get_columns() {
            let name = column.name().to_string();
            let series = column
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| ScreeningError::DataError(format!("column '{}' is not numeric: {}", name, e)))?;
            let values: Vec<Option<f64>> = series
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect();

            names.push(name);
            columns.push(values);
        }

        Self::new(names, columns)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Column values by position
    pub fn column_at(&self, idx: usize) -> &[Option<f64>] {
        &self.columns[idx]
    }

    /// Column values by name
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Number of missing cells in one column
    pub fn missing_in(&self, idx: usize) -> usize {
        self.columns[idx].iter().filter(|v| v.is_none()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ragged_columns() {
        let result = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![vec![Some(1.0), Some(2.0)], vec![Some(1.0)]],
        );
        assert!(matches!(result, Err(ScreeningError::ShapeError { .. })));
    }

    #[test]
    fn test_from_frame_keeps_nulls() {
        let df = df!(
            "glucose" => &[Some(148.0), None, Some(183.0)],
            "outcome" => &[Some(1i64), Some(0), Some(1)]
        )
        .unwrap();

        let ds = Dataset::from_frame(&df).unwrap();
        assert_eq!(ds.n_rows(), 3);
        assert_eq!(ds.column_names(), &["glucose".to_string(), "outcome".to_string()]);
        assert_eq!(ds.column("glucose").unwrap()[1], None);
        assert_eq!(ds.column("outcome").unwrap()[0], Some(1.0));
        assert_eq!(ds.missing_in(0), 1);
    }

    #[test]
    fn test_from_frame_drops_non_finite() {
        let df = df!(
            "bmi" => &[Some(33.6), Some(f64::NAN), Some(f64::INFINITY), None],
            "outcome" => &[Some(1.0), Some(0.0), Some(1.0), Some(0.0)]
        )
        .unwrap();

        let ds = Dataset::from_frame(&df).unwrap();
        assert_eq!(ds.column("bmi").unwrap(), &[Some(33.6), None, None, None]);
        assert_eq!(ds.missing_in(0), 3);
    }
}
