//! Standard feature scaling

use crate::error::{ScreeningError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Per-feature parameters of a fitted scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // mean
    scale: f64,  // population std, 1.0 when the feature is constant
}

/// Z-score scaler: (x - mean) / std, fitted column-wise on a reference matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit mean and standard deviation of every column
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(ScreeningError::PreprocessingError(
                "cannot fit a scaler on an empty matrix".to_string(),
            ));
        }

        self.params = x
            .axis_iter(Axis(1))
            .map(|col| Self::compute_params(col))
            .collect();
        self.is_fitted = true;
        Ok(self)
    }

    /// Scale every row with the fitted parameters
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;

        let mut out = x.clone();
        for (mut col, params) in out.axis_iter_mut(Axis(1)).zip(self.params.iter()) {
            col.mapv_inplace(|v| (v - params.center) / params.scale);
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Scale one raw feature row into a 1×n matrix ready for the classifiers
    pub fn transform_row(&self, row: &[f64]) -> Result<Array2<f64>> {
        self.check_width(row.len())?;

        let scaled: Vec<f64> = row
            .iter()
            .zip(self.params.iter())
            .map(|(&v, p)| (v - p.center) / p.scale)
            .collect();
        Ok(Array2::from_shape_vec((1, scaled.len()), scaled)?)
    }

    /// Number of features the scaler was fitted on
    pub fn n_features(&self) -> usize {
        self.params.len()
    }

    pub fn means(&self) -> Array1<f64> {
        self.params.iter().map(|p| p.center).collect()
    }

    pub fn scales(&self) -> Array1<f64> {
        self.params.iter().map(|p| p.scale).collect()
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if !self.is_fitted {
            return Err(ScreeningError::ModelNotFitted);
        }
        if width != self.params.len() {
            return Err(ScreeningError::ShapeError {
                expected: format!("{} features", self.params.len()),
                actual: format!("{} features", width),
            });
        }
        Ok(())
    }

    fn compute_params(col: ArrayView1<f64>) -> ScalerParams {
        let n = col.len() as f64;
        let mean = col.sum() / n;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        ScalerParams {
            center: mean,
            scale: if std == 0.0 { 1.0 } else { std },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler_zero_mean_unit_variance() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0], [5.0, 50.0]];

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        for col in scaled.axis_iter(Axis(1)) {
            let mean = col.sum() / col.len() as f64;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / col.len() as f64;
            assert!(mean.abs() < 1e-10);
            assert!((var - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_constant_feature_keeps_unit_scale() {
        let x = array![[3.0, 1.0], [3.0, 2.0], [3.0, 3.0]];

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        assert_eq!(scaler.scales()[0], 1.0);
        assert!(scaled.column(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_transform_row_matches_matrix_transform() {
        let x = array![[1.0, 4.0], [3.0, 8.0], [5.0, 9.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        let row = scaler.transform_row(&[3.0, 8.0]).unwrap();
        assert_eq!(row.row(0), scaled.row(1));
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&x).unwrap();

        assert!(matches!(
            scaler.transform_row(&[1.0, 2.0, 3.0]),
            Err(ScreeningError::ShapeError { .. })
        ));
    }
}
