//! Data loading utilities

use crate::error::{ScreeningError, Result};
use crate::preprocessing::Dataset;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// CSV loader producing a numeric [`Dataset`]
pub struct DataLoader {
    /// Rows used for schema inference
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
        }
    }

    /// Set how many rows polars inspects to infer column types
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a CSV file with a header row. Empty cells become missing values.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScreeningError::DatasetNotFound(path.to_path_buf()));
        }

        let start = Instant::now();
        let file = File::open(path)?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file)
            .finish()?;

        let dataset = Dataset::from_frame(&df)?;
        info!(
            path = %path.display(),
            rows = dataset.n_rows(),
            columns = dataset.n_columns(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dataset loaded"
        );
        Ok(dataset)
    }
}
