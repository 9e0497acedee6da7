//! Persisted artifact bundle
//!
//! The two classifiers, the scaler and the ordered feature names are written
//! as four JSON files. Every file is wrapped in an [`ArtifactEnvelope`] that
//! names what it holds, the format version and the training run that
//! produced it, so a bundle mixing files from different runs is rejected.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::error::{ScreeningError, Result};
use crate::preprocessing::StandardScaler;
use crate::training::{RandomForest, SVMClassifier};

/// Current on-disk format version
pub const ARTIFACT_VERSION: u32 = 1;

pub const SVM_FILE: &str = "svm_model.json";
pub const FOREST_FILE: &str = "rf_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const FEATURES_FILE: &str = "feature_names.json";

const SVM_FORMAT: &str = "diabetes-screening/svm";
const FOREST_FORMAT: &str = "diabetes-screening/random-forest";
const SCALER_FORMAT: &str = "diabetes-screening/standard-scaler";
const FEATURES_FORMAT: &str = "diabetes-screening/feature-names";

/// Wrapper written around every artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEnvelope<T> {
    pub format: String,
    pub version: u32,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub payload: T,
}

/// Everything the server needs, all from one training run
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub svm: SVMClassifier,
    pub forest: RandomForest,
    pub scaler: StandardScaler,
    pub feature_names: Vec<String>,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ArtifactBundle {
    /// Bundle freshly trained parts under a new run id
    pub fn new(
        svm: SVMClassifier,
        forest: RandomForest,
        scaler: StandardScaler,
        feature_names: Vec<String>,
    ) -> Result<Self> {
        let bundle = Self {
            svm,
            forest,
            scaler,
            feature_names,
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Check that every part expects the same input dimension
    pub fn validate(&self) -> Result<()> {
        let expected = self.feature_names.len();
        let dims = [
            ("scaler", self.scaler.n_features()),
            ("SVM", self.svm.n_features()),
            ("random forest", self.forest.n_features()),
        ];
        for (part, actual) in dims {
            if actual != expected {
                return Err(ScreeningError::ArtifactMismatch(format!(
                    "{} expects {} features but the feature list has {}",
                    part, actual, expected
                )));
            }
        }
        Ok(())
    }

    /// Write the four artifact files into `dir`, replacing older ones
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let paths = vec![
            self.write_one(dir, SVM_FILE, SVM_FORMAT, &self.svm)?,
            self.write_one(dir, FOREST_FILE, FOREST_FORMAT, &self.forest)?,
            self.write_one(dir, SCALER_FILE, SCALER_FORMAT, &self.scaler)?,
            self.write_one(dir, FEATURES_FILE, FEATURES_FORMAT, &self.feature_names)?,
        ];

        info!(dir = %dir.display(), run_id = %self.run_id, "Artifacts saved");
        Ok(paths)
    }

    fn write_one<T: Serialize>(&self, dir: &Path, file: &str, format: &str, payload: &T) -> Result<PathBuf> {
        let path = dir.join(file);
        let envelope = ArtifactEnvelope {
            format: format.to_string(),
            version: ARTIFACT_VERSION,
            run_id: self.run_id,
            created_at: self.created_at,
            payload,
        };
        write_json(BufWriter::new(File::create(&path)?), &envelope)?;
        Ok(path)
    }

    /// Read and cross-check the four artifact files in `dir`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        // Report the first absent file before parsing anything
        for file in [SVM_FILE, FOREST_FILE, SCALER_FILE, FEATURES_FILE] {
            let path = dir.join(file);
            if !path.is_file() {
                return Err(ScreeningError::ArtifactMissing(path));
            }
        }

        let svm: ArtifactEnvelope<SVMClassifier> = read_one(dir, SVM_FILE, SVM_FORMAT)?;
        let forest: ArtifactEnvelope<RandomForest> = read_one(dir, FOREST_FILE, FOREST_FORMAT)?;
        let scaler: ArtifactEnvelope<StandardScaler> = read_one(dir, SCALER_FILE, SCALER_FORMAT)?;
        let features: ArtifactEnvelope<Vec<String>> = read_one(dir, FEATURES_FILE, FEATURES_FORMAT)?;

        let run_id = svm.run_id;
        for (file, other) in [(FOREST_FILE, forest.run_id), (SCALER_FILE, scaler.run_id), (FEATURES_FILE, features.run_id)] {
            if other != run_id {
                return Err(ScreeningError::ArtifactMismatch(format!(
                    "{} comes from training run {} but {} comes from run {}",
                    file, other, SVM_FILE, run_id
                )));
            }
        }

        let bundle = Self {
            svm: svm.payload,
            forest: forest.payload,
            scaler: scaler.payload,
            feature_names: features.payload,
            run_id,
            created_at: svm.created_at,
        };
        bundle.validate()?;
        Ok(bundle)
    }
}

fn read_one<T: DeserializeOwned>(dir: &Path, file: &str, format: &str) -> Result<ArtifactEnvelope<T>> {
    let path = dir.join(file);
    let reader = BufReader::new(File::open(&path)?);
    let envelope: ArtifactEnvelope<T> = serde_json::from_reader(reader).map_err(|e| {
        ScreeningError::SerializationError(format!("{}: {}", path.display(), e))
    })?;

    if envelope.format != format {
        return Err(ScreeningError::ArtifactMismatch(format!(
            "{} holds '{}', expected '{}'",
            path.display(),
            envelope.format,
            format
        )));
    }
    if envelope.version != ARTIFACT_VERSION {
        return Err(ScreeningError::ArtifactMismatch(format!(
            "{} has format version {}, this build reads version {}",
            path.display(),
            envelope.version,
            ARTIFACT_VERSION
        )));
    }

    info!(file = %path.display(), format = %envelope.format, "Artifact loaded");
    Ok(envelope)
}

/// Serialize `value` and flush, so a failed final write is reported
fn write_json<W: Write, T: Serialize>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::SVMConfig;
    use ndarray::{array, Array1, Array2};
    use tempfile::TempDir;

    fn small_bundle() -> ArtifactBundle {
        let x: Array2<f64> = array![
            [0.0, 0.1], [0.2, 0.0], [0.1, 0.3], [0.3, 0.2], [0.2, 0.2],
            [2.0, 2.1], [2.2, 2.0], [2.1, 2.3], [2.3, 2.2], [2.2, 2.2],
        ];
        let y: Array1<f64> = array![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0];

        let mut scaler = StandardScaler::new();
        let xs = scaler.fit_transform(&x).unwrap();
        let mut svm = SVMClassifier::new(SVMConfig { calibration_folds: 0, ..Default::default() });
        svm.fit(&xs, &y).unwrap();
        let mut forest = RandomForest::new(5).with_random_state(42);
        forest.fit(&xs, &y).unwrap();

        ArtifactBundle::new(svm, forest, scaler, vec!["a".to_string(), "b".to_string()]).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let bundle = small_bundle();

        let paths = bundle.save(dir.path()).unwrap();
        assert_eq!(paths.len(), 4);

        let loaded = ArtifactBundle::load(dir.path()).unwrap();
        assert_eq!(loaded.run_id, bundle.run_id);
        assert_eq!(loaded.feature_names, bundle.feature_names);
        assert_eq!(loaded.scaler.means(), bundle.scaler.means());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        small_bundle().save(dir.path()).unwrap();
        fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();

        match ArtifactBundle::load(dir.path()) {
            Err(ScreeningError::ArtifactMissing(path)) => assert!(path.ends_with(SCALER_FILE)),
            other => panic!("expected ArtifactMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_runs_rejected() {
        let dir = TempDir::new().unwrap();
        small_bundle().save(dir.path()).unwrap();

        let other = TempDir::new().unwrap();
        small_bundle().save(other.path()).unwrap();
        fs::copy(other.path().join(FOREST_FILE), dir.path().join(FOREST_FILE)).unwrap();

        assert!(matches!(
            ArtifactBundle::load(dir.path()),
            Err(ScreeningError::ArtifactMismatch(_))
        ));
    }

    #[test]
    fn test_feature_count_mismatch_rejected() {
        let bundle = small_bundle();
        let result = ArtifactBundle::new(
            bundle.svm,
            bundle.forest,
            bundle.scaler,
            vec!["only_one".to_string()],
        );
        assert!(matches!(result, Err(ScreeningError::ArtifactMismatch(_))));
    }

    #[test]
    fn test_wrong_format_tag_rejected() {
        let dir = TempDir::new().unwrap();
        small_bundle().save(dir.path()).unwrap();
        fs::copy(dir.path().join(FOREST_FILE), dir.path().join(SVM_FILE)).unwrap();

        assert!(ArtifactBundle::load(dir.path()).is_err());
    }

    struct FailingFlush(Vec<u8>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left on device"))
        }
    }

    #[test]
    fn test_flush_failure_is_reported() {
        let result = write_json(BufWriter::new(FailingFlush(Vec::new())), &vec!["Glucose", "BMI"]);
        assert!(matches!(result, Err(ScreeningError::IoError(_))));
    }
}
