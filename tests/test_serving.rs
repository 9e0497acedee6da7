//! Integration test: validating and scoring submitted rows

use diabetes_screening::error::ScreeningError;
use diabetes_screening::export::{ArtifactBundle, SVM_FILE};
use diabetes_screening::inference::{InferenceEngine, PredictError};
use diabetes_screening::preprocessing::Dataset;
use diabetes_screening::training::{TrainEngine, TrainingConfig};
use std::collections::HashMap;
use tempfile::TempDir;

fn trained_bundle() -> ArtifactBundle {
    let n = 60;
    let outcome: Vec<f64> = (0..n).map(|i| if i % 3 == 0 { 1.0 } else { 0.0 }).collect();
    let glucose = (0..n).map(|i| Some(95.0 + ((i * 7) % 25) as f64 + outcome[i] * 55.0)).collect();
    let bmi = (0..n).map(|i| Some(23.0 + ((i * 3) % 8) as f64 + outcome[i] * 9.0)).collect();
    let age = (0..n).map(|i| Some(25.0 + ((i * 11) % 30) as f64)).collect();
    let ds = Dataset::new(
        vec!["Glucose".into(), "BMI".into(), "Age".into(), "Outcome".into()],
        vec![glucose, bmi, age, outcome.into_iter().map(Some).collect()],
    )
    .unwrap();

    let (bundle, _) = TrainEngine::new(TrainingConfig::default().with_n_estimators(25))
        .fit(&ds)
        .unwrap();
    bundle
}

fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_validation_reports_first_failing_field() {
    let engine = InferenceEngine::new(trained_bundle());

    let result = engine.predict_form(&form(&[("Glucose", "120"), ("BMI", ""), ("Age", "abc")]));
    assert_eq!(result, Err(PredictError::MissingField("BMI".to_string())));

    let result = engine.predict_form(&form(&[("Glucose", "120"), ("BMI", "30"), ("Age", "abc")]));
    assert_eq!(result, Err(PredictError::NotNumeric("Age".to_string())));
    assert_eq!(result.unwrap_err().to_string(), "Field 'Age' is not a valid number");
}

#[test]
fn test_extra_form_fields_are_ignored() {
    let engine = InferenceEngine::new(trained_bundle());
    let result = engine.predict_form(&form(&[
        ("Glucose", "120"),
        ("BMI", "30"),
        ("Age", "40"),
        ("comment", "hello"),
    ]));
    assert!(result.is_ok());
}

#[test]
fn test_clear_cases_get_expected_verdicts() {
    let engine = InferenceEngine::new(trained_bundle());

    let high = engine.predict_form(&form(&[("Glucose", "175"), ("BMI", "38"), ("Age", "50")])).unwrap();
    assert!(high.is_positive());
    assert_eq!(high.verdict.label(), "POSITIF DIABETES");

    let low = engine.predict_form(&form(&[("Glucose", "95"), ("BMI", "23"), ("Age", "30")])).unwrap();
    assert!(!low.is_positive());
    assert_eq!(low.verdict.label(), "NEGATIF DIABETES");
    assert_eq!(low.verdict.style(), "success");
}

#[test]
fn test_final_probability_is_average_and_bounded() {
    let engine = InferenceEngine::new(trained_bundle());

    for glucose in ["90", "120", "135", "160", "400"] {
        let p = engine.predict_form(&form(&[("Glucose", glucose), ("BMI", "30"), ("Age", "35")])).unwrap();
        for value in [p.svm_probability, p.forest_probability, p.final_probability] {
            assert!((0.0..=1.0).contains(&value));
        }
        assert_eq!(p.final_probability, (p.svm_probability + p.forest_probability) / 2.0);
        assert_eq!(p.is_positive(), p.final_probability >= 0.5);
    }
}

#[test]
fn test_reloaded_bundle_gives_bit_identical_output() {
    let dir = TempDir::new().unwrap();
    let bundle = trained_bundle();
    bundle.save(dir.path()).unwrap();

    let in_memory = InferenceEngine::new(bundle);
    let reloaded = InferenceEngine::load(dir.path()).unwrap();

    let row = form(&[("Glucose", "142.5"), ("BMI", "31.2"), ("Age", "47")]);
    let a = in_memory.predict_form(&row).unwrap();
    let b = reloaded.predict_form(&row).unwrap();
    assert_eq!(a.final_probability.to_bits(), b.final_probability.to_bits());
    assert_eq!(a.svm_probability.to_bits(), b.svm_probability.to_bits());
    assert_eq!(a.forest_probability.to_bits(), b.forest_probability.to_bits());
}

#[test]
fn test_missing_artifact_is_fatal() {
    let dir = TempDir::new().unwrap();
    trained_bundle().save(dir.path()).unwrap();
    std::fs::remove_file(dir.path().join(SVM_FILE)).unwrap();

    match InferenceEngine::load(dir.path()) {
        Err(ScreeningError::ArtifactMissing(path)) => assert!(path.ends_with(SVM_FILE)),
        other => panic!("expected ArtifactMissing, got {:?}", other.map(|_| ())),
    }
}
