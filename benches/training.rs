use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use diabetes_screening::inference::InferenceEngine;
use diabetes_screening::preprocessing::Dataset;
use diabetes_screening::training::{TrainEngine, TrainingConfig};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

const FEATURES: [&str; 4] = ["Glucose", "BMI", "Age", "BloodPressure"];

fn create_screening_data(n_rows: usize) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let outcome: Vec<f64> = (0..n_rows).map(|_| if rng.gen_bool(0.35) { 1.0 } else { 0.0 }).collect();
    let mut columns: Vec<Vec<Option<f64>>> = FEATURES
        .iter()
        .enumerate()
        .map(|(f, _)| {
            outcome
                .iter()
                .map(|&y| Some(rng.gen::<f64>() * 30.0 + y * 20.0 * (f as f64 + 1.0) / 4.0))
                .collect()
        })
        .collect();
    columns.push(outcome.into_iter().map(Some).collect());

    let mut names: Vec<String> = FEATURES.iter().map(|s| s.to_string()).collect();
    names.push("Outcome".to_string());
    Dataset::new(names, columns).unwrap()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10);

    for n_rows in [200, 500, 768].iter() {
        let dataset = create_screening_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &dataset, |b, ds| {
            b.iter(|| {
                let engine = TrainEngine::new(TrainingConfig::default());
                engine.fit(black_box(ds)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    let (bundle, _) = TrainEngine::new(TrainingConfig::default())
        .fit(&create_screening_data(768))
        .unwrap();
    let engine = InferenceEngine::new(bundle);

    let form: HashMap<String, String> = FEATURES
        .iter()
        .zip(["148", "33.6", "50", "72"])
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    group.bench_function("single_row", |b| {
        b.iter(|| engine.predict_form(black_box(&form)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
