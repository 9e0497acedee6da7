//! Diabetes screening CLI module
//!
//! `train` builds the artifact bundle from a CSV, `serve` starts the form
//! server over it.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::preprocessing::TargetMatch;
use crate::training::{ModelEvaluation, TrainEngine, TrainingConfig, TrainingReport};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    println!("  {} {}...", accent("›"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "diabetes-screening")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Diabetes screening with an SVM + Random Forest soft-voting ensemble")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train both classifiers and write the model artifacts
    Train {
        /// Input CSV file with a header row
        #[arg(short, long, default_value = "dataset/diabetes.csv")]
        data: PathBuf,

        /// Directory receiving the artifacts
        #[arg(short, long, default_value = "model")]
        model_dir: PathBuf,
    },

    /// Start the web form server
    ///
    /// Flags left out fall back to API_HOST, API_PORT and MODEL_DIR, then to
    /// 0.0.0.0:5000 serving `model/`.
    Serve {
        /// Server host
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory holding the artifacts
        #[arg(short, long)]
        model_dir: Option<PathBuf>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(data_path: &Path, model_dir: &Path) -> anyhow::Result<()> {
    section("Train");
    step_run(&format!("Reading {}", data_path.display()));

    let start = Instant::now();
    let engine = TrainEngine::new(TrainingConfig::new(data_path, model_dir));
    let report = engine.run()?;

    print_dataset(&report);
    print_evaluation(&report.svm, &format!("{} support vectors", report.n_support_vectors));
    print_evaluation(&report.forest, &format!("{} trees", engine.config().forest.n_estimators));

    section("Artifacts");
    for path in &report.artifacts {
        step_ok(&path.display().to_string());
    }

    section("Summary");
    kv("Dataset", &format!("{} rows", report.summary.n_rows_read));
    kv("Features", &report.feature_names.len().to_string());
    kv("Target", &report.target);
    kv("SVM accuracy", &format!("{:.2}%", report.svm.report.accuracy * 100.0));
    kv("RF accuracy", &format!("{:.2}%", report.forest.report.accuracy * 100.0));
    kv("Model directory", &model_dir.display().to_string());
    kv("Run id", &report.run_id.to_string());
    kv("Time", &format!("{:.2?}", start.elapsed()));
    println!();
    println!("  {} {}", dim("start the server with"), accent("diabetes-screening serve"));
    println!();

    Ok(())
}

fn print_dataset(report: &TrainingReport) {
    let summary = &report.summary;

    section("Dataset");
    kv("Shape", &format!("{} rows × {} columns", summary.n_rows_read, report.column_names.len()));
    kv("Columns", &report.column_names.join(", "));

    let rule = match report.target_rule {
        TargetMatch::Exact => "values {0, 1}",
        TargetMatch::Superset => "values include 0 and 1, trained on label == 1",
    };
    kv("Target", &format!("{} ({})", report.target, rule));
    for (label, count) in &summary.class_counts {
        kv(&format!("  class {}", label), &count.to_string());
    }
    kv("Missing values", &summary.missing_feature_values.to_string());
    if summary.dropped_target_rows > 0 {
        kv("Dropped rows", &format!("{} without a target value", summary.dropped_target_rows));
    }
    kv("Split", &format!("{} train / {} test", report.n_train, report.n_test));
}

fn print_evaluation(eval: &ModelEvaluation, detail: &str) {
    section(&eval.model_name);
    step_ok(&format!(
        "trained in {:.2}s {}",
        eval.training_time_secs,
        dim(&format!("({})", detail))
    ));
    kv("Accuracy", &format!("{:.2}%", eval.report.accuracy * 100.0));
    println!();
    for line in eval.report.render().lines() {
        println!("  {}", line);
    }
}

pub async fn cmd_serve(host: Option<String>, port: Option<u16>, model_dir: Option<PathBuf>) -> anyhow::Result<()> {
    use crate::server::run_server;

    let config = serve_config(host, port, model_dir);

    section("Diabetes Screening Server");
    kv("Web form", &format!("http://{}:{}", config.host, config.port));
    kv("Model directory", &config.model_dir.display().to_string());
    println!("  {}", dim("ctrl+c to stop"));
    println!();

    run_server(config).await
}

/// Command-line values over the environment-aware defaults
fn serve_config(host: Option<String>, port: Option<u16>, model_dir: Option<PathBuf>) -> crate::server::ServerConfig {
    let defaults = crate::server::ServerConfig::default();
    crate::server::ServerConfig {
        host: host.unwrap_or(defaults.host),
        port: port.unwrap_or(defaults.port),
        model_dir: model_dir.unwrap_or(defaults.model_dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["diabetes-screening", "train"]).unwrap();
        match cli.command {
            Commands::Train { data, model_dir } => {
                assert_eq!(data, PathBuf::from("dataset/diabetes.csv"));
                assert_eq!(model_dir, PathBuf::from("model"));
            }
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_serve_flags_are_optional() {
        let cli = Cli::try_parse_from(["diabetes-screening", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { host, port, model_dir } => {
                assert_eq!(host, None);
                assert_eq!(port, None);
                assert_eq!(model_dir, None);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_serve_config_falls_back_to_environment_defaults() {
        let defaults = crate::server::ServerConfig::default();
        let config = serve_config(None, None, None);
        assert_eq!(config.host, defaults.host);
        assert_eq!(config.port, defaults.port);
        assert_eq!(config.model_dir, defaults.model_dir);
    }

    #[test]
    fn test_serve_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "diabetes-screening", "serve", "--host", "127.0.0.1", "--port", "8081", "--model-dir", "artifacts",
        ])
        .unwrap();
        let Commands::Serve { host, port, model_dir } = cli.command else {
            panic!("expected serve");
        };
        let config = serve_config(host, port, model_dir);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8081);
        assert_eq!(config.model_dir, PathBuf::from("artifacts"));
    }

    #[test]
    fn test_command_required() {
        assert!(Cli::try_parse_from(["diabetes-screening"]).is_err());
    }
}
