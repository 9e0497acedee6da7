//! Unweighted soft voting over the two classifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final probability at or above which the verdict is positive
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Screening outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Positive,
    Negative,
}

impl Verdict {
    /// Label shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Positive => "POSITIF DIABETES",
            Verdict::Negative => "NEGATIF DIABETES",
        }
    }

    /// Severity style of the result panel
    pub fn style(&self) -> &'static str {
        match self {
            Verdict::Positive => "danger",
            Verdict::Negative => "success",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Verdict::Positive => "⚠️",
            Verdict::Negative => "✅",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of combining both classifiers' class-1 probabilities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsemblePrediction {
    pub svm_probability: f64,
    pub forest_probability: f64,
    pub final_probability: f64,
    pub verdict: Verdict,
}

impl EnsemblePrediction {
    pub fn is_positive(&self) -> bool {
        self.verdict == Verdict::Positive
    }

    /// Final probability as a percentage with two decimals
    pub fn confidence_percent(&self) -> String {
        percent(self.final_probability)
    }

    pub fn svm_percent(&self) -> String {
        percent(self.svm_probability)
    }

    pub fn forest_percent(&self) -> String {
        percent(self.forest_probability)
    }
}

/// Average the two probabilities and threshold at 0.5
pub fn soft_vote(svm_probability: f64, forest_probability: f64) -> EnsemblePrediction {
    let final_probability = (svm_probability + forest_probability) / 2.0;
    let verdict = if final_probability >= DECISION_THRESHOLD {
        Verdict::Positive
    } else {
        Verdict::Negative
    };

    EnsemblePrediction {
        svm_probability,
        forest_probability,
        final_probability,
        verdict,
    }
}

fn percent(p: f64) -> String {
    format!("{:.2}", p * 100.0)
}
