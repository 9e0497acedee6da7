//! Ensemble combination of the screening classifiers

mod voting;

pub use voting::{soft_vote, EnsemblePrediction, Verdict, DECISION_THRESHOLD};
