//! Artifact persistence
//!
//! Writes and reads the trained bundle as versioned JSON envelopes.

mod bundle;

pub use bundle::{
    ArtifactBundle, ArtifactEnvelope, ARTIFACT_VERSION, FEATURES_FILE, FOREST_FILE,
    SCALER_FILE, SVM_FILE,
};
