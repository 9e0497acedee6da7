//! Application state management

use chrono::{DateTime, Utc};
use crate::inference::InferenceEngine;

use super::ServerConfig;

/// Application state shared across handlers. Built once at startup and
/// never mutated, so handlers read it without locks.
#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    pub engine: InferenceEngine,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig, engine: InferenceEngine) -> Self {
        Self {
            config,
            engine,
            started_at: Utc::now(),
        }
    }

    /// Build the state by loading the bundle from the configured directory
    pub fn load(config: ServerConfig) -> crate::error::Result<Self> {
        let engine = InferenceEngine::load(&config.model_dir)?;
        Ok(Self::new(config, engine))
    }

    pub fn feature_names(&self) -> &[String] {
        self.engine.feature_names()
    }
}
