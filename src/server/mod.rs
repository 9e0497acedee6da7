//! Diabetes screening web server
//!
//! Serves the feature form on `GET /` and scores submissions on
//! `POST /predict` with the bundle loaded at startup.

mod api;
mod handlers;
mod page;
mod state;

pub use api::create_router;
pub use page::{render_page, PageOutcome};
pub use state::AppState;

use crate::error::ScreeningError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the trained artifacts
    pub model_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            model_dir: std::env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("model")),
        }
    }
}

/// Load the artifacts and serve until ctrl+c. A missing or inconsistent
/// bundle is returned as an error before anything binds.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    info!(model_dir = %config.model_dir.display(), "Loading model artifacts");
    let state = match AppState::load(config.clone()) {
        Ok(state) => Arc::new(state),
        Err(ScreeningError::ArtifactMissing(path)) => anyhow::bail!(
            "model artifact {} not found; run `diabetes-screening train` first to create the model files",
            path.display()
        ),
        Err(e) => return Err(e.into()),
    };
    info!(features = state.feature_names().len(), "Feature names loaded");

    let app = create_router(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        url = %format!("http://{}", addr),
        pid = std::process::id(),
        "Diabetes screening server listening"
    );

    let started_at = state.started_at;
    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c, shutting down");
        }
        let uptime = chrono::Utc::now().signed_duration_since(started_at);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
