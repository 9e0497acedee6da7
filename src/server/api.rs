//! Router assembly

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Build the form page routes over the shared state
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::serve_index))
        .route("/predict", post(handlers::predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
