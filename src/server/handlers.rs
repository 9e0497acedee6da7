//! HTTP request handlers

use axum::{
    extract::{rejection::FormRejection, State},
    response::Html,
    Form,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::page::{render_page, PageOutcome};
use super::AppState;
use crate::inference::PredictError;

/// Empty form
pub async fn serve_index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(state.feature_names(), None, &PageOutcome::Blank))
}

/// Score the submitted form and render the verdict, or the first validation
/// error, on the same page. An unreadable body counts as an empty form.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Html<String> {
    let engine = &state.engine;
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            info!(status = %rejection.status(), reason = %rejection.body_text(), "Unreadable form body");
            HashMap::new()
        }
    };

    let page = match engine.parse_form(&form) {
        Err(err) => {
            log_rejection(&err);
            render_page(engine.feature_names(), None, &PageOutcome::Error(err.to_string()))
        }
        Ok(row) => match engine.predict_row(&row) {
            Ok(prediction) => {
                info!(
                    verdict = %prediction.verdict,
                    confidence = %prediction.confidence_percent(),
                    "Prediction served"
                );
                render_page(engine.feature_names(), Some(row.as_slice()), &PageOutcome::Prediction(prediction))
            }
            Err(err) => {
                log_rejection(&err);
                render_page(engine.feature_names(), None, &PageOutcome::Error(err.to_string()))
            }
        },
    };

    Html(page)
}

fn log_rejection(err: &PredictError) {
    match err {
        PredictError::Internal(detail) => warn!(detail = %detail, "Prediction failed"),
        other => info!(reason = %other, "Form rejected"),
    }
}
