use axum::{extract::State, response::IntoResponse};

use crate::api::AppState;
use crate::error::AppError;

/// Prometheus metrics endpoint
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => Ok((
            [("content-type", "text/plain; charset=utf-8")],
            handle.render(),
        )),
        None => Err(AppError::NotFound("metrics recorder not installed".to_string())),
    }
}
