//! Debug routes
//!
//! Only mounted when `debug` is enabled.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::hook::InfoHash;

/// Registry sizes, as text unless the client accepts JSON.
pub async fn hooks_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let status = state.hook.status().await;
    if accepts_json(&headers) {
        return Json(status).into_response();
    }
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        status.to_string(),
    )
        .into_response()
}

fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains("application/json"))
}

#[derive(Debug, Deserialize)]
pub struct AnnounceQuery {
    pub info_hash: String,
}

/// Feed an announce by hand, as the DHT callback would.
pub async fn announce(
    State(state): State<AppState>,
    Query(query): Query<AnnounceQuery>,
) -> AppResult<StatusCode> {
    let hash = query
        .info_hash
        .parse::<InfoHash>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.hook.record(hash).await?;
    Ok(StatusCode::ACCEPTED)
}
