//! Subscription endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::duration::parse_duration;
use crate::api::AppState;
use crate::error::{AppError, AppResult};

/// Query parameters of `GET /sub`
#[derive(Debug, Deserialize)]
pub struct SubscribeQuery {
    /// Address the announces are POSTed to
    #[serde(default)]
    pub remote: Option<String>,
    /// Push interval, e.g. `10m` or `1h30m`
    #[serde(default)]
    pub interval: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub remote: String,
    pub interval_secs: i64,
}

/// Subscribe (or re-subscribe) a remote.
pub async fn subscribe(
    State(state): State<AppState>,
    Query(query): Query<SubscribeQuery>,
) -> AppResult<Json<SubscribeResponse>> {
    let remote = query.remote.as_deref().map(str::trim).unwrap_or_default();
    if remote.is_empty() {
        return Err(AppError::bad_request("remote argument is required"));
    }

    let interval = parse_duration(query.interval.as_deref().unwrap_or_default())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.hook.subscribe(remote, interval).await?;

    Ok(Json(SubscribeResponse {
        remote: remote.to_string(),
        interval_secs: interval.num_seconds(),
    }))
}
