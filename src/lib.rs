//! dht-hook
//!
//! Relays DHT announces to HTTP subscribers. The [`hook`] module holds the
//! relay core; [`create_router`] exposes subscription and diagnostics over
//! HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod hook;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::api::AppState;

/// Create the application router with the given state
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(api::health::health_check))
        .route("/metrics", get(api::metrics::metrics_handler));

    if state.config.allow_sub {
        router = router.route("/sub", get(api::subscribe::subscribe));
    }

    if state.config.debug {
        router = router
            .route("/debug/hooks", get(api::debug::hooks_status))
            .route("/debug/announce", post(api::debug::announce));
    }

    router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
