//! Axum router wiring.

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, obs::track, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ops::index))
        .route("/health", get(ops::health))
        .route("/stress", get(ops::stress))
        .route("/metrics", get(ops::metrics))
        .layer(middleware::from_fn_with_state(state.clone(), track::track_requests))
        .with_state(state)
}
