//! HTTP endpoints.
//!
//! - `/`        : liveness + timestamp
//! - `/health`  : simulated health check (503 when unhealthy)
//! - `/stress`  : pin the simulated CPU gauge high for a while
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::time::Duration;

use pulse_core::metrics::{encode, CONTENT_TYPE};

use crate::app_state::AppState;

pub async fn index() -> impl IntoResponse {
    let timestamp = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
    Json(json!({
        "status": "ok",
        "message": "Demo monitoring application is running",
        "timestamp": timestamp,
    }))
}

pub async fn health(State(state): State<AppState>) -> Response {
    let healthy = state.roll_healthy();
    if let Err(e) = state.metrics().set_healthy(healthy) {
        tracing::warn!(error = %e, "failed to update health gauge");
    }

    if healthy {
        (StatusCode::OK, Json(json!({ "status": "healthy" }))).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unhealthy" }))).into_response()
    }
}

pub async fn stress(State(state): State<AppState>) -> impl IntoResponse {
    let cfg = &state.cfg().stress;
    let pinned = state
        .stress()
        .activate_with(Duration::from_millis(cfg.duration_ms), || {
            state.metrics().set_cpu(cfg.cpu_percent)
        });
    if let Err(e) = pinned {
        tracing::warn!(error = %e, "failed to update cpu gauge");
    }
    tracing::info!(cpu = cfg.cpu_percent, duration_ms = cfg.duration_ms, "cpu stress activated");

    Json(json!({
        "message": format!(
            "CPU stress simulated for {} seconds at {}%",
            cfg.duration_ms / 1000,
            cfg.cpu_percent
        ),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    if let Err(e) = state.refresh_process() {
        tracing::warn!(error = %e, "failed to refresh process metrics");
    }
    let body = encode(&state.registry());

    (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
}
