//! Request tracking middleware.
//!
//! Every request is timed; on completion the latency histogram and the
//! request counter are updated with `(method, route, status_code)`. The
//! route is the matched template when routing succeeded, else `unmatched`
//! so unrouted paths cannot grow the label set without bound.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

use crate::app_state::AppState;

/// Route label for requests no route matched.
pub const UNMATCHED_ROUTE: &str = "unmatched";

pub async fn track_requests(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let route = match req.extensions().get::<MatchedPath>() {
        Some(p) => p.as_str().to_owned(),
        None => UNMATCHED_ROUTE.to_owned(),
    };

    let resp = next.run(req).await;

    let status = resp.status().as_u16();
    if let Err(e) = app.metrics().record_request(&method, &route, status, start.elapsed()) {
        tracing::warn!(error = %e, %method, %route, "failed to record request");
    }
    resp
}
