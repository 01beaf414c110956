//! Request middleware: the per-IP rate limit.
//!
//! The limiter guards HTTP endpoints (including job-start and the WebSocket
//! upgrade request); frames inside an authenticated WebSocket session are
//! never limited. Fail-open: when the limiter substrate errors, the request
//! is admitted; availability trumps strict enforcement.

use crate::error::rate_limited_response;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use tracing::warn;

/// Best client identity we can get: the first `X-Forwarded-For` hop when
/// present (we sit behind a proxy in production), else the socket address.
fn client_key(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Axum middleware applying the fixed-window limit per client IP.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&request);

    match state.limiter.check_and_increment(&key).await {
        Ok(decision) if decision.allowed => next.run(request).await,
        Ok(decision) => rate_limited_response(&decision, state.config.rate_max_requests),
        Err(e) => {
            // Fail open.
            warn!(error = %e, "rate limiter unavailable, admitting request");
            next.run(request).await
        }
    }
}
