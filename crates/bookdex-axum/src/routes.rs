//! Route table.
//!
//! The rate limit guards `/api` (including job-start endpoints). The
//! WebSocket path and health check are exempt: frames inside an
//! authenticated session are never limited, and probes must not consume
//! client budget.

use crate::handlers::{enrich, health, jobs, progress_ws};
use crate::middleware::rate_limit;
use crate::state::AppState;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

#[must_use]
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/enrich/isbn/:isbn", get(enrich::enrich_by_isbn))
        .route("/search/title", get(enrich::search_by_title))
        .route("/search/author", get(enrich::search_by_author))
        .route("/search/advanced", get(enrich::search_advanced))
        .route("/works/:title/editions", get(enrich::list_editions))
        .route("/enrich/batch", post(jobs::start_batch))
        .route("/enrich/single", post(jobs::start_single))
        .route("/import/csv", post(jobs::start_csv))
        .route("/scan/bookshelf", post(jobs::start_scan))
        .route("/jobs/:id", get(jobs::job_state))
        .route("/jobs/:id/cancel", post(jobs::cancel_job))
        .route("/jobs/:id/refresh-token", post(jobs::refresh_token))
        .layer(from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .route("/health", get(health::health))
        .route("/ws/progress", get(progress_ws::progress_ws))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
