//! Liveness endpoint.

use crate::envelope::{ApiEnvelope, ResponseMeta};
use axum::Json;
use serde_json::json;

/// `GET /health`
pub async fn health() -> Json<ApiEnvelope<serde_json::Value>> {
    Json(ApiEnvelope::success(
        json!({
            "status": "ok",
            "service": "bookdex",
            "version": env!("CARGO_PKG_VERSION"),
        }),
        ResponseMeta::new(0),
    ))
}
