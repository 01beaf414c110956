//! Axum-specific error type and mappings from core errors to HTTP
//! responses in the standard envelope.

use crate::envelope::{ApiEnvelope, ResponseMeta};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bookdex_core::error::ErrorCode;
use bookdex_enrich::EnrichError;
use bookdex_jobs::JobError;
use bookdex_ratelimit::RateDecision;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    /// Input validation failure (400).
    #[error("{message}")]
    Validation { code: ErrorCode, message: String },

    /// Capability-token failure (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate-limit denial (429, with headers).
    #[error("Rate limit exceeded")]
    RateLimited { decision: RateDecision, limit: u32 },

    /// Anything else (500).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError {
    #[must_use]
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation { code, message: message.into() }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let meta = ResponseMeta::new(0);
        match self {
            Self::Validation { code, message } => {
                let body: ApiEnvelope<serde_json::Value> =
                    ApiEnvelope::failure(code, message, meta);
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::Unauthorized(message) => {
                let body: ApiEnvelope<serde_json::Value> =
                    ApiEnvelope::failure(ErrorCode::NotFound, message, meta);
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
            Self::NotFound(message) => {
                let body: ApiEnvelope<serde_json::Value> =
                    ApiEnvelope::failure(ErrorCode::NotFound, message, meta);
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            Self::RateLimited { decision, limit } => rate_limited_response(&decision, limit),
            Self::Internal(message) => {
                let body: ApiEnvelope<serde_json::Value> =
                    ApiEnvelope::failure(ErrorCode::InternalError, message, meta);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// 429 with the standard limit headers and structured error body.
pub(crate) fn rate_limited_response(decision: &RateDecision, limit: u32) -> Response {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let retry_after = decision.retry_after_seconds(now_ms);

    let body = ApiEnvelope::<serde_json::Value> {
        data: None,
        metadata: ResponseMeta::new(0),
        error: Some(crate::envelope::ApiError {
            code: ErrorCode::RateLimitExceeded.as_str().to_string(),
            message: "Rate limit exceeded".to_string(),
            details: Some(serde_json::json!({
                "retryAfter": retry_after,
                "requestsLimit": limit,
            })),
        }),
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    let insert = |headers: &mut axum::http::HeaderMap, name: &'static str, value: String| {
        if let Ok(value) = value.parse() {
            headers.insert(name, value);
        }
    };
    insert(headers, "Retry-After", retry_after.to_string());
    insert(headers, "X-RateLimit-Limit", limit.to_string());
    insert(headers, "X-RateLimit-Remaining", decision.remaining.to_string());
    insert(headers, "X-RateLimit-Reset", (decision.reset_at_ms / 1000).to_string());
    response
}

impl From<EnrichError> for HttpError {
    fn from(err: EnrichError) -> Self {
        Self::Validation { code: err.code(), message: err.to_string() }
    }
}

impl From<JobError> for HttpError {
    fn from(err: JobError) -> Self {
        match &err {
            JobError::InvalidToken | JobError::TokenExpired | JobError::NoToken => {
                Self::Unauthorized(err.to_string())
            }
            JobError::RefreshTooEarly
            | JobError::EmptyBatch
            | JobError::InvalidIsbn(_)
            | JobError::FileTooLarge { .. }
            | JobError::PhotoIndexOutOfRange(_)
            | JobError::VersionConflict { .. }
            | JobError::InvalidTransition(_) => Self::Validation {
                code: err.code(),
                message: err.to_string(),
            },
            JobError::Storage(_) | JobError::ActorUnavailable => Self::Internal(err.to_string()),
        }
    }
}
