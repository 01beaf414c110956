//! The JSON response envelope every handler speaks.
//!
//! Success has non-null `data` and no `error`; failure has null `data` and
//! an `error`. There is exactly one envelope shape, with no legacy variants.

use bookdex_core::domain::EnrichOutcome;
use bookdex_core::error::ErrorCode;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Envelope metadata.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub timestamp: DateTime<Utc>,
    /// Wall-clock handling time, milliseconds.
    pub processing_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_seconds: Option<u64>,
}

impl ResponseMeta {
    #[must_use]
    pub fn new(processing_time: u64) -> Self {
        Self {
            timestamp: Utc::now(),
            processing_time,
            provider: None,
            cached: None,
            cache_source: None,
            age_seconds: None,
        }
    }

    /// Metadata for an enrichment outcome: provider (or `"none"`), cache
    /// annotations.
    #[must_use]
    pub fn for_outcome(outcome: &EnrichOutcome, processing_time: u64) -> Self {
        let mut meta = Self::new(processing_time);
        meta.provider = Some(
            outcome
                .provider
                .map_or_else(|| "none".to_string(), |p| p.as_str().to_string()),
        );
        meta.cached = Some(outcome.cached);
        meta.cache_source = outcome.cache_source.map(|s| s.as_str().to_string());
        meta.age_seconds = outcome.age_seconds;
        meta
    }
}

/// Structured error inside the envelope.
#[derive(Clone, Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// The envelope itself.
#[derive(Clone, Debug, Serialize)]
pub struct ApiEnvelope<T: Serialize> {
    pub data: Option<T>,
    pub metadata: ResponseMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiEnvelope<T> {
    #[must_use]
    pub const fn success(data: T, metadata: ResponseMeta) -> Self {
        Self { data: Some(data), metadata, error: None }
    }

    #[must_use]
    pub fn failure(code: ErrorCode, message: impl Into<String>, metadata: ResponseMeta) -> Self {
        Self {
            data: None,
            metadata,
            error: Some(ApiError {
                code: code.as_str().to_string(),
                message: message.into(),
                details: None,
            }),
        }
    }
}
